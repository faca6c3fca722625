use std::error::Error;

use config::Config;
use db::{get_db_pool, init_schema};
use handlers::{callback_handler, command_handler, message_handler, Command};
use state::AppState;
use teloxide::{dispatching::UpdateFilterExt, prelude::*};

mod accounts;
mod booking;
mod config;
mod db;
mod directory;
mod error;
mod handlers;
mod models;
mod state;
mod validation;

extern crate pretty_env_logger;
#[macro_use] extern crate log;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    pretty_env_logger::init();
    let config = Config::from_env()?;
    let pool = get_db_pool(&config).await?;
    init_schema(&pool).await?;

    let state = AppState::new(pool, &config);
    let bot = Bot::from_env();
    info!("Starting photomarket bot");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}
