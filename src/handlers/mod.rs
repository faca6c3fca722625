pub mod callbacks;
pub mod commands;
pub mod format;
pub mod keyboards;
pub mod messages;

pub use callbacks::callback_handler;
pub use commands::{command_handler, Command};
pub use messages::message_handler;

use std::error::Error;

use log::{error, warn};
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::models::Principal;
use crate::state::AppState;

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub const MSG_NOT_REGISTERED: &str = "Сначала зарегистрируйтесь: отправьте /start";
pub const MSG_TRY_LATER: &str = "Что-то пошло не так. Попробуйте позже.";

/// Текущий пользователь или подсказка зарегистрироваться.
async fn require_principal(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    telegram_id: i64,
) -> Result<Option<Principal>, Box<dyn Error + Send + Sync>> {
    match state.accounts.resolve(telegram_id).await {
        Ok(Some(principal)) => Ok(Some(principal)),
        Ok(None) => {
            bot.send_message(chat_id, MSG_NOT_REGISTERED).await?;
            Ok(None)
        }
        Err(e) => {
            error!("Failed to resolve telegram user {}: {}", telegram_id, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
            Ok(None)
        }
    }
}

/// Уведомление второй стороне. Ошибка доставки не должна ломать действие.
async fn notify(bot: &Bot, telegram_id: Option<i64>, text: String) {
    let Some(telegram_id) = telegram_id else {
        warn!("Notification skipped: recipient has no telegram id");
        return;
    };
    if let Err(e) = bot
        .send_message(ChatId(telegram_id), text)
        .parse_mode(ParseMode::Html)
        .await
    {
        error!("Failed to send notification to {}: {}", telegram_id, e);
    }
}
