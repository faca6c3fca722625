use std::collections::HashMap;

use log::error;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

use super::{format, keyboards, require_principal, HandlerResult, MSG_TRY_LATER};
use crate::directory::SpecialistFilter;
use crate::models::{BookingRequest, Principal, Side};
use crate::state::{AppState, UserStep};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать помощь")]
    Help,
    #[command(description = "найти фотографа: /specialists wedding city=Москва price_max=5000")]
    Specialists(String),
    #[command(description = "мои заявки")]
    Bookings,
    #[command(description = "избранные фотографы")]
    Favorites,
    #[command(description = "мой профиль")]
    Profile,
    #[command(description = "прервать текущее действие")]
    Cancel,
}

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: AppState,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    match cmd {
        Command::Start => handle_start(&bot, &state, chat_id).await?,
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string()).await?;
        }
        Command::Specialists(args) => handle_specialists(&bot, &state, chat_id, &args).await?,
        Command::Bookings => {
            if let Some(principal) = require_principal(&bot, &state, chat_id, chat_id.0).await? {
                handle_bookings(&bot, &state, chat_id, &principal).await?;
            }
        }
        Command::Favorites => {
            if let Some(principal) = require_principal(&bot, &state, chat_id, chat_id.0).await? {
                handle_favorites(&bot, &state, chat_id, &principal).await?;
            }
        }
        Command::Profile => {
            if let Some(principal) = require_principal(&bot, &state, chat_id, chat_id.0).await? {
                handle_profile(&bot, &state, chat_id, &principal).await?;
            }
        }
        Command::Cancel => {
            state.set_step(chat_id.0, UserStep::Idle).await;
            bot.send_message(chat_id, "Действие отменено")
                .reply_markup(keyboards::remove_keyboard())
                .await?;
        }
    }
    Ok(())
}

async fn handle_start(bot: &Bot, state: &AppState, chat_id: ChatId) -> HandlerResult {
    state.set_step(chat_id.0, UserStep::Idle).await;
    match state.accounts.resolve(chat_id.0).await {
        Ok(Some(principal)) => {
            let text = if principal.is_photographer() {
                format!("С возвращением, {}! Ваши заявки: /bookings", principal.name)
            } else {
                format!("С возвращением, {}! Найти фотографа: /specialists", principal.name)
            };
            bot.send_message(chat_id, text).await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, "Привет! Я помогу найти фотографа или клиентов. Кто вы?")
                .reply_markup(keyboards::role_keyboard())
                .await?;
        }
        Err(e) => {
            error!("Failed to resolve telegram user {}: {}", chat_id.0, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}

async fn handle_specialists(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    args: &str,
) -> HandlerResult {
    let filter = SpecialistFilter::parse(args);
    // Каталог доступен и без регистрации, отметки избранного - только своим.
    let viewer = match state.accounts.resolve(chat_id.0).await {
        Ok(principal) => principal.map(|p| p.user_id),
        Err(e) => {
            error!("Failed to resolve telegram user {}: {}", chat_id.0, e);
            None
        }
    };

    match state.directory.search(&filter, viewer).await {
        Ok(cards) => {
            bot.send_message(chat_id, format::specialists_list(&cards))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::specialists_keyboard(&cards))
                .await?;
        }
        Err(e) => {
            error!("Specialist search failed: {}", e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}

/// Заголовок раздела и по сообщению с кнопками на каждую заявку,
/// чтобы длинный кабинет не упирался в предел длины сообщения.
async fn send_section(
    bot: &Bot,
    chat_id: ChatId,
    title: &str,
    bookings: &[BookingRequest],
    side: Side,
    names: &HashMap<i32, String>,
) -> HandlerResult {
    bot.send_message(chat_id, format::section_header(title, bookings.len()))
        .parse_mode(ParseMode::Html)
        .await?;

    for booking in bookings {
        let (label, counterpart_id) = match side {
            Side::Client => ("Фотограф", booking.photographer_id),
            Side::Photographer => ("Клиент", booking.client_id),
        };
        let name = names.get(&counterpart_id).map(String::as_str).unwrap_or("—");
        bot.send_message(chat_id, format::booking_block(booking, (label, name)))
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::booking_keyboard(booking, side))
            .await?;
    }
    Ok(())
}

async fn handle_bookings(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
) -> HandlerResult {
    let dashboard = match state.bookings.dashboard(principal).await {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("Failed to load bookings for user {}: {}", principal.user_id, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
            return Ok(());
        }
    };

    let photographer_ids: Vec<i32> = dashboard
        .sent_active
        .iter()
        .chain(&dashboard.sent_completed)
        .map(|b| b.photographer_id)
        .collect();
    let client_ids: Vec<i32> = dashboard
        .received_active
        .iter()
        .chain(&dashboard.received_completed)
        .map(|b| b.client_id)
        .collect();

    let photographer_names = state
        .directory
        .photographer_names(&photographer_ids)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to load photographer names: {}", e);
            HashMap::new()
        });
    let client_names = state.accounts.user_names(&client_ids).await.unwrap_or_else(|e| {
        error!("Failed to load client names: {}", e);
        HashMap::new()
    });

    if principal.is_photographer() {
        let received = [
            ("📥 Активные заявки", &dashboard.received_active),
            ("✅ Выполненные заявки", &dashboard.received_completed),
        ];
        for (title, bookings) in received {
            send_section(bot, chat_id, title, bookings, Side::Photographer, &client_names).await?;
        }
        if dashboard.sent_active.is_empty() && dashboard.sent_completed.is_empty() {
            return Ok(());
        }
    }

    let sent = &dashboard.sent_active;
    send_section(bot, chat_id, "📤 Отправленные заявки", sent, Side::Client, &photographer_names)
        .await?;
    if !dashboard.sent_completed.is_empty() {
        let completed = &dashboard.sent_completed;
        send_section(bot, chat_id, "✅ Выполненные", completed, Side::Client, &photographer_names)
            .await?;
    }
    Ok(())
}

async fn handle_favorites(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
) -> HandlerResult {
    match state.directory.favorites(principal.user_id).await {
        Ok(cards) if cards.is_empty() => {
            bot.send_message(
                chat_id,
                "В избранном пока никого нет. Найдите фотографа: /specialists",
            )
            .await?;
        }
        Ok(cards) => {
            bot.send_message(chat_id, format::specialists_list(&cards))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::specialists_keyboard(&cards))
                .await?;
        }
        Err(e) => {
            error!("Failed to load favorites for user {}: {}", principal.user_id, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}

async fn handle_profile(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
) -> HandlerResult {
    let text = match principal.photographer_id {
        // Просмотр собственного профиля не считается в счётчике.
        Some(photographer_id) => state
            .directory
            .card(photographer_id, Some(principal.user_id))
            .await
            .map(|card| card.map(|card| format::photographer_detail(&card))),
        None => state
            .accounts
            .client_profile(principal.user_id)
            .await
            .map(|profile| Some(format::client_profile(principal, &profile))),
    };

    match text {
        Ok(Some(text)) => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::profile_keyboard(principal))
                .await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, "Профиль не найден").await?;
        }
        Err(e) => {
            error!("Failed to load profile of user {}: {}", principal.user_id, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}
