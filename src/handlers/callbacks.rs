use std::str::FromStr;

use log::{error, warn};
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::{format, keyboards, notify, require_principal, HandlerResult, MSG_TRY_LATER};
use crate::accounts::{ProfileField, Role, TelegramUser};
use crate::booking::{BookingAction, Outcome};
use crate::models::{BookingStatus, Principal};
use crate::state::{AppState, UserStep};

/// Данные inline-кнопок.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Register(Role),
    Detail(i32),
    Favorite(i32),
    Book(i32),
    Status { booking_id: i32, status: BookingStatus },
    Cancel(i32),
    Edit(ProfileField),
}

impl CallbackAction {
    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::Register(Role::Client) => "role:client".to_string(),
            CallbackAction::Register(Role::Photographer) => "role:photographer".to_string(),
            CallbackAction::Detail(id) => format!("detail:{id}"),
            CallbackAction::Favorite(id) => format!("fav:{id}"),
            CallbackAction::Book(id) => format!("book:{id}"),
            CallbackAction::Status { booking_id, status } => {
                format!("status:{booking_id}:{status}")
            }
            CallbackAction::Cancel(id) => format!("cancel:{id}"),
            CallbackAction::Edit(field) => format!("edit:{}", field.as_str()),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = ();

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut parts = data.split(':');
        let kind = parts.next().ok_or(())?;
        let arg = parts.next().ok_or(())?;
        let id = || arg.parse::<i32>().map_err(|_| ());

        let action = match kind {
            "role" => match arg {
                "client" => CallbackAction::Register(Role::Client),
                "photographer" => CallbackAction::Register(Role::Photographer),
                _ => return Err(()),
            },
            "detail" => CallbackAction::Detail(id()?),
            "fav" => CallbackAction::Favorite(id()?),
            "book" => CallbackAction::Book(id()?),
            "cancel" => CallbackAction::Cancel(id()?),
            "edit" => CallbackAction::Edit(arg.parse().map_err(|_| ())?),
            "status" => {
                let status = parts.next().ok_or(())?.parse().map_err(|_| ())?;
                CallbackAction::Status { booking_id: id()?, status }
            }
            _ => return Err(()),
        };
        if parts.next().is_some() {
            return Err(());
        }
        Ok(action)
    }
}

pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: AppState) -> HandlerResult {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat().id)
        .unwrap_or_else(|| ChatId::from(q.from.id));
    let telegram_id = q.from.id.0 as i64;

    let Ok(action) = data.parse::<CallbackAction>() else {
        warn!("Unknown callback data: {}", data);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    if let CallbackAction::Register(role) = action {
        bot.answer_callback_query(q.id.clone()).await?;
        return register(&bot, &state, chat_id, &q, role).await;
    }

    let Some(principal) = require_principal(&bot, &state, chat_id, telegram_id).await? else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    match action {
        CallbackAction::Register(_) => {}
        CallbackAction::Detail(photographer_id) => {
            bot.answer_callback_query(q.id.clone()).await?;
            show_detail(&bot, &state, chat_id, &principal, photographer_id).await?;
        }
        CallbackAction::Favorite(photographer_id) => {
            let toggled = state
                .directory
                .toggle_favorite(principal.user_id, photographer_id)
                .await;
            let text = match toggled {
                Ok(Some(true)) => "❤️ Добавлено в избранное",
                Ok(Some(false)) => "Удалено из избранного",
                Ok(None) => "Фотограф не найден",
                Err(e) => {
                    error!(
                        "Failed to toggle favorite {} for user {}: {}",
                        photographer_id, principal.user_id, e
                    );
                    MSG_TRY_LATER
                }
            };
            bot.answer_callback_query(q.id.clone()).text(text).await?;
        }
        CallbackAction::Book(photographer_id) => {
            bot.answer_callback_query(q.id.clone()).await?;
            if principal.photographer_id == Some(photographer_id) {
                bot.send_message(chat_id, "Нельзя оставить заявку самому себе").await?;
                return Ok(());
            }
            state.set_step(chat_id.0, UserStep::BookingMessage { photographer_id }).await;
            bot.send_message(chat_id, "Опишите ваше событие (дата, место, пожелания):")
                .await?;
        }
        CallbackAction::Status { booking_id, status } => {
            let action = BookingAction::UpdateStatus(status);
            booking_action(&bot, &state, &q, &principal, booking_id, action).await?;
        }
        CallbackAction::Cancel(booking_id) => {
            let action = BookingAction::CancelOrDelete;
            booking_action(&bot, &state, &q, &principal, booking_id, action).await?;
        }
        CallbackAction::Edit(field) => {
            bot.answer_callback_query(q.id.clone()).await?;
            if !field.allowed_for(&principal) {
                bot.send_message(chat_id, "Это поле нельзя изменить в вашем профиле").await?;
                return Ok(());
            }
            state.set_step(chat_id.0, UserStep::EditingProfile(field)).await;
            bot.send_message(chat_id, format::edit_prompt(field)).await?;
        }
    }

    Ok(())
}

async fn register(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    q: &CallbackQuery,
    role: Role,
) -> HandlerResult {
    let user = TelegramUser {
        telegram_id: q.from.id.0 as i64,
        name: q.from.full_name(),
        username: q.from.username.clone(),
    };
    match state.accounts.register(&user, role).await {
        Ok(principal) => {
            let text = if principal.is_photographer() {
                "📸 Вы зарегистрированы как фотограф. Заполните профиль: /profile"
            } else {
                "Вы зарегистрированы! Найдите фотографа: /specialists"
            };
            bot.send_message(chat_id, text).await?;
        }
        Err(e) => {
            error!("Failed to register telegram user {}: {}", user.telegram_id, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}

async fn show_detail(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
    photographer_id: i32,
) -> HandlerResult {
    match state.directory.detail(photographer_id, Some(principal.user_id)).await {
        Ok(Some(card)) => {
            bot.send_message(chat_id, format::photographer_detail(&card))
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboards::detail_keyboard(&card))
                .await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, "Фотограф не найден").await?;
        }
        Err(e) => {
            error!("Failed to load photographer {}: {}", photographer_id, e);
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}

async fn booking_action(
    bot: &Bot,
    state: &AppState,
    q: &CallbackQuery,
    principal: &Principal,
    booking_id: i32,
    action: BookingAction,
) -> HandlerResult {
    let report = match state.bookings.submit_action(booking_id, principal, action).await {
        Ok(report) => report,
        Err(e) => {
            error!("Booking action {:?} on {} failed: {}", action, booking_id, e);
            bot.answer_callback_query(q.id.clone()).text(MSG_TRY_LATER).await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(q.id.clone())
        .text(report.user_message.as_str())
        .await?;

    if report.outcome != Outcome::Success {
        return Ok(());
    }
    // Клиенту сообщаем только об изменениях, которые он продолжает видеть.
    if let Some(booking) = report.changed {
        let client = match state.accounts.telegram_id_of_user(booking.client_id).await {
            Ok(telegram_id) => telegram_id,
            Err(e) => {
                error!("Failed to find client {} for notification: {}", booking.client_id, e);
                None
            }
        };
        let text = match action {
            BookingAction::CancelOrDelete => format::client_cancel_notice(&booking),
            BookingAction::UpdateStatus(_) => format::client_status_notice(&booking),
        };
        notify(bot, client, text).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_data_parses_back_into_actions() {
        let actions = [
            CallbackAction::Register(Role::Photographer),
            CallbackAction::Detail(7),
            CallbackAction::Favorite(7),
            CallbackAction::Book(7),
            CallbackAction::Status { booking_id: 12, status: BookingStatus::InProgress },
            CallbackAction::Cancel(12),
            CallbackAction::Edit(ProfileField::ShortIntro),
        ];
        for action in actions {
            assert_eq!(action.to_data().parse::<CallbackAction>(), Ok(action));
        }
    }

    #[test]
    fn malformed_callback_data_is_rejected() {
        for data in [
            "",
            "ignore",
            "cancel:",
            "cancel:abc",
            "cancel:1:2",
            "status:1",
            "status:1:confirmed",
            "role:admin",
            "edit:password",
        ] {
            assert!(data.parse::<CallbackAction>().is_err(), "{data}");
        }
    }

    #[test]
    fn callback_data_fits_telegram_limit() {
        let data = CallbackAction::Status {
            booking_id: i32::MAX,
            status: BookingStatus::InProgress,
        }
        .to_data();
        assert!(data.len() <= 64);
    }
}
