use log::{error, info};
use teloxide::prelude::*;

use super::{format, keyboards, notify, require_principal, HandlerResult, MSG_TRY_LATER};
use crate::accounts::ProfileField;
use crate::error::{BookingError, ValidationError};
use crate::models::Principal;
use crate::state::{AppState, UserStep};
use crate::validation;

pub async fn message_handler(bot: Bot, msg: Message, state: AppState) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    match state.step(chat_id.0).await {
        UserStep::Idle => {
            bot.send_message(chat_id, "Не понимаю. Список команд: /help").await?;
        }
        UserStep::BookingMessage { photographer_id } => {
            let Some(principal) = require_principal(&bot, &state, chat_id, chat_id.0).await? else {
                state.set_step(chat_id.0, UserStep::Idle).await;
                return Ok(());
            };
            booking_message(&bot, &state, chat_id, &principal, photographer_id, text).await?;
        }
        UserStep::BookingPhone { photographer_id, message } => {
            let Some(principal) = require_principal(&bot, &state, chat_id, chat_id.0).await? else {
                state.set_step(chat_id.0, UserStep::Idle).await;
                return Ok(());
            };
            booking_phone(&bot, &state, chat_id, &principal, photographer_id, &message, text)
                .await?;
        }
        UserStep::EditingProfile(field) => {
            let Some(principal) = require_principal(&bot, &state, chat_id, chat_id.0).await? else {
                state.set_step(chat_id.0, UserStep::Idle).await;
                return Ok(());
            };
            edit_profile(&bot, &state, chat_id, &principal, field, text).await?;
        }
    }
    Ok(())
}

async fn booking_message(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
    photographer_id: i32,
    text: &str,
) -> HandlerResult {
    let message = match validation::booking_message(text) {
        Ok(message) => message,
        Err(e) => {
            bot.send_message(chat_id, format!("Ошибка: {e}. Опишите событие ещё раз:")).await?;
            return Ok(());
        }
    };

    // Подсказываем номер из профиля клиента, если он уже сохранён.
    let saved_phone = match state.accounts.client_profile(principal.user_id).await {
        Ok(profile) => profile.phone_number,
        Err(e) => {
            error!("Failed to load client profile of user {}: {}", principal.user_id, e);
            None
        }
    };

    state
        .set_step(chat_id.0, UserStep::BookingPhone { photographer_id, message })
        .await;
    bot.send_message(chat_id, "Укажите контактный телефон в формате + 7 999 999 99 99:")
        .reply_markup(keyboards::phone_keyboard(saved_phone.as_deref()))
        .await?;
    Ok(())
}

async fn booking_phone(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
    photographer_id: i32,
    message: &str,
    text: &str,
) -> HandlerResult {
    let created = state
        .bookings
        .create_request(principal, photographer_id, message, text)
        .await;
    let booking = match created {
        Ok(booking) => booking,
        Err(BookingError::Invalid(ValidationError::SelfBooking)) => {
            state.set_step(chat_id.0, UserStep::Idle).await;
            bot.send_message(chat_id, "Нельзя оставить заявку самому себе")
                .reply_markup(keyboards::remove_keyboard())
                .await?;
            return Ok(());
        }
        Err(BookingError::Invalid(e)) => {
            bot.send_message(chat_id, format!("Ошибка: {e}")).await?;
            return Ok(());
        }
        Err(BookingError::PhotographerNotFound(id)) => {
            info!("User {} tried to book missing photographer {}", principal.user_id, id);
            state.set_step(chat_id.0, UserStep::Idle).await;
            bot.send_message(chat_id, "Фотограф не найден")
                .reply_markup(keyboards::remove_keyboard())
                .await?;
            return Ok(());
        }
        Err(e) => {
            error!("Failed to create booking for user {}: {}", principal.user_id, e);
            state.set_step(chat_id.0, UserStep::Idle).await;
            bot.send_message(chat_id, MSG_TRY_LATER)
                .reply_markup(keyboards::remove_keyboard())
                .await?;
            return Ok(());
        }
    };

    state.set_step(chat_id.0, UserStep::Idle).await;
    bot.send_message(chat_id, "Ваша заявка успешно отправлена!")
        .reply_markup(keyboards::remove_keyboard())
        .await?;

    let photographer = match state.accounts.telegram_id_of_photographer(photographer_id).await {
        Ok(telegram_id) => telegram_id,
        Err(e) => {
            error!("Failed to find photographer {} for notification: {}", photographer_id, e);
            None
        }
    };
    notify(bot, photographer, format::new_booking_notice(&booking, &principal.name)).await;
    Ok(())
}

async fn edit_profile(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    principal: &Principal,
    field: ProfileField,
    text: &str,
) -> HandlerResult {
    if !field.allowed_for(principal) {
        state.set_step(chat_id.0, UserStep::Idle).await;
        bot.send_message(chat_id, "Это поле нельзя изменить в вашем профиле").await?;
        return Ok(());
    }
    let value = match field.parse_value(text) {
        Ok(value) => value,
        Err(e) => {
            bot.send_message(chat_id, format!("Ошибка: {e}. {}", format::edit_prompt(field)))
                .await?;
            return Ok(());
        }
    };

    state.set_step(chat_id.0, UserStep::Idle).await;
    match state.accounts.update_profile(principal, field, value).await {
        Ok(()) => {
            bot.send_message(chat_id, "Профиль обновлен. Посмотреть: /profile").await?;
        }
        Err(e) => {
            error!(
                "Failed to update field {} for user {}: {}",
                field.as_str(),
                principal.user_id,
                e
            );
            bot.send_message(chat_id, MSG_TRY_LATER).await?;
        }
    }
    Ok(())
}
