use log::warn;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};
use url::Url;

use super::callbacks::CallbackAction;
use crate::accounts::{ProfileField, Role};
use crate::models::{BookingRequest, BookingStatus, PhotographerCard, Principal, Side};

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_data())
}

fn favorite_button(card: &PhotographerCard) -> InlineKeyboardButton {
    let text = if card.is_favorite { "💔 Убрать из избранного" } else { "🤍 В избранное" };
    button(text, CallbackAction::Favorite(card.profile.id))
}

/// Кнопка «Связаться» через t.me, если у пользователя есть username.
fn contact_button(username: Option<&str>) -> Option<InlineKeyboardButton> {
    let username = username.filter(|name| !name.is_empty())?;
    match Url::parse(&format!("https://t.me/{username}")) {
        Ok(url) => Some(InlineKeyboardButton::url("📞 Связаться", url)),
        Err(e) => {
            warn!("Error parsing URL for username {}: {}", username, e);
            None
        }
    }
}

pub fn role_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("Я клиент", CallbackAction::Register(Role::Client))],
        vec![button("📸 Я фотограф", CallbackAction::Register(Role::Photographer))],
    ])
}

pub fn specialists_keyboard(cards: &[PhotographerCard]) -> InlineKeyboardMarkup {
    let rows = cards
        .iter()
        .map(|card| {
            let heart = if card.is_favorite { "❤️" } else { "🤍" };
            vec![
                button(format!("👤 {}", card.profile.name), CallbackAction::Detail(card.profile.id)),
                button(heart, CallbackAction::Favorite(card.profile.id)),
            ]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub fn detail_keyboard(card: &PhotographerCard) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![button("📝 Оставить заявку", CallbackAction::Book(card.profile.id))],
        vec![favorite_button(card)],
    ];
    if let Some(contact) = contact_button(card.profile.username.as_deref()) {
        rows.push(vec![contact]);
    }
    InlineKeyboardMarkup::new(rows)
}

/// Кнопки управления одной заявкой с точки зрения стороны `side`.
pub fn booking_keyboard(booking: &BookingRequest, side: Side) -> InlineKeyboardMarkup {
    let id = booking.id;
    let mut row = Vec::new();

    if booking.status.is_closed() {
        row.push(button("🗑 Убрать из списка", CallbackAction::Cancel(id)));
    } else {
        if side == Side::Photographer {
            let next = match booking.status {
                BookingStatus::New => Some(("⏳ В работу", BookingStatus::InProgress)),
                BookingStatus::InProgress => Some(("✅ Выполнено", BookingStatus::Completed)),
                _ => None,
            };
            if let Some((text, status)) = next {
                row.push(button(text, CallbackAction::Status { booking_id: id, status }));
            }
        }
        row.push(button("❌ Отменить", CallbackAction::Cancel(id)));
    }
    InlineKeyboardMarkup::new(vec![row])
}

pub fn profile_keyboard(principal: &Principal) -> InlineKeyboardMarkup {
    let rows = ProfileField::fields_for(principal)
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|field| button(format!("✏️ {}", field.label()), CallbackAction::Edit(*field)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Подставляет сохранённый номер телефона одной кнопкой.
pub fn phone_keyboard(saved: Option<&str>) -> ReplyMarkup {
    match saved.filter(|phone| !phone.is_empty()) {
        Some(phone) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(vec![vec![KeyboardButton::new(phone)]])
                .resize_keyboard()
                .one_time_keyboard(),
        ),
        None => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

pub fn remove_keyboard() -> ReplyMarkup {
    ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;
    use time::OffsetDateTime;

    fn booking(id: i32, status: BookingStatus) -> BookingRequest {
        BookingRequest {
            id,
            client_id: 1,
            photographer_id: 2,
            status,
            message: "m".to_string(),
            contact_phone: "+ 7 999 123 45 67".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            deleted_by_client: false,
            deleted_by_photographer: false,
        }
    }

    fn callbacks(markup: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|b| match &b.kind {
                        InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn photographer_gets_next_status_and_cancel() {
        assert_eq!(
            callbacks(&booking_keyboard(&booking(5, BookingStatus::New), Side::Photographer)),
            vec![vec!["status:5:in_progress".to_string(), "cancel:5".to_string()]]
        );
        let in_progress = booking(6, BookingStatus::InProgress);
        assert_eq!(
            callbacks(&booking_keyboard(&in_progress, Side::Photographer)),
            vec![vec!["status:6:completed".to_string(), "cancel:6".to_string()]]
        );
    }

    #[test]
    fn client_can_only_cancel_or_remove() {
        for (id, status) in [(5, BookingStatus::InProgress), (6, BookingStatus::Completed)] {
            assert_eq!(
                callbacks(&booking_keyboard(&booking(id, status), Side::Client)),
                vec![vec![format!("cancel:{id}")]]
            );
        }
    }

    #[test]
    fn contact_button_needs_username() {
        assert!(contact_button(None).is_none());
        assert!(contact_button(Some("")).is_none());
        assert!(contact_button(Some("olga_photo")).is_some());
    }

    #[test]
    fn saved_phone_is_offered_as_button() {
        assert!(matches!(phone_keyboard(Some("+ 7 999 123 45 67")), ReplyMarkup::Keyboard(_)));
        assert!(matches!(phone_keyboard(None), ReplyMarkup::KeyboardRemove(_)));
    }
}
