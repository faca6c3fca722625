use teloxide::utils::html::escape;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::accounts::ProfileField;
use crate::models::{
    BookingRequest, ClientProfile, Language, PhotographerCard, Principal, Specialization,
};

/// Предел длины текста сообщения Telegram.
pub const MESSAGE_LIMIT: usize = 4096;

fn format_datetime(value: OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] [hour]:[minute]");
    value.format(&format).unwrap_or_default()
}

fn format_price(price: i32) -> String {
    if price == 0 {
        "по договорённости".to_string()
    } else {
        format!("{price} ₽/час")
    }
}

/// Блок одной заявки. `counterpart` - подпись и имя второй стороны.
pub fn booking_block(booking: &BookingRequest, counterpart: (&str, &str)) -> String {
    format!(
        "<b>Заявка №{}</b>\n<b>{}:</b> {}\n<b>Статус:</b> {}\n\
         <b>Телефон:</b> {}\n<b>Создана:</b> {}\n{}\n",
        booking.id,
        counterpart.0,
        escape(counterpart.1),
        booking.status.label(),
        escape(&booking.contact_phone),
        format_datetime(booking.created_at),
        escape(&booking.message),
    )
}

/// Заголовок раздела кабинета. Сами заявки уходят отдельными сообщениями.
pub fn section_header(title: &str, count: usize) -> String {
    if count == 0 {
        format!("<b>{}</b>\n\nЗаявок нет", escape(title))
    } else {
        format!("<b>{}</b> ({count})", escape(title))
    }
}

/// Список карточек. Не влезающие в одно сообщение карточки остаются только на кнопках.
pub fn specialists_list(cards: &[PhotographerCard]) -> String {
    if cards.is_empty() {
        return "По вашему запросу фотографов не найдено".to_string();
    }
    let mut text = String::from("📸 <b>Фотографы</b>\n\n");
    for (shown, card) in cards.iter().enumerate() {
        let entry = specialist_entry(card);
        // запас под строку «…и ещё N»
        if text.chars().count() + entry.chars().count() > MESSAGE_LIMIT - 64 {
            text.push_str(&format!("…и ещё {}, см. кнопки ниже", cards.len() - shown));
            break;
        }
        text.push_str(&entry);
    }
    text
}

fn specialist_entry(card: &PhotographerCard) -> String {
    let p = &card.profile;
    let mut entry = format!(
        "{}<b>{}</b> · {} · {}\n{}\n",
        if card.is_favorite { "❤️ " } else { "" },
        escape(&p.name),
        p.specialization.label(),
        format_price(p.price),
        escape(&p.short_intro),
    );
    if let Some(city) = &p.city {
        entry.push_str(&format!("📍 {}\n", escape(city)));
    }
    entry.push('\n');
    entry
}

pub fn photographer_detail(card: &PhotographerCard) -> String {
    let p = &card.profile;
    format!(
        "📸 <b>{}</b>\n<i>{}</i>\n\n{}\n\n<b>Специализация:</b> {}\n<b>Город:</b> {}\n\
         <b>Язык:</b> {}\n<b>Стоимость:</b> {}\n<b>Просмотров:</b> {}",
        escape(&p.name),
        escape(&p.short_intro),
        escape(&p.bio),
        p.specialization.label(),
        p.city.as_deref().map(escape).unwrap_or_else(|| "не указан".to_string()),
        p.language.label(),
        format_price(p.price),
        p.views_count,
    )
}

pub fn client_profile(principal: &Principal, profile: &ClientProfile) -> String {
    format!(
        "👤 <b>Профиль</b>\n\n<b>Имя:</b> {}\n<b>Телефон:</b> {}",
        escape(&principal.name),
        profile.phone_number.as_deref().map(escape).unwrap_or_else(|| "не указан".to_string()),
    )
}

pub fn edit_prompt(field: ProfileField) -> String {
    let hint = match field {
        ProfileField::Specialization => format!(
            " Варианты: {}.",
            Specialization::ALL.iter().map(|s| s.label()).collect::<Vec<_>>().join(", ")
        ),
        ProfileField::Language => {
            format!(" Варианты: {}, {}.", Language::Ru.label(), Language::En.label())
        }
        ProfileField::City | ProfileField::Phone => " Отправьте «-», чтобы очистить.".to_string(),
        _ => String::new(),
    };
    format!("Введите новое значение поля «{}».{}", field.label(), hint)
}

pub fn new_booking_notice(booking: &BookingRequest, client_name: &str) -> String {
    format!(
        "🆕 <b>Новая заявка №{}</b>\n\n👤 <b>Клиент:</b> {}\n📞 <b>Телефон:</b> {}\n\n\
         {}\n\nУправлять заявками: /bookings",
        booking.id,
        escape(client_name),
        escape(&booking.contact_phone),
        escape(&booking.message),
    )
}

pub fn client_status_notice(booking: &BookingRequest) -> String {
    format!("Статус вашей заявки №{} изменён: {}", booking.id, booking.status.label())
}

pub fn client_cancel_notice(booking: &BookingRequest) -> String {
    format!("К сожалению, фотограф отменил вашу заявку №{} 😔", booking.id)
}
