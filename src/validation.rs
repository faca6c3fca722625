use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static CONTACT_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+ 7 \d{3} \d{3} \d{2} \d{2}$").expect("static phone pattern"));

/// Приводит номер к виду `+ 7 999 999 99 99` и проверяет формат.
///
/// Кроме канонической записи принимаются 11 цифр, начинающиеся с 7 или 8,
/// в любом оформлении (`+79991234567`, `8 (999) 123-45-67`).
pub fn normalize_contact_phone(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    if CONTACT_PHONE.is_match(raw) {
        return Ok(raw.to_string());
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let allowed = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if !allowed || digits.len() != 11 || !(digits.starts_with('7') || digits.starts_with('8')) {
        return Err(ValidationError::InvalidPhone);
    }

    let formatted = format!(
        "+ 7 {} {} {} {}",
        &digits[1..4],
        &digits[4..7],
        &digits[7..9],
        &digits[9..11]
    );
    debug_assert!(CONTACT_PHONE.is_match(&formatted));
    Ok(formatted)
}

/// Предел описания заявки: заявка и уведомление о ней должны уместиться
/// в одно сообщение Telegram даже после HTML-экранирования.
pub const MAX_BOOKING_MESSAGE: usize = 500;

pub fn booking_message(raw: &str) -> Result<String, ValidationError> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    if message.chars().count() > MAX_BOOKING_MESSAGE {
        return Err(ValidationError::TooLong { max: MAX_BOOKING_MESSAGE });
    }
    Ok(message.to_string())
}

/// Обрезает пробелы и проверяет длину в символах (не байтах).
pub fn bounded_text(raw: &str, max: usize) -> Result<String, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    if text.chars().count() > max {
        return Err(ValidationError::TooLong { max });
    }
    Ok(text.to_string())
}

pub fn price(raw: &str) -> Result<i32, ValidationError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|value| *value >= 0)
        .ok_or(ValidationError::InvalidPrice)
}
