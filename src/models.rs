use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::New,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::New => "new",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::New => "🆕 Новая",
            BookingStatus::InProgress => "⏳ В работе",
            BookingStatus::Completed => "✅ Выполнена",
            BookingStatus::Cancelled => "❌ Отменена",
        }
    }

    /// Завершённые и отменённые заявки стороны могут только убрать из своего списка.
    pub fn is_closed(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    Wedding,
    Portrait,
    Reportage,
    Lovestory,
    Fashion,
}

impl Specialization {
    pub const ALL: [Specialization; 5] = [
        Specialization::Wedding,
        Specialization::Portrait,
        Specialization::Reportage,
        Specialization::Lovestory,
        Specialization::Fashion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialization::Wedding => "wedding",
            Specialization::Portrait => "portrait",
            Specialization::Reportage => "reportage",
            Specialization::Lovestory => "lovestory",
            Specialization::Fashion => "fashion",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Specialization::Wedding => "Свадьба",
            Specialization::Portrait => "Портрет",
            Specialization::Reportage => "Репортаж",
            Specialization::Lovestory => "Love Story",
            Specialization::Fashion => "Fashion",
        }
    }
}

impl FromStr for Specialization {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Specialization::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.label().to_lowercase() == s)
            .ok_or(ValidationError::UnknownSpecialization(s))
    }
}

impl TryFrom<String> for Specialization {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::Ru => "Русский",
            Language::En => "English",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "русский" => Ok(Language::Ru),
            "en" | "english" => Ok(Language::En),
            other => Err(ValidationError::UnknownLanguage(other.to_string())),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Сторона заявки, от имени которой действует пользователь.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Photographer,
}

/// Текущий пользователь. Передаётся в каждую операцию явно.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Principal {
    pub user_id: i32,
    pub telegram_id: i64,
    pub name: String,
    pub username: Option<String>,
    pub photographer_id: Option<i32>,
}

impl Principal {
    pub fn is_photographer(&self) -> bool {
        self.photographer_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BookingRequest {
    pub id: i32,
    pub client_id: i32,
    pub photographer_id: i32,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub message: String,
    pub contact_phone: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_by_client: bool,
    pub deleted_by_photographer: bool,
}

/// Проверенные данные новой заявки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookingRequest {
    pub client_id: i32,
    pub photographer_id: i32,
    pub message: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClientProfile {
    pub id: i32,
    pub user_id: i32,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PhotographerProfile {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub username: Option<String>,
    pub short_intro: String,
    pub bio: String,
    pub city: Option<String>,
    #[sqlx(try_from = "String")]
    pub specialization: Specialization,
    pub price: i32,
    #[sqlx(try_from = "String")]
    pub language: Language,
    pub views_count: i32,
}

/// Фотограф в выдаче каталога.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PhotographerCard {
    #[sqlx(flatten)]
    pub profile: PhotographerProfile,
    pub is_favorite: bool,
}
