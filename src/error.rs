use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("введите корректный номер телефона в формате + 7 999 999 99 99")]
    InvalidPhone,
    #[error("сообщение не может быть пустым")]
    EmptyMessage,
    #[error("неизвестный статус заявки: {0}")]
    UnknownStatus(String),
    #[error("неизвестная специализация: {0}")]
    UnknownSpecialization(String),
    #[error("неизвестный язык: {0}")]
    UnknownLanguage(String),
    #[error("стоимость должна быть целым неотрицательным числом")]
    InvalidPrice,
    #[error("значение длиннее {max} символов")]
    TooLong { max: usize },
    #[error("значение не может быть пустым")]
    Empty,
    #[error("нельзя оставить заявку самому себе")]
    SelfBooking,
    #[error("неизвестное поле профиля: {0}")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("booking {0} not found")]
    NotFound(i32),
    #[error("photographer {0} not found")]
    PhotographerNotFound(i32),
    #[error("user {user} is not allowed to modify booking {booking}")]
    Unauthorized { booking: i32, user: i32 },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}
