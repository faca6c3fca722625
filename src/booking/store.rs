use async_trait::async_trait;

use crate::models::{BookingRequest, BookingStatus, NewBookingRequest, Side};

/// Условие, которым ограничивается поиск заявки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    /// Заявки, отправленные пользователем.
    Client { user_id: i32 },
    /// Заявки, полученные профилем фотографа.
    Photographer { photographer_id: i32 },
    /// Заявки, где пользователь клиент или владелец профиля фотографа.
    Party { user_id: i32 },
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(BookingRequest),
    NotFound,
}

impl From<Option<BookingRequest>> for Lookup {
    fn from(value: Option<BookingRequest>) -> Self {
        match value {
            Some(booking) => Lookup::Found(booking),
            None => Lookup::NotFound,
        }
    }
}

/// Результат пометки «удалено» одной из сторон.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDelete {
    /// Флаг выставлен, запись осталась у второй стороны.
    Hidden,
    /// Оба флага выставлены, запись удалена физически.
    Purged,
    Missing,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, draft: NewBookingRequest) -> Result<BookingRequest, sqlx::Error>;

    async fn find(&self, id: i32, scope: BookingScope) -> Result<Lookup, sqlx::Error>;

    /// Заявки, видимые стороне: записи со своим флагом удаления пропускаются.
    /// Для `Party`/`Any` флаги не учитываются. Новые идут первыми.
    async fn list(&self, scope: BookingScope) -> Result<Vec<BookingRequest>, sqlx::Error>;

    async fn set_status(
        &self,
        id: i32,
        status: BookingStatus,
    ) -> Result<Option<BookingRequest>, sqlx::Error>;

    /// Выставляет флаг стороны и удаляет запись, если оба флага подняты.
    /// Выполняется атомарно: при гонке двух сторон удаление происходит ровно один раз.
    async fn hide_for(&self, id: i32, side: Side) -> Result<SoftDelete, sqlx::Error>;

    /// Возвращает `false`, если записи уже нет.
    async fn delete(&self, id: i32) -> Result<bool, sqlx::Error>;

    async fn photographer_exists(&self, photographer_id: i32) -> Result<bool, sqlx::Error>;
}
