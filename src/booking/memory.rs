//! Хранилище заявок в памяти для тестов жизненного цикла.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::store::{BookingScope, BookingStore, Lookup, SoftDelete};
use crate::models::{BookingRequest, BookingStatus, NewBookingRequest, Side};

#[derive(Default)]
struct Inner {
    next_id: i32,
    bookings: HashMap<i32, BookingRequest>,
    /// photographer_id -> user_id владельца профиля
    photographers: HashMap<i32, i32>,
}

#[derive(Default)]
pub struct MemoryBookingStore {
    inner: Mutex<Inner>,
}

impl MemoryBookingStore {
    pub async fn add_photographer(&self, photographer_id: i32, user_id: i32) {
        self.inner.lock().await.photographers.insert(photographer_id, user_id);
    }

    /// Снимок записи в обход областей видимости.
    pub async fn raw(&self, id: i32) -> Option<BookingRequest> {
        self.inner.lock().await.bookings.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.bookings.len()
    }
}

fn matches(
    inner: &Inner,
    booking: &BookingRequest,
    scope: BookingScope,
    visible_only: bool,
) -> bool {
    match scope {
        BookingScope::Client { user_id } => {
            booking.client_id == user_id && !(visible_only && booking.deleted_by_client)
        }
        BookingScope::Photographer { photographer_id } => {
            booking.photographer_id == photographer_id
                && !(visible_only && booking.deleted_by_photographer)
        }
        BookingScope::Party { user_id } => {
            booking.client_id == user_id
                || inner.photographers.get(&booking.photographer_id) == Some(&user_id)
        }
        BookingScope::Any => true,
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert(&self, draft: NewBookingRequest) -> Result<BookingRequest, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let booking = BookingRequest {
            id: inner.next_id,
            client_id: draft.client_id,
            photographer_id: draft.photographer_id,
            status: BookingStatus::New,
            message: draft.message,
            contact_phone: draft.contact_phone,
            created_at: now,
            updated_at: now,
            deleted_by_client: false,
            deleted_by_photographer: false,
        };
        inner.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find(&self, id: i32, scope: BookingScope) -> Result<Lookup, sqlx::Error> {
        let inner = self.inner.lock().await;
        let found = inner
            .bookings
            .get(&id)
            .filter(|booking| matches(&inner, booking, scope, false))
            .cloned();
        Ok(found.into())
    }

    async fn list(&self, scope: BookingScope) -> Result<Vec<BookingRequest>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<_> = inner
            .bookings
            .values()
            .filter(|booking| matches(&inner, booking, scope, true))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn set_status(
        &self,
        id: i32,
        status: BookingStatus,
    ) -> Result<Option<BookingRequest>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        Ok(inner.bookings.get_mut(&id).map(|booking| {
            booking.status = status;
            booking.updated_at = OffsetDateTime::now_utc();
            booking.clone()
        }))
    }

    async fn hide_for(&self, id: i32, side: Side) -> Result<SoftDelete, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let Some(booking) = inner.bookings.get_mut(&id) else {
            return Ok(SoftDelete::Missing);
        };
        match side {
            Side::Client => booking.deleted_by_client = true,
            Side::Photographer => booking.deleted_by_photographer = true,
        }
        booking.updated_at = OffsetDateTime::now_utc();
        if booking.deleted_by_client && booking.deleted_by_photographer {
            inner.bookings.remove(&id);
            return Ok(SoftDelete::Purged);
        }
        Ok(SoftDelete::Hidden)
    }

    async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        Ok(self.inner.lock().await.bookings.remove(&id).is_some())
    }

    async fn photographer_exists(&self, photographer_id: i32) -> Result<bool, sqlx::Error> {
        Ok(self.inner.lock().await.photographers.contains_key(&photographer_id))
    }
}
