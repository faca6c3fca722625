use std::sync::Arc;

use log::{debug, info};

use super::actor::{Actor, ActorResolver};
use super::store::{BookingScope, BookingStore, Lookup, SoftDelete};
use crate::error::{BookingError, ValidationError};
use crate::models::{BookingRequest, BookingStatus, NewBookingRequest, Principal, Side};
use crate::validation;

pub const MSG_STATUS_UPDATED: &str = "Статус заявки обновлен.";
pub const MSG_REMOVED_FROM_LIST: &str = "Заявка удалена из вашего списка.";
pub const MSG_CANCELLED: &str = "Заявка отменена. Клиент получит уведомление.";
pub const MSG_DELETED: &str = "Заявка удалена.";
pub const MSG_NOT_FOUND: &str = "Заявка не найдена.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    UpdateStatus(BookingStatus),
    CancelOrDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Закрытая заявка скрыта у действующей стороны; `purged` - удалена совсем.
    RemovedFromList { purged: bool },
    /// Фотограф отменил активную заявку, клиент продолжает её видеть.
    Cancelled(BookingRequest),
    Deleted,
}

impl CancelOutcome {
    pub fn user_message(&self) -> &'static str {
        match self {
            CancelOutcome::RemovedFromList { .. } => MSG_REMOVED_FROM_LIST,
            CancelOutcome::Cancelled(_) => MSG_CANCELLED,
            CancelOutcome::Deleted => MSG_DELETED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Unauthorized,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub outcome: Outcome,
    pub user_message: String,
    /// Заявка после изменения, если она осталась видна второй стороне.
    pub changed: Option<BookingRequest>,
}

impl ActionReport {
    fn success(message: &str, changed: Option<BookingRequest>) -> Self {
        ActionReport {
            outcome: Outcome::Success,
            user_message: message.to_string(),
            changed,
        }
    }

    fn failure(outcome: Outcome) -> Self {
        ActionReport {
            outcome,
            user_message: MSG_NOT_FOUND.to_string(),
            changed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub sent_active: Vec<BookingRequest>,
    pub sent_completed: Vec<BookingRequest>,
    pub received_active: Vec<BookingRequest>,
    pub received_completed: Vec<BookingRequest>,
}

fn split_completed(bookings: Vec<BookingRequest>) -> (Vec<BookingRequest>, Vec<BookingRequest>) {
    bookings
        .into_iter()
        .partition(|booking| booking.status != BookingStatus::Completed)
}

#[derive(Clone)]
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_request(
        &self,
        client: &Principal,
        photographer_id: i32,
        message: &str,
        contact_phone: &str,
    ) -> Result<BookingRequest, BookingError> {
        // У такой заявки обе стороны - один и тот же фотограф, и флаг клиента
        // никогда не выставляется.
        if client.photographer_id == Some(photographer_id) {
            return Err(ValidationError::SelfBooking.into());
        }
        let draft = NewBookingRequest {
            client_id: client.user_id,
            photographer_id,
            message: validation::booking_message(message)?,
            contact_phone: validation::normalize_contact_phone(contact_phone)?,
        };
        if !self.store.photographer_exists(photographer_id).await? {
            return Err(BookingError::PhotographerNotFound(photographer_id));
        }

        let booking = self.store.insert(draft).await?;
        info!(
            "booking {} created by user {} for photographer {}",
            booking.id, client.user_id, photographer_id
        );
        Ok(booking)
    }

    pub async fn update_status(
        &self,
        booking_id: i32,
        actor: &Principal,
        status: BookingStatus,
    ) -> Result<BookingRequest, BookingError> {
        let booking = match self.store.find(booking_id, BookingScope::Any).await? {
            Lookup::Found(booking) => booking,
            Lookup::NotFound => return Err(BookingError::NotFound(booking_id)),
        };
        if !matches!(ActorResolver::resolve(actor, &booking), Actor::Photographer(_)) {
            return Err(BookingError::Unauthorized {
                booking: booking_id,
                user: actor.user_id,
            });
        }

        let updated = self
            .store
            .set_status(booking_id, status)
            .await?
            .ok_or(BookingError::NotFound(booking_id))?;
        info!("booking {} status {} -> {}", booking_id, booking.status, status);
        Ok(updated)
    }

    pub async fn cancel_or_delete(
        &self,
        booking_id: i32,
        actor: &Principal,
    ) -> Result<CancelOutcome, BookingError> {
        let side = ActorResolver::acting_side(actor);
        let own = self.store.find(booking_id, ActorResolver::own_scope(actor)).await?;

        if let Lookup::Found(booking) = own {
            if booking.status.is_closed() {
                return match self.store.hide_for(booking_id, side).await? {
                    SoftDelete::Hidden => {
                        debug!("booking {} hidden for {:?}", booking_id, side);
                        Ok(CancelOutcome::RemovedFromList { purged: false })
                    }
                    SoftDelete::Purged => {
                        info!("booking {} purged after both parties removed it", booking_id);
                        Ok(CancelOutcome::RemovedFromList { purged: true })
                    }
                    SoftDelete::Missing => Err(BookingError::NotFound(booking_id)),
                };
            }

            if side == Side::Photographer {
                let cancelled = self
                    .store
                    .set_status(booking_id, BookingStatus::Cancelled)
                    .await?
                    .ok_or(BookingError::NotFound(booking_id))?;
                info!(
                    "booking {} cancelled by photographer {}",
                    booking_id, booking.photographer_id
                );
                return Ok(CancelOutcome::Cancelled(cancelled));
            }
            // Клиент отзывает активную заявку: запись удаляется и у фотографа.
        } else {
            let party = self.store.find(booking_id, ActorResolver::party_scope(actor)).await?;
            if party == Lookup::NotFound {
                return Err(BookingError::NotFound(booking_id));
            }
        }

        if !self.store.delete(booking_id).await? {
            return Err(BookingError::NotFound(booking_id));
        }
        info!("booking {} deleted by user {}", booking_id, actor.user_id);
        Ok(CancelOutcome::Deleted)
    }

    /// Точка входа для обработчиков: доменные ошибки превращаются в отчёт,
    /// наружу выходят только ошибки хранилища.
    pub async fn submit_action(
        &self,
        booking_id: i32,
        actor: &Principal,
        action: BookingAction,
    ) -> Result<ActionReport, BookingError> {
        let result = match action {
            BookingAction::UpdateStatus(status) => self
                .update_status(booking_id, actor, status)
                .await
                .map(|booking| ActionReport::success(MSG_STATUS_UPDATED, Some(booking))),
            BookingAction::CancelOrDelete => {
                self.cancel_or_delete(booking_id, actor).await.map(|outcome| {
                    let message = outcome.user_message();
                    match outcome {
                        CancelOutcome::Cancelled(booking) => {
                            ActionReport::success(message, Some(booking))
                        }
                        _ => ActionReport::success(message, None),
                    }
                })
            }
        };

        match result {
            Ok(report) => Ok(report),
            Err(BookingError::NotFound(_)) => Ok(ActionReport::failure(Outcome::NotFound)),
            Err(BookingError::Unauthorized { booking, user }) => {
                info!("user {} tried to modify booking {} without access", user, booking);
                Ok(ActionReport::failure(Outcome::Unauthorized))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn dashboard(&self, principal: &Principal) -> Result<Dashboard, BookingError> {
        let sent_scope = BookingScope::Client {
            user_id: principal.user_id,
        };
        let (sent_active, sent_completed) = split_completed(self.store.list(sent_scope).await?);

        let (received_active, received_completed) = match principal.photographer_id {
            Some(photographer_id) => {
                let received = self
                    .store
                    .list(BookingScope::Photographer { photographer_id })
                    .await?;
                split_completed(received)
            }
            None => (Vec::new(), Vec::new()),
        };

        Ok(Dashboard {
            sent_active,
            sent_completed,
            received_active,
            received_completed,
        })
    }
}
