use super::store::BookingScope;
use crate::models::{BookingRequest, Principal, Side};

/// Роль пользователя относительно конкретной заявки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Client(i32),
    Photographer(i32),
    None,
}

pub struct ActorResolver;

impl ActorResolver {
    /// Фотограф проверяется первым: владелец профиля, отправивший заявку самому себе,
    /// действует как фотограф.
    pub fn resolve(principal: &Principal, booking: &BookingRequest) -> Actor {
        match principal.photographer_id {
            Some(profile) if profile == booking.photographer_id => Actor::Photographer(profile),
            _ if booking.client_id == principal.user_id => Actor::Client(principal.user_id),
            _ => Actor::None,
        }
    }

    /// Сторона, от имени которой выступает учётная запись.
    pub fn acting_side(principal: &Principal) -> Side {
        if principal.is_photographer() {
            Side::Photographer
        } else {
            Side::Client
        }
    }

    pub fn own_scope(principal: &Principal) -> BookingScope {
        match principal.photographer_id {
            Some(photographer_id) => BookingScope::Photographer { photographer_id },
            None => BookingScope::Client { user_id: principal.user_id },
        }
    }

    pub fn party_scope(principal: &Principal) -> BookingScope {
        BookingScope::Party { user_id: principal.user_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use time::OffsetDateTime;

    fn booking(client_id: i32, photographer_id: i32) -> BookingRequest {
        BookingRequest {
            id: 1,
            client_id,
            photographer_id,
            status: BookingStatus::New,
            message: "Съёмка".to_string(),
            contact_phone: "+ 7 999 123 45 67".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            deleted_by_client: false,
            deleted_by_photographer: false,
        }
    }

    fn principal(user_id: i32, photographer_id: Option<i32>) -> Principal {
        Principal {
            user_id,
            telegram_id: 1000 + user_id as i64,
            name: format!("user{user_id}"),
            username: None,
            photographer_id,
        }
    }

    #[test]
    fn classifies_each_party() {
        let b = booking(10, 3);
        assert_eq!(ActorResolver::resolve(&principal(10, None), &b), Actor::Client(10));
        assert_eq!(ActorResolver::resolve(&principal(20, Some(3)), &b), Actor::Photographer(3));
        assert_eq!(ActorResolver::resolve(&principal(30, Some(4)), &b), Actor::None);
        assert_eq!(ActorResolver::resolve(&principal(30, None), &b), Actor::None);
    }

    #[test]
    fn photographer_booking_someone_else_is_a_client_there() {
        let b = booking(20, 9);
        assert_eq!(ActorResolver::resolve(&principal(20, Some(3)), &b), Actor::Client(20));
    }

    #[test]
    fn scopes_follow_the_account_type() {
        assert_eq!(ActorResolver::acting_side(&principal(1, None)), Side::Client);
        assert_eq!(ActorResolver::acting_side(&principal(1, Some(2))), Side::Photographer);
        assert_eq!(
            ActorResolver::own_scope(&principal(1, Some(2))),
            BookingScope::Photographer { photographer_id: 2 }
        );
        assert_eq!(
            ActorResolver::own_scope(&principal(1, None)),
            BookingScope::Client { user_id: 1 }
        );
    }
}
