pub mod actor;
pub mod lifecycle;
#[cfg(test)]
pub mod memory;
pub mod pg;
pub mod store;

pub use lifecycle::{BookingAction, BookingLifecycle, Outcome};
pub use pg::PgBookingStore;
