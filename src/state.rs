use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::accounts::{Accounts, ProfileField};
use crate::booking::{BookingLifecycle, PgBookingStore};
use crate::config::Config;
use crate::directory::Directory;

// Шаг диалога, в котором находится чат
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserStep {
    #[default]
    Idle,
    BookingMessage { photographer_id: i32 },
    BookingPhone { photographer_id: i32, message: String },
    EditingProfile(ProfileField),
}

#[derive(Debug, Clone, Default)]
pub struct UserSession {
    pub step: UserStep,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingLifecycle,
    pub accounts: Accounts,
    pub directory: Directory,
    sessions: Arc<Mutex<HashMap<i64, UserSession>>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            bookings: BookingLifecycle::new(Arc::new(PgBookingStore::new(pool.clone()))),
            accounts: Accounts::new(pool.clone()),
            directory: Directory::new(pool, config.list_limit),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn step(&self, chat_id: i64) -> UserStep {
        let sessions = self.sessions.lock().await;
        sessions.get(&chat_id).map(|s| s.step.clone()).unwrap_or_default()
    }

    pub async fn set_step(&self, chat_id: i64, step: UserStep) {
        let mut sessions = self.sessions.lock().await;
        if step == UserStep::Idle {
            sessions.remove(&chat_id);
        } else {
            sessions.entry(chat_id).or_default().step = step;
        }
    }
}
