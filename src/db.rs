use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

pub async fn get_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        telegram_id BIGINT NOT NULL UNIQUE,
        username TEXT,
        name TEXT NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS client_profiles (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
        phone_number VARCHAR(20)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS photographer_profiles (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
        short_intro VARCHAR(250) NOT NULL,
        bio TEXT NOT NULL,
        city VARCHAR(100),
        specialization VARCHAR(50) NOT NULL DEFAULT 'wedding',
        price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
        language VARCHAR(10) NOT NULL DEFAULT 'ru',
        views_count INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS booking_requests (
        id SERIAL PRIMARY KEY,
        client_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        photographer_id INTEGER NOT NULL REFERENCES photographer_profiles (id) ON DELETE CASCADE,
        status VARCHAR(20) NOT NULL DEFAULT 'new'
            CHECK (status IN ('new', 'in_progress', 'completed', 'cancelled')),
        message TEXT NOT NULL,
        contact_phone VARCHAR(20) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        deleted_by_client BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_by_photographer BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS favorites (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        photographer_id INTEGER NOT NULL REFERENCES photographer_profiles (id) ON DELETE CASCADE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        UNIQUE (user_id, photographer_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_booking_requests_client ON booking_requests (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_booking_requests_photographer \
     ON booking_requests (photographer_id)",
    "CREATE INDEX IF NOT EXISTS idx_photographer_profiles_specialization \
     ON photographer_profiles (specialization)",
];

/// Создаёт таблицы, если их ещё нет. Можно вызывать при каждом старте.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
