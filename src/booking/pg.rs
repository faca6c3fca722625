use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::store::{BookingScope, BookingStore, Lookup, SoftDelete};
use crate::models::{BookingRequest, BookingStatus, NewBookingRequest, Side};

const COLUMNS: &str = "b.id, b.client_id, b.photographer_id, b.status, b.message, b.contact_phone, \
                       b.created_at, b.updated_at, b.deleted_by_client, b.deleted_by_photographer";

#[derive(Clone, Debug)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: BookingScope, visible_only: bool) {
    match scope {
        BookingScope::Client { user_id } => {
            qb.push(" AND b.client_id = ").push_bind(user_id);
            if visible_only {
                qb.push(" AND NOT b.deleted_by_client");
            }
        }
        BookingScope::Photographer { photographer_id } => {
            qb.push(" AND b.photographer_id = ").push_bind(photographer_id);
            if visible_only {
                qb.push(" AND NOT b.deleted_by_photographer");
            }
        }
        BookingScope::Party { user_id } => {
            qb.push(" AND (b.client_id = ")
                .push_bind(user_id)
                .push(" OR p.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        BookingScope::Any => {}
    }
}

fn select(scope: BookingScope, visible_only: bool) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM booking_requests b \
         JOIN photographer_profiles p ON p.id = b.photographer_id WHERE TRUE"
    ));
    push_scope(&mut qb, scope, visible_only);
    qb
}

fn flag_column(side: Side) -> &'static str {
    match side {
        Side::Client => "deleted_by_client",
        Side::Photographer => "deleted_by_photographer",
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, draft: NewBookingRequest) -> Result<BookingRequest, sqlx::Error> {
        sqlx::query_as::<_, BookingRequest>(
            r#"
            INSERT INTO booking_requests
                (client_id, photographer_id, status, message, contact_phone)
            VALUES ($1, $2, 'new', $3, $4)
            RETURNING id, client_id, photographer_id, status, message, contact_phone,
                      created_at, updated_at, deleted_by_client, deleted_by_photographer
            "#,
        )
        .bind(draft.client_id)
        .bind(draft.photographer_id)
        .bind(&draft.message)
        .bind(&draft.contact_phone)
        .fetch_one(&self.pool)
        .await
    }

    async fn find(&self, id: i32, scope: BookingScope) -> Result<Lookup, sqlx::Error> {
        let mut qb = select(scope, false);
        qb.push(" AND b.id = ").push_bind(id);
        let booking = qb
            .build_query_as::<BookingRequest>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking.into())
    }

    async fn list(&self, scope: BookingScope) -> Result<Vec<BookingRequest>, sqlx::Error> {
        let mut qb = select(scope, true);
        qb.push(" ORDER BY b.created_at DESC, b.id DESC");
        qb.build_query_as::<BookingRequest>()
            .fetch_all(&self.pool)
            .await
    }

    async fn set_status(
        &self,
        id: i32,
        status: BookingStatus,
    ) -> Result<Option<BookingRequest>, sqlx::Error> {
        sqlx::query_as::<_, BookingRequest>(
            r#"
            UPDATE booking_requests SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, photographer_id, status, message, contact_phone,
                      created_at, updated_at, deleted_by_client, deleted_by_photographer
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn hide_for(&self, id: i32, side: Side) -> Result<SoftDelete, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // UPDATE блокирует строку до конца транзакции, поэтому вторая сторона
        // увидит уже выставленный флаг первой.
        let flags: Option<(bool, bool)> = sqlx::query_as(&format!(
            "UPDATE booking_requests SET {} = TRUE, updated_at = NOW() WHERE id = $1 \
             RETURNING deleted_by_client, deleted_by_photographer",
            flag_column(side)
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match flags {
            None => SoftDelete::Missing,
            Some((true, true)) => {
                let deleted = sqlx::query(
                    "DELETE FROM booking_requests \
                     WHERE id = $1 AND deleted_by_client AND deleted_by_photographer",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
                if deleted.rows_affected() == 1 {
                    SoftDelete::Purged
                } else {
                    SoftDelete::Missing
                }
            }
            Some(_) => SoftDelete::Hidden,
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM booking_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn photographer_exists(&self, photographer_id: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM photographer_profiles WHERE id = $1)",
        )
        .bind(photographer_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_listing_hides_own_deleted_rows() {
        let qb = select(BookingScope::Client { user_id: 7 }, true);
        let sql = qb.sql();
        assert!(sql.contains("b.client_id = $1"));
        assert!(sql.contains("NOT b.deleted_by_client"));
        assert!(!sql.contains("NOT b.deleted_by_photographer"));
    }

    #[test]
    fn lookup_ignores_soft_delete_flags() {
        let qb = select(BookingScope::Photographer { photographer_id: 3 }, false);
        assert!(!qb.sql().contains("NOT b.deleted_by_photographer"));
    }

    #[test]
    fn party_scope_matches_either_side() {
        let qb = select(BookingScope::Party { user_id: 5 }, false);
        assert!(qb.sql().contains("(b.client_id = $1 OR p.user_id = $2)"));
    }

    /// Проверки с настоящей базой запускаются, только если задан TEST_DATABASE_URL.
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("test database is reachable");
        crate::db::init_schema(&pool).await.expect("schema is created");
        Some(pool)
    }

    async fn seed_user(pool: &PgPool, telegram_id: i64) -> i32 {
        sqlx::query_scalar("INSERT INTO users (telegram_id, name) VALUES ($1, 'test') RETURNING id")
            .bind(telegram_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parallel_hide_by_both_sides_purges_exactly_once() {
        let Some(pool) = test_pool().await else {
            return;
        };
        // отрицательные id не пересекаются с настоящими пользователями Telegram
        let seed = -(time::OffsetDateTime::now_utc().unix_timestamp_nanos() as i64).abs();
        let client_id = seed_user(&pool, seed).await;
        let owner_id = seed_user(&pool, seed - 1).await;
        let photographer_id: i32 = sqlx::query_scalar(
            "INSERT INTO photographer_profiles (user_id, short_intro, bio) \
             VALUES ($1, 'i', 'b') RETURNING id",
        )
        .bind(owner_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let store = PgBookingStore::new(pool.clone());
        for _ in 0..10 {
            let booking = store
                .insert(NewBookingRequest {
                    client_id,
                    photographer_id,
                    message: "Съёмка".to_string(),
                    contact_phone: "+ 7 999 123 45 67".to_string(),
                })
                .await
                .unwrap();
            store.set_status(booking.id, BookingStatus::Completed).await.unwrap();

            let by_client = tokio::spawn({
                let store = store.clone();
                async move { store.hide_for(booking.id, Side::Client).await }
            });
            let by_photographer = tokio::spawn({
                let store = store.clone();
                async move { store.hide_for(booking.id, Side::Photographer).await }
            });
            let mut outcomes = [
                by_client.await.unwrap().unwrap(),
                by_photographer.await.unwrap().unwrap(),
            ];
            outcomes.sort_by_key(|outcome| *outcome == SoftDelete::Purged);
            assert_eq!(outcomes, [SoftDelete::Hidden, SoftDelete::Purged]);
            assert_eq!(store.find(booking.id, BookingScope::Any).await.unwrap(), Lookup::NotFound);
        }

        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(vec![client_id, owner_id])
            .execute(&pool)
            .await
            .unwrap();
    }
}
