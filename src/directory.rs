use std::collections::HashMap;

use log::debug;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{Language, PhotographerCard, Specialization};

/// Фильтры каталога фотографов. Пустое поле означает «любой».
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialistFilter {
    pub specialization: Option<Specialization>,
    pub language: Option<Language>,
    pub city: Option<String>,
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
}

impl SpecialistFilter {
    /// Разбирает аргументы команды вида `wedding city=Нижний Новгород price_max=5000`.
    ///
    /// Значение тянется до следующего `ключ=`, поэтому город может содержать пробелы.
    /// Слово без ключа в начале считается специализацией. Нераспознанные значения
    /// (`any`, неизвестная специализация, нечисловая цена) игнорируются.
    pub fn parse(args: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for token in args.split_whitespace() {
            match token.split_once('=') {
                Some((key, value)) if is_filter_key(key) => {
                    pairs.push((key.to_lowercase(), value.to_string()));
                }
                _ => match pairs.last_mut() {
                    Some((_, value)) => {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(token);
                    }
                    None => pairs.push(("specialization".to_string(), token.to_string())),
                },
            }
        }

        let mut filter = SpecialistFilter::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() || value.eq_ignore_ascii_case("any") {
                continue;
            }
            match key.as_str() {
                "specialization" => filter.specialization = value.parse().ok(),
                "language" => filter.language = value.parse().ok(),
                "city" => filter.city = Some(value.to_string()),
                "price_min" => filter.price_min = value.parse().ok(),
                "price_max" => filter.price_max = value.parse().ok(),
                _ => {}
            }
        }
        filter
    }
}

fn is_filter_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "specialization" | "language" | "city" | "price_min" | "price_max"
    )
}

/// Экранирует `%`, `_` и `\` для подстановки в ILIKE.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn card_query(viewer: Option<i32>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT p.id, p.user_id, u.name, u.username, p.short_intro, p.bio, p.city, \
         p.specialization, p.price, p.language, p.views_count, \
         EXISTS (SELECT 1 FROM favorites f WHERE f.photographer_id = p.id AND f.user_id = ",
    );
    qb.push_bind(viewer);
    qb.push(
        ") AS is_favorite FROM photographer_profiles p \
         JOIN users u ON u.id = p.user_id WHERE TRUE",
    );
    qb
}

fn search_query(
    filter: &SpecialistFilter,
    viewer: Option<i32>,
    limit: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = card_query(viewer);
    if let Some(specialization) = filter.specialization {
        qb.push(" AND p.specialization = ").push_bind(specialization.as_str());
    }
    if let Some(language) = filter.language {
        qb.push(" AND p.language = ").push_bind(language.as_str());
    }
    if let Some(city) = &filter.city {
        qb.push(" AND p.city ILIKE ").push_bind(format!("%{}%", escape_like(city)));
    }
    if let Some(price_min) = filter.price_min {
        qb.push(" AND p.price >= ").push_bind(price_min);
    }
    if let Some(price_max) = filter.price_max {
        qb.push(" AND p.price <= ").push_bind(price_max);
    }
    qb.push(" ORDER BY p.id LIMIT ").push_bind(limit);
    qb
}

#[derive(Clone, Debug)]
pub struct Directory {
    pool: PgPool,
    limit: i64,
}

impl Directory {
    pub fn new(pool: PgPool, limit: i64) -> Self {
        Self { pool, limit }
    }

    pub async fn search(
        &self,
        filter: &SpecialistFilter,
        viewer: Option<i32>,
    ) -> Result<Vec<PhotographerCard>, sqlx::Error> {
        debug!("specialist search {:?}", filter);
        search_query(filter, viewer, self.limit)
            .build_query_as::<PhotographerCard>()
            .fetch_all(&self.pool)
            .await
    }

    /// Карточка фотографа; каждый просмотр увеличивает счётчик.
    pub async fn detail(
        &self,
        photographer_id: i32,
        viewer: Option<i32>,
    ) -> Result<Option<PhotographerCard>, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE photographer_profiles SET views_count = views_count + 1 WHERE id = $1",
        )
        .bind(photographer_id)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.card(photographer_id, viewer).await
    }

    /// Карточка без учёта просмотра.
    pub async fn card(
        &self,
        photographer_id: i32,
        viewer: Option<i32>,
    ) -> Result<Option<PhotographerCard>, sqlx::Error> {
        let mut qb = card_query(viewer);
        qb.push(" AND p.id = ").push_bind(photographer_id);
        qb.build_query_as::<PhotographerCard>()
            .fetch_optional(&self.pool)
            .await
    }

    /// Добавляет или убирает фотографа из избранного. `None` - фотографа нет.
    pub async fn toggle_favorite(
        &self,
        user_id: i32,
        photographer_id: i32,
    ) -> Result<Option<bool>, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM photographer_profiles WHERE id = $1)",
        )
        .bind(photographer_id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Ok(None);
        }

        let removed =
            sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND photographer_id = $2")
                .bind(user_id)
                .bind(photographer_id)
                .execute(&self.pool)
                .await?;
        if removed.rows_affected() > 0 {
            return Ok(Some(false));
        }

        sqlx::query(
            "INSERT INTO favorites (user_id, photographer_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, photographer_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(photographer_id)
        .execute(&self.pool)
        .await?;
        Ok(Some(true))
    }

    pub async fn favorites(&self, user_id: i32) -> Result<Vec<PhotographerCard>, sqlx::Error> {
        let mut qb = card_query(Some(user_id));
        qb.push(" AND p.id IN (SELECT photographer_id FROM favorites WHERE user_id = ")
            .push_bind(user_id)
            .push(") ORDER BY p.id");
        qb.build_query_as::<PhotographerCard>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn photographer_names(
        &self,
        ids: &[i32],
    ) -> Result<HashMap<i32, String>, sqlx::Error> {
        let rows: Vec<(i32, String)> = sqlx::query_as(
            "SELECT p.id, u.name FROM photographer_profiles p \
             JOIN users u ON u.id = p.user_id WHERE p.id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_arguments_mean_no_filter() {
        assert_eq!(SpecialistFilter::parse(""), SpecialistFilter::default());
        assert_eq!(SpecialistFilter::parse("any language=any"), SpecialistFilter::default());
    }

    #[test]
    fn bare_word_is_a_specialization() {
        let filter = SpecialistFilter::parse("Свадьба");
        assert_eq!(filter.specialization, Some(Specialization::Wedding));
    }

    #[test]
    fn keyed_values_may_contain_spaces() {
        let filter = SpecialistFilter::parse(
            "portrait city=Нижний Новгород price_min=1000 price_max=5000 language=en",
        );
        assert_eq!(
            filter,
            SpecialistFilter {
                specialization: Some(Specialization::Portrait),
                language: Some(Language::En),
                city: Some("Нижний Новгород".to_string()),
                price_min: Some(1000),
                price_max: Some(5000),
            }
        );
    }

    #[test]
    fn unparsable_values_are_ignored() {
        let filter = SpecialistFilter::parse("specialization=food price_min=дёшево price_max=3000");
        assert_eq!(filter.specialization, None);
        assert_eq!(filter.price_min, None);
        assert_eq!(filter.price_max, Some(3000));
    }

    #[test]
    fn search_sql_contains_only_requested_conditions() {
        let filter = SpecialistFilter {
            city: Some("Москва".to_string()),
            price_max: Some(4000),
            ..SpecialistFilter::default()
        };
        let qb = search_query(&filter, Some(1), 10);
        let sql = qb.sql();
        assert!(sql.contains("f.user_id = $1"));
        assert!(sql.contains("p.city ILIKE $2"));
        assert!(sql.contains("p.price <= $3"));
        assert!(sql.ends_with("ORDER BY p.id LIMIT $4"));
        assert!(!sql.contains("p.specialization ="));
        assert!(!sql.contains("p.price >="));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Сочи"), "Сочи");
    }
}
