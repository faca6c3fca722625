use std::collections::HashMap;
use std::str::FromStr;

use log::info;
use sqlx::PgPool;

use crate::error::ValidationError;
use crate::models::{ClientProfile, Language, Principal, Specialization};
use crate::validation;

pub const DEFAULT_SHORT_INTRO: &str = "Начинающий фотограф";
pub const DEFAULT_BIO: &str = "Расскажите о себе...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Photographer,
}

/// Данные пользователя Telegram, нужные для регистрации.
#[derive(Debug, Clone)]
pub struct TelegramUser {
    pub telegram_id: i64,
    pub name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Phone,
    ShortIntro,
    Bio,
    City,
    Specialization,
    Price,
    Language,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValue {
    Text(String),
    /// `None` очищает необязательное поле.
    Optional(Option<String>),
    Number(i32),
}

impl ProfileField {
    pub const CLIENT: [ProfileField; 2] = [ProfileField::Name, ProfileField::Phone];
    pub const PHOTOGRAPHER: [ProfileField; 7] = [
        ProfileField::Name,
        ProfileField::ShortIntro,
        ProfileField::Bio,
        ProfileField::City,
        ProfileField::Specialization,
        ProfileField::Price,
        ProfileField::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Phone => "phone",
            ProfileField::ShortIntro => "short_intro",
            ProfileField::Bio => "bio",
            ProfileField::City => "city",
            ProfileField::Specialization => "specialization",
            ProfileField::Price => "price",
            ProfileField::Language => "language",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Name => "Имя",
            ProfileField::Phone => "Номер телефона",
            ProfileField::ShortIntro => "Кратко о себе",
            ProfileField::Bio => "Биография",
            ProfileField::City => "Город",
            ProfileField::Specialization => "Специализация",
            ProfileField::Price => "Стоимость часа (RUB)",
            ProfileField::Language => "Язык",
        }
    }

    pub fn fields_for(principal: &Principal) -> &'static [ProfileField] {
        if principal.is_photographer() {
            &Self::PHOTOGRAPHER
        } else {
            &Self::CLIENT
        }
    }

    pub fn allowed_for(&self, principal: &Principal) -> bool {
        Self::fields_for(principal).contains(self)
    }

    /// Проверяет введённое значение. Для необязательных полей `-` очищает значение.
    pub fn parse_value(&self, raw: &str) -> Result<ProfileValue, ValidationError> {
        let optional = |max: usize| -> Result<ProfileValue, ValidationError> {
            if raw.trim() == "-" {
                return Ok(ProfileValue::Optional(None));
            }
            validation::bounded_text(raw, max).map(|text| ProfileValue::Optional(Some(text)))
        };

        match self {
            ProfileField::Name => validation::bounded_text(raw, 150).map(ProfileValue::Text),
            ProfileField::Phone => optional(20),
            ProfileField::ShortIntro => validation::bounded_text(raw, 250).map(ProfileValue::Text),
            ProfileField::Bio => validation::bounded_text(raw, 2000).map(ProfileValue::Text),
            ProfileField::City => optional(100),
            ProfileField::Specialization => {
                let kind = Specialization::from_str(raw)?;
                Ok(ProfileValue::Text(kind.as_str().to_string()))
            }
            ProfileField::Price => validation::price(raw).map(ProfileValue::Number),
            ProfileField::Language => {
                let lang = Language::from_str(raw)?;
                Ok(ProfileValue::Text(lang.as_str().to_string()))
            }
        }
    }

    /// (таблица, колонка, ключевая колонка) для обновления поля.
    fn target(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            ProfileField::Name => ("users", "name", "id"),
            ProfileField::Phone => ("client_profiles", "phone_number", "user_id"),
            ProfileField::ShortIntro => ("photographer_profiles", "short_intro", "user_id"),
            ProfileField::Bio => ("photographer_profiles", "bio", "user_id"),
            ProfileField::City => ("photographer_profiles", "city", "user_id"),
            ProfileField::Specialization => ("photographer_profiles", "specialization", "user_id"),
            ProfileField::Price => ("photographer_profiles", "price", "user_id"),
            ProfileField::Language => ("photographer_profiles", "language", "user_id"),
        }
    }

    fn update_sql(&self) -> String {
        let (table, column, key) = self.target();
        format!("UPDATE {table} SET {column} = $1 WHERE {key} = $2")
    }
}

impl FromStr for ProfileField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileField::PHOTOGRAPHER
            .iter()
            .chain(ProfileField::CLIENT.iter())
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// Учётные записи и профили.
#[derive(Clone, Debug)]
pub struct Accounts {
    pool: PgPool,
}

impl Accounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn resolve(&self, telegram_id: i64) -> Result<Option<Principal>, sqlx::Error> {
        sqlx::query_as::<_, Principal>(
            r#"
            SELECT u.id AS user_id, u.telegram_id, u.name, u.username, p.id AS photographer_id
            FROM users u
            LEFT JOIN photographer_profiles p ON p.user_id = u.id
            WHERE u.telegram_id = $1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Создаёт пользователя и профиль выбранной роли. Повторная регистрация
    /// возвращает существующую учётную запись без изменений.
    pub async fn register(
        &self,
        user: &TelegramUser,
        role: Role,
    ) -> Result<Principal, sqlx::Error> {
        if let Some(existing) = self.resolve(user.telegram_id).await? {
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await?;
        let user_id: Option<i32> = sqlx::query_scalar(
            "INSERT INTO users (telegram_id, username, name) VALUES ($1, $2, $3) \
             ON CONFLICT (telegram_id) DO NOTHING RETURNING id",
        )
        .bind(user.telegram_id)
        .bind(&user.username)
        .bind(&user.name)
        .fetch_optional(&mut *tx)
        .await?;

        // Параллельная регистрация того же пользователя уже успела вставить строку.
        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return self.resolve(user.telegram_id).await?.ok_or(sqlx::Error::RowNotFound);
        };

        let photographer_id = match role {
            Role::Client => {
                sqlx::query("INSERT INTO client_profiles (user_id) VALUES ($1)")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                None
            }
            Role::Photographer => Some(
                sqlx::query_scalar::<_, i32>(
                    "INSERT INTO photographer_profiles (user_id, short_intro, bio) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(user_id)
                .bind(DEFAULT_SHORT_INTRO)
                .bind(DEFAULT_BIO)
                .fetch_one(&mut *tx)
                .await?,
            ),
        };
        tx.commit().await?;

        info!("registered user {} (telegram {}) as {:?}", user_id, user.telegram_id, role);
        Ok(Principal {
            user_id,
            telegram_id: user.telegram_id,
            name: user.name.clone(),
            username: user.username.clone(),
            photographer_id,
        })
    }

    /// Профиль клиента создаётся по требованию, как при первом входе в кабинет.
    pub async fn client_profile(&self, user_id: i32) -> Result<ClientProfile, sqlx::Error> {
        sqlx::query(
            "INSERT INTO client_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        sqlx::query_as::<_, ClientProfile>(
            "SELECT id, user_id, phone_number FROM client_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        field: ProfileField,
        value: ProfileValue,
    ) -> Result<(), sqlx::Error> {
        if field == ProfileField::Phone {
            self.client_profile(principal.user_id).await?;
        }
        let sql = field.update_sql();
        let query = sqlx::query(&sql);
        let query = match value {
            ProfileValue::Text(text) => query.bind(text),
            ProfileValue::Optional(text) => query.bind(text),
            ProfileValue::Number(number) => query.bind(number),
        };
        query.bind(principal.user_id).execute(&self.pool).await?;
        info!("user {} updated profile field {}", principal.user_id, field.as_str());
        Ok(())
    }

    pub async fn user_names(&self, ids: &[i32]) -> Result<HashMap<i32, String>, sqlx::Error> {
        let rows: Vec<(i32, String)> =
            sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn telegram_id_of_user(&self, user_id: i32) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT telegram_id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn telegram_id_of_photographer(
        &self,
        photographer_id: i32,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT u.telegram_id FROM photographer_profiles p \
             JOIN users u ON u.id = p.user_id WHERE p.id = $1",
        )
        .bind(photographer_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(photographer_id: Option<i32>) -> Principal {
        Principal {
            user_id: 1,
            telegram_id: 1,
            name: "Аня".into(),
            username: None,
            photographer_id,
        }
    }

    #[test]
    fn field_codes_parse_back() {
        for field in ProfileField::PHOTOGRAPHER.iter().chain(ProfileField::CLIENT.iter()) {
            assert_eq!(field.as_str().parse::<ProfileField>(), Ok(*field));
        }
        assert!("password".parse::<ProfileField>().is_err());
    }

    #[test]
    fn fields_depend_on_account_type() {
        let client = principal(None);
        let photographer = principal(Some(5));
        assert!(ProfileField::Phone.allowed_for(&client));
        assert!(!ProfileField::Price.allowed_for(&client));
        assert!(ProfileField::Price.allowed_for(&photographer));
        assert!(!ProfileField::Phone.allowed_for(&photographer));
        assert!(ProfileField::Name.allowed_for(&client));
        assert!(ProfileField::Name.allowed_for(&photographer));
    }

    #[test]
    fn values_are_validated_per_field() {
        assert_eq!(ProfileField::Price.parse_value("2500"), Ok(ProfileValue::Number(2500)));
        assert_eq!(ProfileField::Price.parse_value("-5"), Err(ValidationError::InvalidPrice));
        assert_eq!(
            ProfileField::Specialization.parse_value("Свадьба"),
            Ok(ProfileValue::Text("wedding".to_string()))
        );
        assert_eq!(
            ProfileField::Language.parse_value("English"),
            Ok(ProfileValue::Text("en".to_string()))
        );
        assert_eq!(ProfileField::City.parse_value(" - "), Ok(ProfileValue::Optional(None)));
        assert_eq!(
            ProfileField::City.parse_value("Казань"),
            Ok(ProfileValue::Optional(Some("Казань".to_string())))
        );
        assert_eq!(
            ProfileField::ShortIntro.parse_value(&"a".repeat(251)),
            Err(ValidationError::TooLong { max: 250 })
        );
        assert_eq!(ProfileField::Name.parse_value(""), Err(ValidationError::Empty));
    }

    #[test]
    fn update_targets_the_owning_table() {
        assert_eq!(ProfileField::Name.update_sql(), "UPDATE users SET name = $1 WHERE id = $2");
        assert_eq!(
            ProfileField::Phone.update_sql(),
            "UPDATE client_profiles SET phone_number = $1 WHERE user_id = $2"
        );
        assert_eq!(
            ProfileField::Price.update_sql(),
            "UPDATE photographer_profiles SET price = $1 WHERE user_id = $2"
        );
    }
}
