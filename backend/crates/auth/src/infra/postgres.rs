//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::{ProfileChanges, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    display_name::DisplayName, email::Email, person_name::PersonName,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    display_name,
    first_name,
    last_name,
    email,
    password_hash,
    active,
    avatar,
    rating,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> AuthResult<Option<User>> {
        // `column` is always one of the literals below, never user input.
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }
}

impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                display_name,
                first_name,
                last_name,
                email,
                password_hash,
                active,
                avatar,
                rating,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.display_name.as_str())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.active)
        .bind(user.avatar.as_deref())
        .bind(user.rating)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    let field = match db.constraint() {
                        Some("users_display_name_key") => "display_name",
                        _ => "email",
                    };
                    return AuthError::taken(field);
                }
            }
            AuthError::from(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.fetch_one_by("email", email.as_str()).await
    }

    async fn find_by_display_name(&self, display_name: &DisplayName) -> AuthResult<Option<User>> {
        self.fetch_one_by("display_name", display_name.as_str()).await
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY display_name");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn exists_by_display_name(&self, display_name: &DisplayName) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE display_name = $1)",
        )
        .bind(display_name.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        changes: &ProfileChanges,
    ) -> AuthResult<Option<User>> {
        // Absent fields keep their current value.
        let sql = format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                avatar = COALESCE($4, avatar),
                updated_at = $5
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(changes.first_name.as_ref().map(PersonName::as_str))
            .bind(changes.last_name.as_ref().map(PersonName::as_str))
            .bind(changes.avatar.as_deref())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn set_active(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET active = TRUE, updated_at = $2 WHERE user_id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(password.as_phc_string())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    display_name: String,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    active: bool,
    avatar: Option<String>,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            display_name: DisplayName::from_db(self.display_name),
            first_name: PersonName::from_db(self.first_name),
            last_name: PersonName::from_db(self.last_name),
            email: Email::from_db(self.email),
            password: UserPassword::from_db(self.password_hash)?,
            active: self.active,
            avatar: self.avatar,
            rating: self.rating,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
