//! User repository for database operations
//!
//! PostgreSQL implementation of [`UserStore`]. Username uniqueness is backed
//! by the `users_username_key` constraint, so a lost insert race surfaces as
//! [`UserStoreError::UsernameAlreadyExists`] rather than a raw database error.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{NewUser, User};
use crate::core::db::store::{UserStore, UserStoreError};

/// Map an insert failure, recognising the username unique constraint
fn map_insert_error(err: sqlx::Error) -> UserStoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return UserStoreError::UsernameAlreadyExists;
    }
    UserStoreError::DatabaseError(err)
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, sex, age, weight, height,
                   activity_level, plan, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, sex, age, weight, height,
                   activity_level, plan, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let user = user.into_user();

        let stored = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, sex, age, weight, height,
                               activity_level, plan, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, username, password_hash, sex, age, weight, height,
                      activity_level, plan, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.profile.sex)
        .bind(user.profile.age)
        .bind(user.profile.weight)
        .bind(user.profile.height)
        .bind(&user.profile.activity_level)
        .bind(&user.profile.plan)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(stored)
    }
}
