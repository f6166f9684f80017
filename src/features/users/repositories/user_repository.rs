use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::users::models::{NewUser, User};

/// Read access to users plus the insert needed for superuser bootstrap
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, user: NewUser) -> Result<User>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, is_active, is_superuser, is_verified
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, is_active, is_superuser, is_verified
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password, is_active, is_superuser, is_verified)
            VALUES ($1, $2, TRUE, $3, TRUE)
            RETURNING id, email, hashed_password, is_active, is_superuser, is_verified
            "#,
        )
        .bind(user.email)
        .bind(user.hashed_password)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
