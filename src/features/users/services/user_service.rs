use std::sync::Arc;
use tracing::{debug, info};

use crate::core::config::SuperuserConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::models::NewUser;
use crate::features::users::repositories::UserRepository;
use crate::shared::password::hash_password;

/// Resolves token subjects to users and bootstraps the superuser
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Load the user behind a validated token
    ///
    /// Unknown and inactive users are both rejected as unauthenticated.
    pub async fn authenticate(&self, user_id: i32) -> Result<AuthenticatedUser> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        if !user.is_active {
            debug!("Rejected inactive user: id={}", user.id);
            return Err(AppError::Unauthorized("Inactive user".to_string()));
        }

        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
            is_superuser: user.is_superuser,
        })
    }

    /// Create the configured superuser unless a user with that email exists
    ///
    /// Returns true when a new user was inserted. Does nothing without a
    /// configured password.
    pub async fn ensure_superuser(&self, config: &SuperuserConfig) -> Result<bool> {
        let Some(password) = config.password.as_deref() else {
            debug!("No superuser password configured, skipping bootstrap");
            return Ok(false);
        };

        if self
            .repository
            .find_by_email(&config.email)
            .await?
            .is_some()
        {
            debug!("Superuser {} already exists", config.email);
            return Ok(false);
        }

        let user = self
            .repository
            .create(NewUser {
                email: config.email.clone(),
                hashed_password: hash_password(password)?,
                is_superuser: true,
            })
            .await?;

        info!("Superuser created: id={}, email={}", user.id, user.email);
        Ok(true)
    }
}
