//! Authorization guards for the application.
//!
//! These guards extract the authenticated user inserted by the auth middleware
//! and verify it is allowed to reach the handler.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for checking if user is a superuser.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireSuperuser(user): RequireSuperuser) { ... }
/// ```
pub struct RequireSuperuser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireSuperuser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_superuser {
            return Err(AppError::Forbidden("Superuser access required".to_string()));
        }

        Ok(RequireSuperuser(user.clone()))
    }
}
