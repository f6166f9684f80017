//! Users as seen by the file endpoints.
//!
//! Registration and login live in the authentication service; this feature only
//! resolves token subjects to user rows and bootstraps the configured superuser.

pub mod models;
pub mod repositories;
pub mod services;

pub use repositories::PgUserRepository;
pub use services::UserService;
