use sqlx::FromRow;

/// Database model for users
///
/// The table is owned by the authentication service; this crate only reads it
/// and inserts the bootstrap superuser.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// Values for a user row about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub is_superuser: bool,
}
