use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub is_superuser: bool,
}

impl AuthenticatedUser {
    /// Superusers may see and act on every user's files
    pub fn can_access(&self, owner_id: Option<i32>) -> bool {
        self.is_superuser || owner_id == Some(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub aud: String,
    pub exp: u64,
}
