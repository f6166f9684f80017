use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message envelope returned by mutating endpoints and by every error
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
