use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for uploaded files
///
/// `filename` doubles as the name of the file inside the upload directory.
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i32,
    pub filename: String,
    pub user_id: Option<i32>,
    pub create_date: DateTime<Utc>,
}
