use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::files::models::File;

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The CSV file to upload
    #[schema(format = Binary, content_media_type = "text/csv")]
    pub file: String,
}

/// Input for creating a file record
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FileCreateDto {
    #[validate(length(min = 1, max = 255, message = "filename must be 1-255 characters"))]
    pub filename: String,
}

/// Response DTO for file metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: i32,
    /// Original filename as uploaded
    pub filename: String,
    /// Timestamp when the file was uploaded
    pub create_date: DateTime<Utc>,
    /// Owner of the file
    pub user_id: Option<i32>,
}

impl From<File> for FileResponseDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            create_date: file.create_date,
            user_id: file.user_id,
        }
    }
}

/// Query params for reading a file's rows
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileDataQuery {
    /// JSON object mapping column name to the value it must equal,
    /// e.g. `{"city": "Moscow", "year": 2020}`
    pub filters: Option<String>,
    /// Column to sort by (ascending); a comma-separated list sorts by several
    pub sort_by: Option<String>,
}

/// One CSV row as a column -> value object, in file column order
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct DataRowDto(pub serde_json::Map<String, serde_json::Value>);
