use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::core::error::AppError;
use crate::core::extractor::AppQuery;
use crate::features::auth::guards::RequireSuperuser;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{DataRowDto, FileDataQuery, FileResponseDto, UploadFileDto};
use crate::features::files::services::parse_filters;
use crate::features::files::state::FilesState;
use crate::shared::constants::UPLOAD_FIELD_NAME;
use crate::shared::types::DetailResponse;

/// List every uploaded file
///
/// Superuser only.
#[utoipa::path(
    get,
    path = "/file/files/",
    tag = "files",
    responses(
        (status = 200, description = "All file records", body = Vec<FileResponseDto>),
        (status = 401, description = "Authentication required", body = DetailResponse),
        (status = 403, description = "Superuser access required", body = DetailResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    RequireSuperuser(_user): RequireSuperuser,
    State(state): State<FilesState>,
) -> Result<Json<Vec<FileResponseDto>>, AppError> {
    let files = state.files.list_all().await?;
    Ok(Json(files))
}

/// List the files uploaded by the current user
#[utoipa::path(
    get,
    path = "/file/my/files/",
    tag = "files",
    responses(
        (status = 200, description = "File records owned by the caller", body = Vec<FileResponseDto>),
        (status = 401, description = "Authentication required", body = DetailResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_my_files(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
) -> Result<Json<Vec<FileResponseDto>>, AppError> {
    let files = state.files.list_owned(&user).await?;
    Ok(Json(files))
}

/// Read the rows of an uploaded CSV
///
/// `filters` is a JSON object of column/value pairs that rows must equal.
/// `sort_by` names the column to sort ascending by.
#[utoipa::path(
    get,
    path = "/file/data/{file_name}/",
    tag = "files",
    params(
        ("file_name" = String, Path, description = "Name of the uploaded file"),
        FileDataQuery
    ),
    responses(
        (status = 200, description = "Matching rows as column/value objects", body = Vec<DataRowDto>),
        (status = 400, description = "Malformed filters or unknown column", body = DetailResponse),
        (status = 401, description = "Authentication required", body = DetailResponse),
        (status = 403, description = "File belongs to another user", body = DetailResponse),
        (status = 404, description = "File not found", body = DetailResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file_data(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    Path(file_name): Path<String>,
    AppQuery(query): AppQuery<FileDataQuery>,
) -> Result<Json<Vec<DataRowDto>>, AppError> {
    let file = state.files.get_accessible_by_name(&file_name, &user).await?;
    let filters = parse_filters(query.filters.as_deref())?;

    let rows = state
        .csv
        .filter_and_sort_csv(&file.filename, filters, query.sort_by)
        .await?;

    debug!("Returning {} rows from {}", rows.len(), file.filename);
    Ok(Json(rows))
}

/// Upload a CSV file
///
/// Accepts multipart/form-data with a single `file` part. The part's
/// filename becomes the stored name.
#[utoipa::path(
    post,
    path = "/file/upload/",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "CSV file to upload",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = DetailResponse),
        (status = 400, description = "Not a CSV, duplicate name or malformed upload", body = DetailResponse),
        (status = 401, description = "Authentication required", body = DetailResponse),
        (status = 413, description = "File too large", body = DetailResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DetailResponse>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::from(e)
    })? {
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            debug!("Ignoring unknown field: {:?}", field.name());
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Filename is required".to_string()))?;

        let file = state.files.upload_file(&user, &filename, field).await?;

        return Ok((
            StatusCode::CREATED,
            Json(DetailResponse::new(format!(
                "File '{}' uploaded successfully",
                file.filename
            ))),
        ));
    }

    Err(AppError::BadRequest("File is required".to_string()))
}

/// Delete an uploaded file
///
/// Only the owner or a superuser can delete it.
#[utoipa::path(
    delete,
    path = "/file/delete/{file_id}/",
    tag = "files",
    params(
        ("file_id" = i32, Path, description = "File record id")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = DetailResponse),
        (status = 401, description = "Authentication required", body = DetailResponse),
        (status = 403, description = "File belongs to another user", body = DetailResponse),
        (status = 404, description = "File not found", body = DetailResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    Path(file_id): Path<i32>,
) -> Result<Json<DetailResponse>, AppError> {
    let file = state.files.delete_file(file_id, &user).await?;

    Ok(Json(DetailResponse::new(format!(
        "File '{}' deleted successfully",
        file.filename
    ))))
}
