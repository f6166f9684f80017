use axum::extract::multipart::Field;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{FileCreateDto, FileResponseDto};
use crate::features::files::models::File;
use crate::features::files::repositories::FileRepository;
use crate::features::files::validators::{
    check_file_access_and_existence, check_upload_file, duplicate_filename_message,
};
use crate::modules::storage::LocalStorage;

/// Service for file metadata and the files behind it
pub struct FileService {
    repository: Arc<dyn FileRepository>,
    storage: Arc<LocalStorage>,
}

impl FileService {
    pub fn new(repository: Arc<dyn FileRepository>, storage: Arc<LocalStorage>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    /// Every file of every user
    pub async fn list_all(&self) -> Result<Vec<FileResponseDto>> {
        let files = self.repository.get_multi(None).await?;
        Ok(files.into_iter().map(Into::into).collect())
    }

    /// Files uploaded by `user`
    pub async fn list_owned(&self, user: &AuthenticatedUser) -> Result<Vec<FileResponseDto>> {
        let files = self.repository.get_multi(Some(user)).await?;
        Ok(files.into_iter().map(Into::into).collect())
    }

    /// Resolve a filename to a record `user` may read
    pub async fn get_accessible_by_name(
        &self,
        filename: &str,
        user: &AuthenticatedUser,
    ) -> Result<File> {
        let file = self.repository.get_by_filename(filename).await?;
        check_file_access_and_existence(file, user, filename)
    }

    /// Stream an uploaded CSV into the upload directory and record it
    ///
    /// # Arguments
    /// * `user` - The uploading user, recorded as owner
    /// * `filename` - Name from the multipart part, used as-is on disk
    /// * `field` - The multipart part carrying the file body
    ///
    /// The disk file is written first and only kept once its row is recorded.
    /// A failed insert, a broken stream or an abandoned request all remove it.
    pub async fn upload_file(
        &self,
        user: &AuthenticatedUser,
        filename: &str,
        field: Field<'_>,
    ) -> Result<FileResponseDto> {
        let input = FileCreateDto {
            filename: filename.to_string(),
        };
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        check_upload_file(filename, &self.storage.path_for(filename)).await?;

        let mut out = match self.storage.create_new(filename).await {
            Ok(out) => out,
            // lost a race with a concurrent upload of the same name
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::BadRequest(duplicate_filename_message(filename)));
            }
            Err(e) => return Err(e.into()),
        };
        let pending = self.storage.pending(filename);

        let size = write_field(&mut out, field).await?;
        drop(out);
        debug!("File written to disk: {} ({} bytes)", filename, size);

        let file = self
            .repository
            .create(input, Some(user))
            .await
            .inspect_err(|_| warn!("Recording {} failed, removing written file", filename))?;
        pending.commit();

        info!(
            "File uploaded: id={}, filename={}, user_id={}, size={}",
            file.id, file.filename, user.id, size
        );

        Ok(file.into())
    }

    /// Delete a file record and its disk file
    ///
    /// Only the owner or a superuser may delete. A disk file that is already
    /// gone does not fail the request.
    pub async fn delete_file(&self, file_id: i32, user: &AuthenticatedUser) -> Result<File> {
        let file = self.repository.get(file_id).await?;
        let file = check_file_access_and_existence(file, user, &file_id.to_string())?;

        let file = self.repository.remove(file).await?;

        if !self.storage.delete_if_exists(&file.filename).await? {
            warn!(
                "File {} had no disk file at {}",
                file.filename,
                self.storage.path_for(&file.filename).display()
            );
        }

        info!(
            "File deleted: id={}, filename={}, by user_id={}",
            file.id, file.filename, user.id
        );

        Ok(file)
    }
}

/// Copy the multipart body into `out` chunk by chunk
async fn write_field(out: &mut fs::File, mut field: Field<'_>) -> Result<u64> {
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    out.flush().await?;
    Ok(size)
}
