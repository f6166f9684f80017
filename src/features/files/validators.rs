//! Pre-condition checks run by the file handlers before touching storage.

use std::path::Path;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::models::File;
use crate::shared::constants::{
    ALLOWED_EXTENSION, FORBIDDEN_MESSAGE, INVALID_FILE_EXTENSION_MESSAGE,
};
use crate::shared::validation::is_safe_filename;

/// Reject uploads that are not `.csv` or whose target already exists on disk
///
/// The extension is checked first, so a duplicate non-CSV name reports the
/// extension problem.
pub async fn check_upload_file(filename: &str, target_path: &Path) -> Result<()> {
    if !filename.ends_with(ALLOWED_EXTENSION) {
        return Err(AppError::BadRequest(
            INVALID_FILE_EXTENSION_MESSAGE.to_string(),
        ));
    }

    if !is_safe_filename(filename) {
        return Err(AppError::BadRequest(format!(
            "Invalid filename '{}'",
            filename
        )));
    }

    if tokio::fs::try_exists(target_path).await? {
        return Err(AppError::BadRequest(duplicate_filename_message(filename)));
    }

    Ok(())
}

/// Unwrap `file`, requiring it to exist and be visible to `user`
///
/// Existence is checked before ownership, so callers cannot probe for other
/// users' filenames through a 403.
pub fn check_file_access_and_existence(
    file: Option<File>,
    user: &AuthenticatedUser,
    name: &str,
) -> Result<File> {
    let file = file.ok_or_else(|| AppError::NotFound(file_not_found_message(name)))?;

    if !user.can_access(file.user_id) {
        return Err(AppError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
    }

    Ok(file)
}

pub fn duplicate_filename_message(filename: &str) -> String {
    format!("File with name {} has already been uploaded", filename)
}

pub fn file_not_found_message(filename: &str) -> String {
    format!("File {} not found", filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i32, is_superuser: bool) -> AuthenticatedUser {
        AuthenticatedUser {
            id,
            email: format!("user{}@example.com", id),
            is_superuser,
        }
    }

    fn file_owned_by(user_id: i32) -> File {
        File {
            id: 1,
            filename: "data.csv".to_string(),
            user_id: Some(user_id),
            create_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_non_csv_extension() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["data.txt", "data.csv.bak", "data", "data.CSV"] {
            let err = check_upload_file(name, &tmp.path().join(name))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_FILE_EXTENSION_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_upload_extension_checked_before_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("data.txt");
        std::fs::write(&target, "x").unwrap();

        let err = check_upload_file("data.txt", &target).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_FILE_EXTENSION_MESSAGE));
    }

    #[tokio::test]
    async fn test_upload_rejects_existing_file_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("data.csv");
        std::fs::write(&target, "a\n1\n").unwrap();

        let err = check_upload_file("data.csv", &target).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if *m == duplicate_filename_message("data.csv")));
    }

    #[tokio::test]
    async fn test_upload_rejects_path_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = check_upload_file("../evil.csv", &tmp.path().join("../evil.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_upload_accepts_new_csv() {
        let tmp = tempfile::tempdir().unwrap();
        check_upload_file("data.csv", &tmp.path().join("data.csv"))
            .await
            .unwrap();
    }

    #[test]
    fn test_access_missing_file_is_not_found() {
        let err = check_file_access_and_existence(None, &user(1, true), "data.csv").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "File data.csv not found"));
    }

    #[test]
    fn test_access_owner_and_superuser_allowed() {
        assert!(check_file_access_and_existence(Some(file_owned_by(1)), &user(1, false), "x").is_ok());
        assert!(check_file_access_and_existence(Some(file_owned_by(1)), &user(2, true), "x").is_ok());
    }

    #[test]
    fn test_access_other_user_forbidden() {
        let err = check_file_access_and_existence(Some(file_owned_by(1)), &user(2, false), "x")
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
