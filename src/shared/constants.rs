/// Only files with this extension may be uploaded
pub const ALLOWED_EXTENSION: &str = ".csv";

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Extra body allowance on top of the configured upload size for multipart framing
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

// =============================================================================
// MESSAGES
// =============================================================================

pub const INVALID_JSON_FORMAT_MESSAGE: &str = "Invalid JSON format for filters";
pub const INVALID_FILE_EXTENSION_MESSAGE: &str = "Only files with the .csv extension are allowed";
pub const FORBIDDEN_MESSAGE: &str = "Forbidden";
