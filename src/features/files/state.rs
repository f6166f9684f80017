use std::sync::Arc;

use crate::features::files::services::{CsvQueryService, FileService};

/// Shared state for the file routes
#[derive(Clone)]
pub struct FilesState {
    pub files: Arc<FileService>,
    pub csv: Arc<CsvQueryService>,
}

impl FilesState {
    pub fn new(files: Arc<FileService>, csv: Arc<CsvQueryService>) -> Self {
        Self { files, csv }
    }
}
