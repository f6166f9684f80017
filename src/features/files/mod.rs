//! Uploaded CSV files: metadata records, storage on disk and row queries.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod validators;

pub use repositories::PgFileRepository;
pub use routes::routes;
pub use services::{CsvQueryService, FileService};
pub use state::FilesState;
