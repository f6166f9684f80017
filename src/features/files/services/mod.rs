mod csv_query_service;
mod file_service;

pub use csv_query_service::{parse_filters, CsvQueryService};
pub use file_service::FileService;
