//! Storage module for file management
//!
//! Provides the local upload directory where raw CSV files live.

mod local_storage;

pub use local_storage::LocalStorage;
