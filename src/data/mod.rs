//! Data module - CSV loading and the source column schema

pub mod columns;
mod loader;

pub use loader::{parse_records, CaseLoader, LoaderError, DATE_FORMAT};
