//! Catalogue sources and configuration for algobind.
//!
//! The kernel only knows the [`CatalogSource`](algobind_kernel::CatalogSource)
//! trait. This crate supplies the concrete sources the command line and
//! embedders use, plus the `algobind.toml` configuration file.

pub mod config;
pub mod source;

pub use config::{BindTarget, CONFIG_FILE_NAME, Config, load_config};
pub use source::{JsonFileSource, StaticSource, ThreadedSource, populate_async};

use algobind_kernel::FetchError;
use std::path::PathBuf;

/// Errors from reading catalogue files and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse catalogue {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("no tokio runtime available for background fetches")]
    NoRuntime,
}

impl From<CatalogError> for FetchError {
    fn from(err: CatalogError) -> Self {
        FetchError::new(err.to_string())
    }
}
