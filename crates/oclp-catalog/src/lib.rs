//! Hardware catalogs for the OpenCore validation harness.
//!
//! Two read-only, ordered catalogs drive the regression sweep:
//! - [`SupportedModelCatalog`]: hardware identifiers eligible for
//!   unmodified support
//! - [`FixtureCatalog`]: pre-captured [`HardwareProfile`] dumps that stand in
//!   for auto-detection
//!
//! Both ship with built-in data and can be replaced from a TOML file.

mod fixtures;
mod models;

pub use fixtures::{FixtureCatalog, HardwareProfile};
pub use models::{is_valid_identifier, SupportedModelCatalog, SUPPORTED_MODELS};

use std::path::PathBuf;

/// Errors raised while loading or validating a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Catalog file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid hardware identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Duplicate fixture label: '{0}'")]
    DuplicateLabel(String),

    #[error("Fixture '{label}': missing required field '{field}'")]
    MissingField { label: String, field: String },

    #[error("{0} catalog is empty")]
    Empty(&'static str),
}
