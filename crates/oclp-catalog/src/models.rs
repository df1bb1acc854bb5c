//! Supported-model catalog.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Hardware identifiers eligible for unmodified support, in sweep order.
pub const SUPPORTED_MODELS: &[&str] = &[
    "MacBook4,1",
    "MacBook5,1",
    "MacBook5,2",
    "MacBook6,1",
    "MacBook7,1",
    "MacBook8,1",
    "MacBookAir2,1",
    "MacBookAir3,1",
    "MacBookAir3,2",
    "MacBookAir4,1",
    "MacBookAir4,2",
    "MacBookAir5,1",
    "MacBookAir5,2",
    "MacBookAir6,1",
    "MacBookAir6,2",
    "MacBookAir7,1",
    "MacBookAir7,2",
    "MacBookPro4,1",
    "MacBookPro5,1",
    "MacBookPro5,2",
    "MacBookPro5,3",
    "MacBookPro5,4",
    "MacBookPro5,5",
    "MacBookPro6,1",
    "MacBookPro6,2",
    "MacBookPro7,1",
    "MacBookPro8,1",
    "MacBookPro8,2",
    "MacBookPro8,3",
    "MacBookPro9,1",
    "MacBookPro9,2",
    "MacBookPro10,1",
    "MacBookPro10,2",
    "MacBookPro11,1",
    "MacBookPro11,2",
    "MacBookPro11,3",
    "MacBookPro11,4",
    "MacBookPro11,5",
    "MacBookPro12,1",
    "MacBookPro13,1",
    "MacBookPro13,2",
    "MacBookPro13,3",
    "Macmini3,1",
    "Macmini4,1",
    "Macmini5,1",
    "Macmini5,2",
    "Macmini5,3",
    "Macmini6,1",
    "Macmini6,2",
    "Macmini7,1",
    "iMac7,1",
    "iMac8,1",
    "iMac9,1",
    "iMac10,1",
    "iMac11,1",
    "iMac11,2",
    "iMac11,3",
    "iMac12,1",
    "iMac12,2",
    "iMac13,1",
    "iMac13,2",
    "iMac13,3",
    "iMac14,1",
    "iMac14,2",
    "iMac14,3",
    "iMac14,4",
    "iMac15,1",
    "iMac16,1",
    "iMac16,2",
    "iMac17,1",
    "MacPro3,1",
    "MacPro4,1",
    "MacPro5,1",
    "MacPro6,1",
    "Xserve2,1",
    "Xserve3,1",
    "Dortania1,1",
];

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z]+[0-9]+,[0-9]+$";

/// Returns true when `identifier` looks like `Family<major>,<minor>`.
pub fn is_valid_identifier(identifier: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"))
        .is_match(identifier)
}

/// On-disk shape of a replacement model list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    #[serde(default)]
    models: Vec<String>,
}

/// Ordered, de-duplicated list of supported hardware identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedModelCatalog {
    models: Vec<String>,
}

impl SupportedModelCatalog {
    /// Build a catalog, dropping repeated identifiers but keeping first-seen order.
    pub fn new<I, S>(models: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for model in models {
            let model = model.into();
            if !is_valid_identifier(&model) {
                return Err(CatalogError::InvalidIdentifier(model));
            }
            if seen.insert(model.clone()) {
                ordered.push(model);
            }
        }

        if ordered.is_empty() {
            return Err(CatalogError::Empty("supported model"));
        }

        Ok(Self { models: ordered })
    }

    /// The compiled-in list.
    pub fn builtin() -> Self {
        Self {
            models: SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Load a replacement list from a TOML file with a top-level `models` array
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a replacement list from TOML text
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: ModelFile = toml::from_str(content)?;
        Self::new(file.models)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
