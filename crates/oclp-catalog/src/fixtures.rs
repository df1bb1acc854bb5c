//! Pre-captured hardware dumps used in place of auto-detection.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::is_valid_identifier;
use crate::CatalogError;

/// One machine, either detected on the host or captured as a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Human label, unique within a fixture catalog (e.g. "MacPro3,1 Modern AMD")
    #[serde(default)]
    pub label: String,

    /// Identifier reported by the firmware
    pub real_model: String,

    /// Board identifier, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,

    /// GPU descriptors in slot order
    #[serde(default)]
    pub gpus: Vec<String>,

    /// Wireless chipset descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi: Option<String>,

    /// Whether an NVMe drive is installed
    #[serde(default)]
    pub nvme: bool,
}

impl HardwareProfile {
    /// Profile for a host whose model could not be determined.
    pub fn unknown() -> Self {
        Self::new("unknown")
    }

    /// Bare profile carrying only a model identifier.
    pub fn new(real_model: impl Into<String>) -> Self {
        let real_model = real_model.into();
        Self {
            label: real_model.clone(),
            real_model,
            board_id: None,
            gpus: Vec::new(),
            wifi: None,
            nvme: false,
        }
    }

    fn fixture(
        label: &str,
        real_model: &str,
        board_id: &str,
        gpus: &[&str],
        wifi: &str,
        nvme: bool,
    ) -> Self {
        Self {
            label: label.to_string(),
            real_model: real_model.to_string(),
            board_id: Some(board_id.to_string()),
            gpus: gpus.iter().map(|g| g.to_string()).collect(),
            wifi: Some(wifi.to_string()),
            nvme,
        }
    }
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self::unknown()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FixtureFile {
    #[serde(default, rename = "fixture")]
    fixtures: Vec<HardwareProfile>,
}

/// Ordered list of hardware fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCatalog {
    fixtures: Vec<HardwareProfile>,
}

impl FixtureCatalog {
    /// Build a catalog, rejecting duplicate labels and malformed identifiers.
    pub fn new(fixtures: Vec<HardwareProfile>) -> Result<Self, CatalogError> {
        if fixtures.is_empty() {
            return Err(CatalogError::Empty("fixture"));
        }

        let mut seen = HashSet::new();
        for fixture in &fixtures {
            if fixture.label.is_empty() {
                return Err(CatalogError::MissingField {
                    label: "(unlabelled)".to_string(),
                    field: "label".to_string(),
                });
            }
            if !is_valid_identifier(&fixture.real_model) {
                return Err(CatalogError::InvalidIdentifier(fixture.real_model.clone()));
            }
            if !seen.insert(fixture.label.as_str()) {
                return Err(CatalogError::DuplicateLabel(fixture.label.clone()));
            }
        }

        Ok(Self { fixtures })
    }

    /// The compiled-in regression dumps.
    pub fn builtin() -> Self {
        let fixtures = vec![
            HardwareProfile::fixture(
                "MacBookPro9,2 Stock",
                "MacBookPro9,2",
                "Mac-6F01561E16C75D06",
                &["Intel Ivy Bridge"],
                "Broadcom BCM4331",
                false,
            ),
            HardwareProfile::fixture(
                "iMac8,1 Stock",
                "iMac8,1",
                "Mac-F227BEC8",
                &["ATI RV630"],
                "Atheros AR5418",
                false,
            ),
            HardwareProfile::fixture(
                "iMac11,2 Stock",
                "iMac11,2",
                "Mac-F2238AC8",
                &["ATI Juniper"],
                "Atheros AR9280",
                false,
            ),
            HardwareProfile::fixture(
                "iMac12,2 Upgraded",
                "iMac12,2",
                "Mac-942B59F58194171B",
                &["Intel Sandy Bridge", "AMD Polaris"],
                "Broadcom BCM94360",
                false,
            ),
            HardwareProfile::fixture(
                "MacPro3,1 Stock",
                "MacPro3,1",
                "Mac-F42C88C8",
                &["ATI RV630"],
                "Atheros AR5418",
                false,
            ),
            HardwareProfile::fixture(
                "MacPro3,1 Upgraded",
                "MacPro3,1",
                "Mac-F42C88C8",
                &["AMD TeraScale 2"],
                "Broadcom BCM94360",
                false,
            ),
            HardwareProfile::fixture(
                "MacPro3,1 Modern AMD",
                "MacPro3,1",
                "Mac-F42C88C8",
                &["AMD Polaris"],
                "Broadcom BCM94360",
                true,
            ),
            HardwareProfile::fixture(
                "MacPro3,1 Modern Kepler",
                "MacPro3,1",
                "Mac-F42C88C8",
                &["Nvidia Kepler"],
                "Broadcom BCM94360",
                true,
            ),
            HardwareProfile::fixture(
                "MacPro4,1 Upgraded",
                "MacPro4,1",
                "Mac-F221BEC8",
                &["AMD TeraScale 2"],
                "Broadcom BCM94322",
                false,
            ),
            HardwareProfile::fixture(
                "MacPro4,1 Modern AMD",
                "MacPro4,1",
                "Mac-F221BEC8",
                &["AMD Polaris"],
                "Broadcom BCM94360",
                true,
            ),
            HardwareProfile::fixture(
                "MacPro4,1/5,1 Flashed Modern AMD",
                "MacPro5,1",
                "Mac-F221BEC8",
                &["AMD Polaris"],
                "Broadcom BCM94360",
                true,
            ),
        ];
        Self { fixtures }
    }

    /// Load replacement fixtures from a TOML file of `[[fixture]]` tables
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: FixtureFile = toml::from_str(content)?;
        Self::new(file.fixtures)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HardwareProfile> {
        self.fixtures.iter()
    }

    pub fn get(&self, label: &str) -> Option<&HardwareProfile> {
        self.fixtures.iter().find(|f| f.label == label)
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_passes_validation() {
        let builtin = FixtureCatalog::builtin();
        assert_eq!(builtin.len(), 11);
        let revalidated = FixtureCatalog::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(revalidated, builtin);
    }

    #[test]
    fn test_builtin_order() {
        let labels: Vec<_> = FixtureCatalog::builtin()
            .iter()
            .map(|f| f.real_model.clone())
            .take(4)
            .collect();
        assert_eq!(labels, vec!["MacBookPro9,2", "iMac8,1", "iMac11,2", "iMac12,2"]);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let a = HardwareProfile::new("MacPro3,1");
        let b = HardwareProfile::new("MacPro3,1");
        let err = FixtureCatalog::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLabel(ref l) if l == "MacPro3,1"));
    }

    #[test]
    fn test_parse_fixture_file() {
        let catalog = FixtureCatalog::parse(
            r#"
[[fixture]]
label = "Lab iMac"
real_model = "iMac11,3"
gpus = ["ATI Juniper"]

[[fixture]]
label = "Lab Mac Pro"
real_model = "MacPro5,1"
nvme = true
"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let mac_pro = catalog.get("Lab Mac Pro").unwrap();
        assert!(mac_pro.nvme);
        assert!(mac_pro.board_id.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_model() {
        let result = FixtureCatalog::parse(
            r#"
[[fixture]]
label = "Broken"
real_model = "iMac"
"#,
        );
        assert!(matches!(result, Err(CatalogError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_unknown_profile() {
        let profile = HardwareProfile::unknown();
        assert_eq!(profile.real_model, "unknown");
        assert!(profile.gpus.is_empty());
    }
}
