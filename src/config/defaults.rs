//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::settings::{DEFAULT_OCVALIDATE_PATH, DEFAULT_RELEASE_FOLDER};
use crate::timeout::DEFAULT_VALIDATOR_TIMEOUT_SECONDS;

/// Values used when no config file says otherwise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Log filter (default: "info")
    pub log_level: String,

    /// ocvalidate binary (default: payloads/OpenCore/ocvalidate)
    pub ocvalidate_path: String,

    /// OpenCore build output (default: Build-Folder/OpenCore-Build)
    pub release_folder: String,

    /// Validator bound in seconds (default: 300)
    pub validator_timeout_seconds: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ocvalidate_path: DEFAULT_OCVALIDATE_PATH.to_string(),
            release_folder: DEFAULT_RELEASE_FOLDER.to_string(),
            validator_timeout_seconds: DEFAULT_VALIDATOR_TIMEOUT_SECONDS,
        }
    }
}

impl BuiltinDefaults {
    /// Layer-shaped JSON for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "log_level": self.log_level,
            "paths": {
                "ocvalidate": self.ocvalidate_path,
                "release_folder": self.release_folder
            },
            "validator": {
                "timeout_seconds": self.validator_timeout_seconds
            },
            "builder": {
                "command": []
            },
            "sys_patch": {
                "command": []
            },
            "catalog": {},
            "settings": {},
            "probe": {
                "models": {}
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.log_level, "info");
        assert_eq!(defaults.validator_timeout_seconds, 300);
        assert_eq!(defaults.ocvalidate_path, "payloads/OpenCore/ocvalidate");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["paths"]["release_folder"], "Build-Folder/OpenCore-Build");
        assert_eq!(value["validator"]["timeout_seconds"], 300);
        assert!(value["builder"]["command"].as_array().unwrap().is_empty());
    }
}
