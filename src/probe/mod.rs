//! Hardware defaults probing
//!
//! A prober fills in hardware-appropriate defaults for a model. The shipped
//! [`TableProber`] is data-driven: it overlays per-model (and, for real
//! hardware, host-specific) tables from the app config onto the current
//! settings using the same deep-merge rules as the config layers.

use std::collections::BTreeMap;
use std::process::Command;

use oclp_catalog::HardwareProfile;
use serde_json::Value;

use crate::config::merge_layers;
use crate::settings::Settings;

/// Environment variable that replaces host model detection
pub const HOST_MODEL_ENV: &str = "OCLP_HOST_MODEL";

/// Settings keys an overlay may not touch; they belong to the resolver and
/// harness.
pub const RESERVED_KEYS: &[&str] = &["custom_model", "computer", "validate"];

/// Source of hardware-appropriate defaults
pub trait DefaultsProber {
    /// Return `settings` with defaults for `model` applied. `is_real` is true
    /// when the model was detected on this machine rather than requested.
    fn probe(&self, model: &str, is_real: bool, settings: &Settings)
        -> Result<Settings, ProbeError>;
}

/// Probing errors
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("overlay for '{model}' must be a table, got {kind}")]
    NotATable { model: String, kind: &'static str },

    #[error("overlay for '{model}' sets reserved key '{key}'")]
    ReservedKey { model: String, key: String },

    #[error("overlay for '{model}' does not fit settings: {source}")]
    Invalid {
        model: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("overlay for '{model}' leaves opencore_debug and opencore_build disagreeing")]
    InconsistentDebug { model: String },
}

/// Overlay tables keyed by model identifier, plus an optional host table
#[derive(Debug, Clone, Default)]
pub struct TableProber {
    models: BTreeMap<String, Value>,
    host: Option<Value>,
}

impl TableProber {
    /// Build a prober, checking every overlay up front.
    pub fn new(models: BTreeMap<String, Value>, host: Option<Value>) -> Result<Self, ProbeError> {
        for (model, overlay) in &models {
            check_overlay(model, overlay)?;
        }
        if let Some(ref overlay) = host {
            check_overlay("host", overlay)?;
        }
        Ok(Self { models, host })
    }
}

impl DefaultsProber for TableProber {
    fn probe(
        &self,
        model: &str,
        is_real: bool,
        settings: &Settings,
    ) -> Result<Settings, ProbeError> {
        let base = serde_json::to_value(settings).map_err(|e| ProbeError::Invalid {
            model: model.to_string(),
            source: e,
        })?;

        let mut layers = vec![base];
        if let Some(overlay) = self.models.get(model) {
            tracing::debug!(model, "applying model overlay");
            layers.push(overlay.clone());
        }
        if is_real {
            if let Some(ref overlay) = self.host {
                tracing::debug!(model, "applying host overlay");
                layers.push(overlay.clone());
            }
        }

        let probed: Settings =
            serde_json::from_value(merge_layers(layers)).map_err(|e| ProbeError::Invalid {
                model: model.to_string(),
                source: e,
            })?;
        check_debug_pair(model, &probed)?;
        Ok(probed)
    }
}

/// `opencore_build` must be DEBUG exactly when `opencore_debug` is set.
fn check_debug_pair(model: &str, settings: &Settings) -> Result<(), ProbeError> {
    if settings.debug_consistent() {
        Ok(())
    } else {
        Err(ProbeError::InconsistentDebug {
            model: model.to_string(),
        })
    }
}

fn check_overlay(model: &str, overlay: &Value) -> Result<(), ProbeError> {
    let Value::Object(map) = overlay else {
        return Err(ProbeError::NotATable {
            model: model.to_string(),
            kind: value_kind(overlay),
        });
    };

    if let Some(key) = RESERVED_KEYS.iter().find(|k| map.contains_key(**k)) {
        return Err(ProbeError::ReservedKey {
            model: model.to_string(),
            key: key.to_string(),
        });
    }

    // Dry run against defaults so typos surface at load time
    let merged = merge_layers(vec![
        serde_json::to_value(Settings::default()).map_err(|e| ProbeError::Invalid {
            model: model.to_string(),
            source: e,
        })?,
        overlay.clone(),
    ]);
    let settings: Settings = serde_json::from_value(merged).map_err(|e| ProbeError::Invalid {
        model: model.to_string(),
        source: e,
    })?;
    check_debug_pair(model, &settings)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

/// Detect the host machine.
///
/// `OCLP_HOST_MODEL` takes precedence; otherwise `sysctl -n hw.model` is
/// consulted. Anything else yields an `unknown` profile.
pub fn detect_host_profile() -> HardwareProfile {
    if let Ok(model) = std::env::var(HOST_MODEL_ENV) {
        let model = model.trim();
        if !model.is_empty() {
            return HardwareProfile::new(model);
        }
    }

    match Command::new("sysctl").args(["-n", "hw.model"]).output() {
        Ok(output) if output.status.success() => {
            let model = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if model.is_empty() {
                HardwareProfile::unknown()
            } else {
                HardwareProfile::new(model)
            }
        }
        _ => HardwareProfile::unknown(),
    }
}
