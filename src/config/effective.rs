//! Effective configuration with provenance
//!
//! Captures the merged configuration, the typed view of it, and where each
//! contributing layer came from.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::probe::{ProbeError, TableProber};
use crate::settings::Settings;
use crate::timeout::TimeoutConfig;
use oclp_catalog::{CatalogError, FixtureCatalog, HardwareProfile, SupportedModelCatalog};

/// Schema identifier for serialized effective configs
pub const SCHEMA_ID: &str = "oclp/effective_config@1";

/// Local config file picked up from the working directory
pub const LOCAL_CONFIG_FILE: &str = "oclp.toml";

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Local,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// `[paths]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub ocvalidate: PathBuf,
    pub release_folder: PathBuf,
}

/// `[validator]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    pub timeout_seconds: u64,
}

/// `[builder]` and `[sys_patch]`: an argv to run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

impl CommandConfig {
    pub fn is_configured(&self) -> bool {
        !self.command.is_empty()
    }
}

/// `[catalog]`: optional replacement catalog files
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    #[serde(default)]
    pub models_file: Option<PathBuf>,
    #[serde(default)]
    pub fixtures_file: Option<PathBuf>,
}

/// `[probe]`: overlay tables for the defaults prober
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    #[serde(default)]
    pub models: BTreeMap<String, Value>,
    #[serde(default)]
    pub host: Option<Value>,
}

/// Typed view of the merged layers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub log_level: String,
    pub paths: PathsConfig,
    pub validator: ValidatorConfig,
    pub builder: CommandConfig,
    pub sys_patch: CommandConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Overrides applied to the settings before resolution
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Where to write the harness report, if anywhere
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig::from_config(Some(self.validator.timeout_seconds))
    }

    /// Settings before resolution: paths from `[paths]`, then the `[settings]`
    /// table merged on top.
    pub fn initial_settings(&self, computer: HardwareProfile) -> Result<Settings, ConfigError> {
        let base = Settings {
            ocvalidate_path: self.paths.ocvalidate.clone(),
            opencore_release_folder: self.paths.release_folder.clone(),
            ..Settings::for_computer(computer)
        };

        let overrides = match &self.settings {
            Value::Null => return Ok(base),
            Value::Object(map) if map.is_empty() => return Ok(base),
            Value::Object(map) => {
                if map.contains_key("computer") {
                    return Err(ConfigError::ValidationError(
                        "[settings] may not set 'computer'; it is detected".to_string(),
                    ));
                }
                self.settings.clone()
            }
            _ => {
                return Err(ConfigError::ValidationError(
                    "[settings] must be a table".to_string(),
                ))
            }
        };

        let base_value = serde_json::to_value(&base)
            .map_err(|e| ConfigError::ParseError(format!("settings: {}", e)))?;
        let settings: Settings = serde_json::from_value(merge_layers(vec![base_value, overrides]))
            .map_err(|e| ConfigError::ValidationError(format!("[settings]: {}", e)))?;
        if !settings.debug_consistent() {
            return Err(ConfigError::ValidationError(
                "[settings]: opencore_build must be DEBUG exactly when opencore_debug is true"
                    .to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn prober(&self) -> Result<TableProber, ConfigError> {
        Ok(TableProber::new(
            self.probe.models.clone(),
            self.probe.host.clone(),
        )?)
    }

    /// Built-in catalog unless `catalog.models_file` replaces it
    pub fn supported_models(&self) -> Result<SupportedModelCatalog, ConfigError> {
        match &self.catalog.models_file {
            Some(path) => Ok(SupportedModelCatalog::load(path)?),
            None => Ok(SupportedModelCatalog::builtin()),
        }
    }

    /// Built-in fixtures unless `catalog.fixtures_file` replaces them
    pub fn fixtures(&self) -> Result<FixtureCatalog, ConfigError> {
        match &self.catalog.fixtures_file {
            Some(path) => Ok(FixtureCatalog::load(path)?),
            None => Ok(FixtureCatalog::builtin()),
        }
    }
}

/// Effective configuration with provenance
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    /// Merged layers before typing
    pub raw: Value,
    pub app: AppConfig,
    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Merge the layers: built-in, host file, local file, CLI.
    ///
    /// A missing host file is skipped. A missing local file is an error only
    /// when `local_required` is set (it was named with `--config`).
    pub fn build(
        host_config_path: Option<&Path>,
        local_config_path: Option<&Path>,
        local_required: bool,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = host_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Host,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        if let Some(path) = local_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Local,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            } else if local_required {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let raw = merge_layers(layers);
        let app: AppConfig = serde_json::from_value(raw.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Self::validate(&app)?;

        Ok(Self {
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            raw,
            app,
            sources,
        })
    }

    /// `$HOME/.config/oclp/config.toml`
    pub fn default_host_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/oclp/config.toml"))
    }

    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;
        let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("{}: TOML parse error: {}", path.display(), e))
        })?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    fn validate(app: &AppConfig) -> Result<(), ConfigError> {
        app.timeouts()
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if app.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "log_level must not be empty".to_string(),
            ));
        }

        for model in app.probe.models.keys() {
            if !oclp_catalog::is_valid_identifier(model) {
                return Err(ConfigError::ValidationError(format!(
                    "probe.models: invalid hardware identifier '{}'",
                    model
                )));
            }
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Probe table error: {0}")]
    Probe(#[from] ProbeError),
}
