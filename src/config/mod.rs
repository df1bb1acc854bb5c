//! Application configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Host config (~/.config/oclp/config.toml)
//! 3. Local config (`--config`, or ./oclp.toml when present)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    AppConfig, CatalogConfig, CommandConfig, ConfigError, ConfigOrigin, ConfigSource,
    EffectiveConfig, PathsConfig, ProbeConfig, ValidatorConfig, LOCAL_CONFIG_FILE,
};
pub use merge::{deep_merge, merge_layers};
