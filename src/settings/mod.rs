//! Build settings
//!
//! `Settings` is the single configuration value threaded through resolution,
//! dispatch and the validation harness. Resolution consumes a prior value and
//! returns a new one; nothing mutates a shared instance.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use oclp_catalog::HardwareProfile;
use serde::{Deserialize, Serialize};

/// Default location of the ocvalidate binary
pub const DEFAULT_OCVALIDATE_PATH: &str = "payloads/OpenCore/ocvalidate";

/// Default OpenCore build output folder
pub const DEFAULT_RELEASE_FOLDER: &str = "Build-Folder/OpenCore-Build";

/// OpenCore build variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpenCoreBuild {
    Release,
    Debug,
}

impl OpenCoreBuild {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenCoreBuild::Release => "RELEASE",
            OpenCoreBuild::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for OpenCoreBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SMBIOS spoofing level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerialSettings {
    None,
    Minimal,
    Moderate,
    Advanced,
}

impl SerialSettings {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerialSettings::None => "None",
            SerialSettings::Minimal => "Minimal",
            SerialSettings::Moderate => "Moderate",
            SerialSettings::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for spoof levels outside the accepted set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SMBIOS spoof level '{0}'")]
pub struct UnknownSpoofLevel(pub String);

impl FromStr for SerialSettings {
    type Err = UnknownSpoofLevel;

    /// Only the levels a user may request are accepted; `None` is reserved
    /// for `--support_all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Minimal" => Ok(SerialSettings::Minimal),
            "Moderate" => Ok(SerialSettings::Moderate),
            "Advanced" => Ok(SerialSettings::Advanced),
            other => Err(UnknownSpoofLevel(other.to_string())),
        }
    }
}

/// Resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Requested model identifier; empty when building for the detected host
    pub custom_model: String,

    /// Hardware the build targets
    pub computer: HardwareProfile,

    pub verbose_debug: bool,
    pub opencore_debug: bool,
    pub opencore_build: OpenCoreBuild,
    pub kext_debug: bool,
    pub showpicker: bool,
    pub sip_status: bool,
    pub secure_status: bool,
    pub vault: bool,
    pub firewire_boot: bool,
    pub nvme_boot: bool,
    pub enable_wake_on_wlan: bool,
    pub disable_tb: bool,
    pub force_surplus: bool,
    pub allow_oc_everywhere: bool,
    pub moj_cat_accel: bool,
    pub validate: bool,
    pub serial_settings: SerialSettings,

    /// Install target disk, taken verbatim from `--disk`
    pub disk: String,

    pub ocvalidate_path: PathBuf,
    pub opencore_release_folder: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            custom_model: String::new(),
            computer: HardwareProfile::unknown(),
            verbose_debug: false,
            opencore_debug: false,
            opencore_build: OpenCoreBuild::Release,
            kext_debug: false,
            showpicker: true,
            sip_status: true,
            secure_status: true,
            vault: false,
            firewire_boot: false,
            nvme_boot: false,
            enable_wake_on_wlan: false,
            disable_tb: false,
            force_surplus: false,
            allow_oc_everywhere: false,
            moj_cat_accel: false,
            validate: false,
            serial_settings: SerialSettings::Minimal,
            disk: String::new(),
            ocvalidate_path: PathBuf::from(DEFAULT_OCVALIDATE_PATH),
            opencore_release_folder: PathBuf::from(DEFAULT_RELEASE_FOLDER),
        }
    }
}

impl Settings {
    /// Fresh settings for the given host profile
    pub fn for_computer(computer: HardwareProfile) -> Self {
        Self {
            computer,
            ..Self::default()
        }
    }

    /// Turn on OpenCore DEBUG; the flag and build variant always move together.
    pub fn enable_opencore_debug(&mut self) {
        self.opencore_debug = true;
        self.opencore_build = OpenCoreBuild::Debug;
    }

    /// Whether `opencore_build` agrees with `opencore_debug`
    pub fn debug_consistent(&self) -> bool {
        self.opencore_debug == (self.opencore_build == OpenCoreBuild::Debug)
    }

    /// Model the builder should target: the custom model when set, else the
    /// profile's real model.
    pub fn target_model(&self) -> &str {
        if self.custom_model.is_empty() {
            &self.computer.real_model
        } else {
            &self.custom_model
        }
    }

    /// Path of the generated config the validator checks
    pub fn config_plist_path(&self) -> PathBuf {
        config_plist_path(&self.opencore_release_folder)
    }

    /// Serialize for hand-off to external collaborators
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `<release_folder>/EFI/OC/config.plist`
pub fn config_plist_path(release_folder: &Path) -> PathBuf {
    release_folder.join("EFI").join("OC").join("config.plist")
}
