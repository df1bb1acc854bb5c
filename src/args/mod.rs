//! Command-line flags
//!
//! The flag set is flat: boolean switches, three value options and four
//! action switches. Nothing here validates values beyond type coercion; the
//! resolver decides what each flag means.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "oclp")]
#[command(about = "Build and validate OpenCore configurations", version)]
pub struct Args {
    /// Build OpenCore
    #[arg(long)]
    pub build: bool,

    /// Enable verbose boot
    #[arg(long)]
    pub verbose: bool,

    /// Enable OpenCore DEBUG
    #[arg(long = "debug_oc")]
    pub debug_oc: bool,

    /// Enable kext DEBUG
    #[arg(long = "debug_kext")]
    pub debug_kext: bool,

    /// Hide OpenCore picker
    #[arg(long = "hide_picker")]
    pub hide_picker: bool,

    /// Disable SIP
    #[arg(long = "disable_sip")]
    pub disable_sip: bool,

    /// Disable SecureBootModel
    #[arg(long = "disable_smb")]
    pub disable_smb: bool,

    /// Enable OpenCore Vaulting
    #[arg(long)]
    pub vault: bool,

    /// Allow OpenCore on natively supported models
    #[arg(long = "support_all")]
    pub support_all: bool,

    /// Enable FireWire booting
    #[arg(long)]
    pub firewire: bool,

    /// Enable NVMe booting
    #[arg(long)]
    pub nvme: bool,

    /// Enable Wake on WLAN support
    #[arg(long)]
    pub wlan: bool,

    /// Moderate SMBIOS patching
    #[arg(long = "moderate_smbios")]
    pub moderate_smbios: bool,

    /// Allow root patching on Mojave and Catalina
    #[arg(long = "moj_cat_accel")]
    pub moj_cat_accel: bool,

    /// Disable Thunderbolt on 2013-2014 MacBook Pros
    #[arg(long = "disable_tb")]
    pub disable_tb: bool,

    /// Force SurPlus in all newer OSes
    #[arg(long = "force_surplus")]
    pub force_surplus: bool,

    /// Set custom model (e.g. iMac12,2)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Disk to install to
    #[arg(long, value_name = "DISK")]
    pub disk: Option<String>,

    /// SMBIOS patching mode (Minimal, Moderate, Advanced)
    #[arg(long = "smbios_spoof", value_name = "LEVEL")]
    pub smbios_spoof: Option<String>,

    /// Patch the root volume
    #[arg(long = "patch_sys_vol")]
    pub patch_sys_vol: bool,

    /// Unpatch the root volume (experimental)
    #[arg(long = "unpatch_sys_vol")]
    pub unpatch_sys_vol: bool,

    /// Run validation tests for CI
    #[arg(long)]
    pub validate: bool,

    /// Path to a local config file (default: ./oclp.toml when present)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "oclp_cli=trace")
    #[arg(long = "log-level", env = "OCLP_LOG_LEVEL", value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Args {
    /// True when any of build, patch_sys_vol, unpatch_sys_vol or validate was
    /// given. Without one, the caller falls back to interactive mode.
    pub fn has_action(&self) -> bool {
        self.build || self.patch_sys_vol || self.unpatch_sys_vol || self.validate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["oclp"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_no_flags_has_no_action() {
        let args = parse(&[]);
        assert!(!args.has_action());
        assert!(args.model.is_none());
    }

    #[test]
    fn test_each_action_counts() {
        for flag in ["--build", "--patch_sys_vol", "--unpatch_sys_vol", "--validate"] {
            assert!(parse(&[flag]).has_action(), "{flag} should be an action");
        }
    }

    #[test]
    fn test_option_flags_are_not_actions() {
        let args = parse(&["--verbose", "--debug_oc", "--model", "iMac12,2"]);
        assert!(!args.has_action());
        assert!(args.verbose);
        assert!(args.debug_oc);
        assert_eq!(args.model.as_deref(), Some("iMac12,2"));
    }

    #[test]
    fn test_underscore_spellings() {
        let args = parse(&[
            "--build",
            "--debug_kext",
            "--hide_picker",
            "--disable_sip",
            "--disable_smb",
            "--support_all",
            "--moderate_smbios",
            "--moj_cat_accel",
            "--disable_tb",
            "--force_surplus",
        ]);
        assert!(args.debug_kext);
        assert!(args.hide_picker);
        assert!(args.disable_sip);
        assert!(args.disable_smb);
        assert!(args.support_all);
        assert!(args.moderate_smbios);
        assert!(args.moj_cat_accel);
        assert!(args.disable_tb);
        assert!(args.force_surplus);
    }

    #[test]
    fn test_spoof_value_is_not_validated_here() {
        let args = parse(&["--build", "--smbios_spoof", "Bogus"]);
        assert_eq!(args.smbios_spoof.as_deref(), Some("Bogus"));
    }

    #[test]
    fn test_disk_and_config_values() {
        let args = parse(&["--disk", "disk4s1", "--config", "ci/oclp.toml"]);
        assert_eq!(args.disk.as_deref(), Some("disk4s1"));
        assert_eq!(args.config, Some(PathBuf::from("ci/oclp.toml")));
    }

    #[test]
    fn test_hyphenated_spelling_rejected() {
        assert!(Args::try_parse_from(["oclp", "--debug-oc"]).is_err());
    }
}
