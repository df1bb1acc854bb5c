//! Resolution rules, in evaluation order
//!
//! Each rule reads the parsed flags and rewrites the accumulated settings.
//! Later rules see (and may overwrite) what earlier rules produced, so the
//! position of a rule in [`RULES`] is its precedence.

use tracing::{info, warn};

use super::{Accumulator, ResolveError, ResolveWarning};
use crate::probe::ProbeError;
use crate::settings::{SerialSettings, Settings};

/// A named resolution step
pub struct Rule {
    pub name: &'static str,
    pub(super) apply: fn(&mut Accumulator<'_>) -> Result<bool, ResolveError>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rules return `Ok(true)` when they changed or confirmed a value.
pub const RULES: &[Rule] = &[
    Rule { name: "model", apply: model },
    Rule { name: "disk", apply: disk },
    Rule { name: "verbose", apply: verbose },
    Rule { name: "debug_oc", apply: debug_oc },
    Rule { name: "debug_kext", apply: debug_kext },
    Rule { name: "hide_picker", apply: hide_picker },
    Rule { name: "sip", apply: sip },
    Rule { name: "secure_boot_model", apply: secure_boot_model },
    Rule { name: "vault", apply: vault },
    Rule { name: "firewire", apply: firewire },
    Rule { name: "nvme", apply: nvme },
    Rule { name: "wlan", apply: wlan },
    Rule { name: "disable_tb", apply: disable_tb },
    Rule { name: "force_surplus", apply: force_surplus },
    Rule { name: "moderate_smbios", apply: moderate_smbios },
    Rule { name: "smbios_spoof", apply: smbios_spoof },
    Rule { name: "support_all", apply: support_all },
];

/// Names of [`RULES`] in evaluation order
pub fn rule_names() -> Vec<&'static str> {
    RULES.iter().map(|rule| rule.name).collect()
}

fn model(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    if let Some(model) = acc.args.model.as_deref() {
        info!(model, "Using custom model");
        acc.settings.custom_model = model.to_string();
        acc.settings = checked(model, acc.prober.probe(model, false, &acc.settings)?)?;
        return Ok(true);
    }

    let real_model = acc.settings.computer.real_model.clone();
    if !acc.catalog.contains(&real_model) && !acc.settings.allow_oc_everywhere {
        return Err(ResolveError::UnsupportedModel { model: real_model });
    }

    info!(model = %real_model, "Using detected model");
    acc.settings = checked(&real_model, acc.prober.probe(&real_model, true, &acc.settings)?)?;
    Ok(true)
}

/// Probed settings must keep opencore_build in step with opencore_debug.
fn checked(model: &str, probed: Settings) -> Result<Settings, ResolveError> {
    if probed.debug_consistent() {
        Ok(probed)
    } else {
        Err(ProbeError::InconsistentDebug {
            model: model.to_string(),
        }
        .into())
    }
}

fn disk(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    let Some(disk) = acc.args.disk.as_deref() else {
        return Ok(false);
    };
    info!(disk, "Install disk set");
    acc.settings.disk = disk.to_string();
    Ok(true)
}

// The next three always run: probed values for these fields are discarded.

fn verbose(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    acc.settings.verbose_debug = acc.args.verbose;
    Ok(true)
}

fn sip(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    acc.settings.sip_status = !acc.args.disable_sip;
    Ok(true)
}

fn secure_boot_model(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    acc.settings.secure_status = !acc.args.disable_smb;
    Ok(true)
}

fn debug_oc(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    if !acc.args.debug_oc {
        return Ok(false);
    }
    acc.settings.enable_opencore_debug();
    Ok(true)
}

fn debug_kext(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.debug_kext, &mut acc.settings.kext_debug, true)
}

fn hide_picker(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.hide_picker, &mut acc.settings.showpicker, false)
}

fn vault(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.vault, &mut acc.settings.vault, true)
}

fn firewire(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.firewire, &mut acc.settings.firewire_boot, true)
}

fn nvme(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.nvme, &mut acc.settings.nvme_boot, true)
}

fn wlan(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.wlan, &mut acc.settings.enable_wake_on_wlan, true)
}

fn disable_tb(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.disable_tb, &mut acc.settings.disable_tb, true)
}

fn force_surplus(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    set_if(acc.args.force_surplus, &mut acc.settings.force_surplus, true)
}

fn moderate_smbios(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    if !acc.args.moderate_smbios {
        return Ok(false);
    }
    acc.settings.serial_settings = SerialSettings::Moderate;
    Ok(true)
}

fn smbios_spoof(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    let Some(raw) = acc.args.smbios_spoof.as_deref() else {
        return Ok(false);
    };
    match raw.parse::<SerialSettings>() {
        Ok(level) => {
            acc.settings.serial_settings = level;
            Ok(true)
        }
        Err(_) => {
            warn!(value = raw, "Unknown SMBIOS arg passed, keeping current spoof level");
            acc.warnings.push(ResolveWarning::UnrecognizedSpoofLevel {
                value: raw.to_string(),
                kept: acc.settings.serial_settings,
            });
            Ok(false)
        }
    }
}

/// Runs after both spoof rules so it always wins over them.
fn support_all(acc: &mut Accumulator<'_>) -> Result<bool, ResolveError> {
    if !acc.args.support_all {
        return Ok(false);
    }
    info!("Building for natively supported model");
    acc.settings.allow_oc_everywhere = true;
    acc.settings.serial_settings = SerialSettings::None;
    Ok(true)
}

fn set_if(flag: bool, field: &mut bool, value: bool) -> Result<bool, ResolveError> {
    if flag {
        *field = value;
    }
    Ok(flag)
}
