//! Settings resolution
//!
//! Turns parsed flags plus a prior [`Settings`] value into the settings a run
//! uses. Resolution is a single pass over the ordered [`RULES`] table:
//! 1. Model selection, which gates unsupported hosts and runs the prober
//! 2. Per-flag mapping, including the three fields that are always recomputed
//! 3. SMBIOS spoof handling, where `support_all` is evaluated last and wins

mod rules;

pub use rules::{rule_names, Rule, RULES};

use oclp_catalog::SupportedModelCatalog;
use serde::Serialize;

use crate::args::Args;
use crate::probe::{DefaultsProber, ProbeError};
use crate::settings::{SerialSettings, Settings};

/// Guidance shown when the detected model cannot be built for
pub const UNSUPPORTED_MODEL_GUIDANCE: &str = "Your model is not supported by this patcher for running unsupported OSes!\n\nIf you plan to create the USB for another machine, pass --model <identifier> (for example --model iMac12,2).";

/// Non-fatal conditions noticed during resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveWarning {
    /// `--smbios_spoof` value outside Minimal/Moderate/Advanced
    UnrecognizedSpoofLevel { value: String, kept: SerialSettings },
}

impl std::fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveWarning::UnrecognizedSpoofLevel { value, kept } => write!(
                f,
                "Unknown SMBIOS arg passed: {value} (keeping {kept})"
            ),
        }
    }
}

/// Fatal resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Detected model '{model}' is not supported")]
    UnsupportedModel { model: String },

    #[error("Probing defaults failed: {0}")]
    Probe(#[from] ProbeError),
}

/// Outcome of a resolution pass
#[derive(Debug, Clone)]
pub struct Resolution {
    pub settings: Settings,
    pub warnings: Vec<ResolveWarning>,
    /// Rules that fired, in evaluation order
    pub applied: Vec<&'static str>,
}

/// State threaded through the rules
pub(crate) struct Accumulator<'a> {
    pub(crate) args: &'a Args,
    pub(crate) prober: &'a dyn DefaultsProber,
    pub(crate) catalog: &'a SupportedModelCatalog,
    pub(crate) settings: Settings,
    pub(crate) warnings: Vec<ResolveWarning>,
}

/// Resolve `prior` against the parsed flags.
///
/// `prior.computer` must already hold the detected host. `prior` is consumed;
/// the returned value is the only live copy.
pub fn resolve(
    args: &Args,
    prior: Settings,
    prober: &dyn DefaultsProber,
    catalog: &SupportedModelCatalog,
) -> Result<Resolution, ResolveError> {
    let mut acc = Accumulator {
        args,
        prober,
        catalog,
        settings: prior,
        warnings: Vec::new(),
    };

    let mut applied = Vec::new();
    for rule in RULES {
        if (rule.apply)(&mut acc)? {
            applied.push(rule.name);
        }
    }

    tracing::debug!(rules = ?applied, "settings resolved");

    Ok(Resolution {
        settings: acc.settings,
        warnings: acc.warnings,
        applied,
    })
}
