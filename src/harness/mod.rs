//! Two-pass validation harness
//!
//! Builds and validates every supported model and every hardware fixture,
//! first with the resolved settings and then with the inversion table
//! applied. The sweep is the cross product of [`PROFILES`] and
//! [`TargetSource::ALL`], in that order, and stops at the first failure.

mod report;

pub use report::{HarnessReport, IterationRecord, HARNESS_SCHEMA_ID, HARNESS_SCHEMA_VERSION};

use std::fmt;
use std::time::{Duration, Instant};

use oclp_catalog::{FixtureCatalog, SupportedModelCatalog};

use crate::builder::{BuildError, ConfigBuilder};
use crate::settings::{OpenCoreBuild, Settings};
use crate::validator::{Validator, ValidatorError};

/// A named transformation of the base settings
#[derive(Clone, Copy)]
pub struct SettingsProfile {
    pub name: &'static str,
    pub apply: fn(&Settings) -> Settings,
}

impl fmt::Debug for SettingsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsProfile")
            .field("name", &self.name)
            .finish()
    }
}

/// Passes, in order
pub const PROFILES: [SettingsProfile; 2] = [
    SettingsProfile {
        name: "default",
        apply: Settings::clone,
    },
    SettingsProfile {
        name: "inverted",
        apply: invert,
    },
];

/// Flip the feature switches the default pass leaves off.
///
/// `secure_status` stays true and `opencore_build` follows `opencore_debug`.
pub fn invert(settings: &Settings) -> Settings {
    Settings {
        verbose_debug: true,
        opencore_debug: true,
        opencore_build: OpenCoreBuild::Debug,
        kext_debug: true,
        showpicker: false,
        sip_status: false,
        secure_status: true,
        firewire_boot: true,
        nvme_boot: true,
        enable_wake_on_wlan: true,
        disable_tb: true,
        force_surplus: true,
        ..settings.clone()
    }
}

/// Where a pass draws its targets from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// Every identifier in the supported-model catalog, built as a custom model
    SupportedModels,
    /// Every fixture, built as if it were the host
    Fixtures,
}

impl TargetSource {
    pub const ALL: [TargetSource; 2] = [TargetSource::SupportedModels, TargetSource::Fixtures];

    pub fn name(&self) -> &'static str {
        match self {
            TargetSource::SupportedModels => "supported_models",
            TargetSource::Fixtures => "fixtures",
        }
    }

    /// Wording used in failure messages
    pub fn kind(&self) -> &'static str {
        match self {
            TargetSource::SupportedModels => "predefined",
            TargetSource::Fixtures => "dumped",
        }
    }
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Harness errors. All of them end the run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Validation failed for {} model: {target}", .source_kind.kind())]
    ValidationFailed {
        source_kind: TargetSource,
        profile: &'static str,
        target: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Validator timed out after {}s on {} model: {target}", .limit.as_secs(), .source_kind.kind())]
    ValidatorTimedOut {
        source_kind: TargetSource,
        profile: &'static str,
        target: String,
        limit: Duration,
        output: String,
    },

    #[error("Validator unavailable: {0}")]
    ValidatorUnavailable(#[source] ValidatorError),

    #[error("Build failed for {} model {target}: {error}", .source_kind.kind())]
    Build {
        source_kind: TargetSource,
        profile: &'static str,
        target: String,
        #[source]
        error: BuildError,
    },
}

impl HarnessError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::ValidationFailed { .. } => 3,
            HarnessError::ValidatorTimedOut { .. } => 4,
            HarnessError::ValidatorUnavailable(_) => 2,
            HarnessError::Build {
                error: BuildError::NotConfigured,
                ..
            } => 6,
            HarnessError::Build { .. } => 5,
        }
    }

    /// Captured validator or builder output, when there is any
    pub fn output(&self) -> Option<&str> {
        match self {
            HarnessError::ValidationFailed { output, .. }
            | HarnessError::ValidatorTimedOut { output, .. } => Some(output),
            HarnessError::Build {
                error: BuildError::Failed { output, .. },
                ..
            } => Some(output),
            _ => None,
        }
    }
}

/// One build + validate step
struct Target {
    label: String,
    model: String,
    settings: Settings,
}

/// Sweeps catalogs × profiles through a builder and validator
pub struct ValidationHarness<'a> {
    builder: &'a dyn ConfigBuilder,
    validator: &'a dyn Validator,
    models: &'a SupportedModelCatalog,
    fixtures: &'a FixtureCatalog,
}

impl<'a> ValidationHarness<'a> {
    pub fn new(
        builder: &'a dyn ConfigBuilder,
        validator: &'a dyn Validator,
        models: &'a SupportedModelCatalog,
        fixtures: &'a FixtureCatalog,
    ) -> Self {
        Self {
            builder,
            validator,
            models,
            fixtures,
        }
    }

    /// Number of build + validate steps a full run takes
    pub fn planned_iterations(&self) -> usize {
        PROFILES.len() * (self.models.len() + self.fixtures.len())
    }

    /// Run every profile over every target source.
    ///
    /// Each step starts from the profile's snapshot of `settings` (with
    /// `validate` set), so nothing one target changes leaks into the next.
    pub fn run(&self, settings: &Settings) -> Result<HarnessReport, HarnessError> {
        let base = Settings {
            validate: true,
            ..settings.clone()
        };

        let mut report = HarnessReport::new();
        tracing::info!(
            run_id = %report.run_id,
            iterations = self.planned_iterations(),
            "starting validation"
        );

        for profile in PROFILES {
            let snapshot = (profile.apply)(&base);
            for source in TargetSource::ALL {
                tracing::info!(profile = profile.name, source = %source, "validation pass");
                for target in self.targets(source, &snapshot) {
                    let record = self.step(profile.name, source, target)?;
                    report.record(record);
                }
            }
        }

        report.finalize();
        tracing::info!(
            run_id = %report.run_id,
            iterations = report.iteration_count,
            "validation passed"
        );
        Ok(report)
    }

    fn targets(&self, source: TargetSource, snapshot: &Settings) -> Vec<Target> {
        match source {
            TargetSource::SupportedModels => self
                .models
                .iter()
                .map(|id| Target {
                    label: id.to_string(),
                    model: id.to_string(),
                    settings: Settings {
                        custom_model: id.to_string(),
                        ..snapshot.clone()
                    },
                })
                .collect(),
            TargetSource::Fixtures => self
                .fixtures
                .iter()
                .map(|fixture| Target {
                    label: fixture.label.clone(),
                    model: fixture.real_model.clone(),
                    settings: Settings {
                        custom_model: String::new(),
                        computer: fixture.clone(),
                        ..snapshot.clone()
                    },
                })
                .collect(),
        }
    }

    fn step(
        &self,
        profile: &'static str,
        source: TargetSource,
        target: Target,
    ) -> Result<IterationRecord, HarnessError> {
        // Failures name the identifier for catalog targets and the real model
        // for fixtures
        let name = match source {
            TargetSource::SupportedModels => target.label.clone(),
            TargetSource::Fixtures => target.model.clone(),
        };

        let started = Instant::now();
        let artifact = self
            .builder
            .build(&target.model, &target.settings)
            .map_err(|error| HarnessError::Build {
                source_kind: source,
                profile,
                target: name.clone(),
                error,
            })?;
        let build_ms = started.elapsed().as_millis() as u64;

        let outcome = self.validator.validate(&artifact).map_err(|e| match e {
            ValidatorError::TimedOut { limit, output } => HarnessError::ValidatorTimedOut {
                source_kind: source,
                profile,
                target: name.clone(),
                limit,
                output,
            },
            other => HarnessError::ValidatorUnavailable(other),
        })?;

        if !outcome.success() {
            tracing::error!(
                profile,
                source = %source,
                target = %name,
                code = ?outcome.exit_code,
                "validation failed"
            );
            return Err(HarnessError::ValidationFailed {
                source_kind: source,
                profile,
                target: name,
                code: outcome.exit_code,
                output: outcome.output,
            });
        }

        tracing::debug!(profile, target = %target.label, "validated");
        Ok(IterationRecord {
            profile: profile.to_string(),
            source: source.name().to_string(),
            target: target.label,
            model: target.model,
            build_ms,
            validate_ms: outcome.duration.as_millis() as u64,
        })
    }
}
