//! Action selection and dispatch
//!
//! Exactly one action runs per invocation. Priority: validate, build,
//! patch_sys_vol, unpatch_sys_vol; with none given the run is interactive.
//! Validation never reaches [`dispatch`]; the binary hands it to the
//! harness instead.

use std::path::PathBuf;

use crate::args::Args;
use crate::builder::{BuildError, CommandBuilder, ConfigBuilder};
use crate::settings::Settings;
use crate::syspatch::{CommandSysPatcher, PatchDirection, SysPatchError};

/// The action a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Validate,
    Build,
    PatchSysVol { moj_cat_accel: bool },
    UnpatchSysVol,
    Interactive,
}

impl Action {
    /// Pick the single action implied by the flags
    pub fn select(args: &Args) -> Self {
        if args.validate {
            Action::Validate
        } else if args.build {
            Action::Build
        } else if args.patch_sys_vol {
            Action::PatchSysVol {
                moj_cat_accel: args.moj_cat_accel,
            }
        } else if args.unpatch_sys_vol {
            Action::UnpatchSysVol
        } else {
            Action::Interactive
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Validate => "validate",
            Action::Build => "build",
            Action::PatchSysVol { .. } => "patch_sys_vol",
            Action::UnpatchSysVol => "unpatch_sys_vol",
            Action::Interactive => "interactive",
        }
    }
}

/// Performs the dispatchable actions
pub trait ActionHandler {
    fn build(&self, settings: &Settings) -> Result<PathBuf, DispatchError>;
    fn patch_sys_vol(&self, settings: &Settings) -> Result<(), DispatchError>;
    fn unpatch_sys_vol(&self, settings: &Settings) -> Result<(), DispatchError>;
}

/// What a dispatched action produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Built(PathBuf),
    Patched,
    Unpatched,
    /// No action was requested
    Interactive,
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    SysPatch(#[from] SysPatchError),

    #[error("validation is run by the harness, not dispatched")]
    NotDispatchable,
}

impl DispatchError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::Build(BuildError::NotConfigured) => 6,
            DispatchError::Build(_) => 5,
            DispatchError::SysPatch(_) => 6,
            DispatchError::NotDispatchable => 2,
        }
    }

    /// Captured output of the failed builder or patcher, if it ran
    pub fn output(&self) -> Option<&str> {
        match self {
            DispatchError::Build(BuildError::Failed { output, .. })
            | DispatchError::SysPatch(SysPatchError::Failed { output, .. }) => Some(output),
            _ => None,
        }
    }
}

/// Run `action` against `settings`.
///
/// For a patch, `moj_cat_accel` is recorded on a copy of the settings before
/// the handler sees them.
pub fn dispatch(
    action: Action,
    settings: &Settings,
    handler: &dyn ActionHandler,
) -> Result<DispatchOutcome, DispatchError> {
    tracing::debug!(action = action.name(), "dispatching");
    match action {
        Action::Validate => Err(DispatchError::NotDispatchable),
        Action::Build => handler.build(settings).map(DispatchOutcome::Built),
        Action::PatchSysVol { moj_cat_accel } => {
            let mut patched = settings.clone();
            if moj_cat_accel {
                patched.moj_cat_accel = true;
            }
            handler.patch_sys_vol(&patched)?;
            Ok(DispatchOutcome::Patched)
        }
        Action::UnpatchSysVol => {
            handler.unpatch_sys_vol(settings)?;
            Ok(DispatchOutcome::Unpatched)
        }
        Action::Interactive => Ok(DispatchOutcome::Interactive),
    }
}

/// Handler backed by the external builder and patcher commands
#[derive(Debug, Clone)]
pub struct CommandHandler {
    builder: CommandBuilder,
    patcher: CommandSysPatcher,
}

impl CommandHandler {
    pub fn new(builder: CommandBuilder, patcher: CommandSysPatcher) -> Self {
        Self { builder, patcher }
    }
}

impl ActionHandler for CommandHandler {
    fn build(&self, settings: &Settings) -> Result<PathBuf, DispatchError> {
        Ok(self.builder.build(settings.target_model(), settings)?)
    }

    fn patch_sys_vol(&self, settings: &Settings) -> Result<(), DispatchError> {
        self.patcher.run(PatchDirection::Patch, settings)?;
        Ok(())
    }

    fn unpatch_sys_vol(&self, settings: &Settings) -> Result<(), DispatchError> {
        self.patcher.run(PatchDirection::Unpatch, settings)?;
        Ok(())
    }
}
