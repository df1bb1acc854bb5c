//! Root-volume patching
//!
//! Patching the installed system volume is delegated to an external command;
//! this crate only decides when to call it.

use std::process::Command;

use crate::process::run_captured;
use crate::settings::Settings;

/// Exported to the patcher when `--moj_cat_accel` was given
pub const MOJ_CAT_ACCEL_ENV: &str = "OCLP_MOJ_CAT_ACCEL";

/// Direction of a root-volume operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchDirection {
    Patch,
    Unpatch,
}

impl PatchDirection {
    pub fn flag(&self) -> &'static str {
        match self {
            PatchDirection::Patch => "--patch",
            PatchDirection::Unpatch => "--unpatch",
        }
    }
}

/// Sys-patch errors
#[derive(Debug, thiserror::Error)]
pub enum SysPatchError {
    #[error("no root-volume patcher configured (set sys_patch.command)")]
    NotConfigured,

    #[error("failed to run patcher '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("root-volume {} failed (exit {code:?})", .direction.flag().trim_start_matches("--"))]
    Failed {
        direction: PatchDirection,
        code: Option<i32>,
        output: String,
    },
}

/// Patcher backed by an external command
#[derive(Debug, Clone)]
pub struct CommandSysPatcher {
    argv: Vec<String>,
}

impl CommandSysPatcher {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn run(&self, direction: PatchDirection, settings: &Settings) -> Result<String, SysPatchError> {
        let (program, rest) = self.argv.split_first().ok_or(SysPatchError::NotConfigured)?;

        let mut command = Command::new(program);
        command.args(rest).arg(direction.flag());
        if settings.moj_cat_accel {
            command.env(MOJ_CAT_ACCEL_ENV, "1");
        }

        tracing::info!(
            direction = direction.flag(),
            model = settings.target_model(),
            moj_cat_accel = settings.moj_cat_accel,
            "running root-volume patcher"
        );

        let run = run_captured(command, None, None).map_err(|source| SysPatchError::Spawn {
            program: program.clone(),
            source,
        })?;

        if run.success() {
            Ok(run.output)
        } else {
            Err(SysPatchError::Failed {
                direction,
                code: run.exit_code,
                output: run.output,
            })
        }
    }
}
