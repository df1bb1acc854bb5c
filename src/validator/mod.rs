//! Structural validation of generated configs
//!
//! [`OcValidate`] runs the `ocvalidate` binary against one artifact. Exit 0
//! means valid; any other code is a validation failure carried back with the
//! combined output. The wait is bounded.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::process::run_captured;

/// A validator for one generated artifact
pub trait Validator {
    fn validate(&self, artifact: &Path) -> Result<ValidatorOutcome, ValidatorError>;
}

/// Completed validator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorOutcome {
    /// `None` when the process died from a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr
    pub output: String,
    pub duration: Duration,
}

impl ValidatorOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Validator errors
///
/// A non-zero exit is not an error at this level; it comes back as an
/// outcome for the caller to judge.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("failed to run validator {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("validator did not finish within {}s", .limit.as_secs())]
    TimedOut { limit: Duration, output: String },
}

/// The `ocvalidate` binary
#[derive(Debug, Clone)]
pub struct OcValidate {
    path: PathBuf,
    timeout: Duration,
}

impl OcValidate {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

impl Validator for OcValidate {
    fn validate(&self, artifact: &Path) -> Result<ValidatorOutcome, ValidatorError> {
        let mut command = Command::new(&self.path);
        command.arg(artifact);

        tracing::debug!(
            validator = %self.path.display(),
            artifact = %artifact.display(),
            "running validator"
        );

        let run = run_captured(command, None, Some(self.timeout)).map_err(|source| {
            ValidatorError::Spawn {
                path: self.path.clone(),
                source,
            }
        })?;

        if run.timed_out {
            tracing::error!(
                artifact = %artifact.display(),
                limit_secs = self.timeout.as_secs(),
                "validator timed out"
            );
            return Err(ValidatorError::TimedOut {
                limit: self.timeout,
                output: run.output,
            });
        }

        Ok(ValidatorOutcome {
            exit_code: run.exit_code,
            output: run.output,
            duration: run.duration,
        })
    }
}
