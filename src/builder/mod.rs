//! OpenCore config generation
//!
//! The builder itself is an external collaborator. [`CommandBuilder`] runs the
//! configured argv with `--model <id>` appended and the settings as JSON on
//! stdin, then expects the config at `<release_folder>/EFI/OC/config.plist`.

use std::path::PathBuf;
use std::process::Command;

use crate::process::run_captured;
use crate::settings::Settings;

/// Produces a config for a model under the given settings
pub trait ConfigBuilder {
    /// Returns the path of the generated config
    fn build(&self, model: &str, settings: &Settings) -> Result<PathBuf, BuildError>;
}

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no builder configured (set builder.command)")]
    NotConfigured,

    #[error("failed to serialize settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("failed to run builder '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("builder failed for {model} (exit {code:?})")]
    Failed {
        model: String,
        code: Option<i32>,
        output: String,
    },

    #[error("builder reported success for {model} but {} is missing", .path.display())]
    MissingArtifact { model: String, path: PathBuf },
}

/// Builder backed by an external command
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    argv: Vec<String>,
}

impl CommandBuilder {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl ConfigBuilder for CommandBuilder {
    fn build(&self, model: &str, settings: &Settings) -> Result<PathBuf, BuildError> {
        let (program, rest) = self.argv.split_first().ok_or(BuildError::NotConfigured)?;

        let mut command = Command::new(program);
        command.args(rest).arg("--model").arg(model);

        let input = settings.to_json()?;
        tracing::info!(model, build = %settings.opencore_build, "building config");

        let run = run_captured(command, Some(input.as_bytes()), None).map_err(|source| {
            BuildError::Spawn {
                program: program.clone(),
                source,
            }
        })?;

        if !run.success() {
            return Err(BuildError::Failed {
                model: model.to_string(),
                code: run.exit_code,
                output: run.output,
            });
        }

        let artifact = settings.config_plist_path();
        if !artifact.is_file() {
            return Err(BuildError::MissingArtifact {
                model: model.to_string(),
                path: artifact,
            });
        }

        tracing::debug!(model, artifact = %artifact.display(), elapsed_ms = run.duration.as_millis() as u64, "build finished");
        Ok(artifact)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn script(dir: &Path, body: &str) -> String {
        let path = dir.join("build.sh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            opencore_release_folder: dir.join("out"),
            ..Settings::default()
        }
    }

    #[test]
    fn test_build_writes_artifact() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out/EFI/OC");
        let builder = CommandBuilder::new(vec![script(
            dir.path(),
            &format!(
                "mkdir -p {out}; cat > {out}/config.plist; echo \"$1 $2\" >> {log}",
                out = out.display(),
                log = dir.path().join("log").display()
            ),
        )]);

        let settings = settings_in(dir.path());
        let artifact = builder.build("MacPro3,1", &settings).unwrap();
        assert_eq!(artifact, settings.config_plist_path());

        // Settings arrive as JSON on stdin
        let written: Settings =
            serde_json::from_str(&fs::read_to_string(&artifact).unwrap()).unwrap();
        assert_eq!(written, settings);
        assert_eq!(
            fs::read_to_string(dir.path().join("log")).unwrap(),
            "--model MacPro3,1\n"
        );
    }

    #[test]
    fn test_failed_build_carries_output() {
        let dir = TempDir::new().unwrap();
        let builder = CommandBuilder::new(vec![script(dir.path(), "echo 'no kexts'; exit 1")]);
        let err = builder.build("iMac8,1", &settings_in(dir.path())).unwrap_err();
        match err {
            BuildError::Failed { model, code, output } => {
                assert_eq!(model, "iMac8,1");
                assert_eq!(code, Some(1));
                assert_eq!(output, "no kexts\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let builder = CommandBuilder::new(vec![script(dir.path(), "exit 0")]);
        let err = builder.build("iMac8,1", &settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, BuildError::MissingArtifact { .. }));
    }

    #[test]
    fn test_not_configured() {
        let builder = CommandBuilder::new(Vec::new());
        assert!(matches!(
            builder.build("iMac8,1", &Settings::default()),
            Err(BuildError::NotConfigured)
        ));
    }
}
