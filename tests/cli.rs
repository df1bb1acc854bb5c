//! End-to-end runs of the `oclp` binary

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn write_script(path: &Path, body: &str) -> PathBuf {
    fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// Scratch directory used as both HOME and the working directory
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn builder_script(&self) -> PathBuf {
        write_script(
            &self.path("build.sh"),
            "mkdir -p build/EFI/OC\ncat > build/EFI/OC/config.plist\necho \"$2\" >> builds.log",
        )
    }

    /// Writes ./oclp.toml wired to scripts in the sandbox. `extra` lands right
    /// after the root keys.
    fn write_config(&self, extra: &str) {
        let builder = self.builder_script();
        let patcher = write_script(&self.path("patch.sh"), "echo \"$1\" >> patch.log");
        let config = format!(
            r#"log_level = "warn"
{extra}

[paths]
release_folder = "{release}"
ocvalidate = "{ocvalidate}"

[builder]
command = ["{builder}"]

[sys_patch]
command = ["{patcher}"]
"#,
            release = self.path("build").display(),
            ocvalidate = self.path("ocvalidate").display(),
            builder = builder.display(),
            patcher = patcher.display(),
            extra = extra,
        );
        fs::write(self.path("oclp.toml"), config).unwrap();
    }

    fn run(&self, host_model: &str, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_oclp"))
            .args(args)
            .current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("OCLP_HOST_MODEL", host_model)
            .env_remove("RUST_LOG")
            .env_remove("OCLP_LOG_LEVEL")
            .output()
            .unwrap()
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap_or_default()
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn unsupported_host_exits_before_dispatch() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("Mac14,7", &["--build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not supported"));
    assert!(stderr(&output).contains("--model"));
    assert_eq!(sandbox.read("builds.log"), "");
}

#[test]
fn custom_model_bypasses_host_gate() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("Mac14,7", &["--build", "--model", "iMac12,2"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(sandbox.read("builds.log"), "iMac12,2\n");
    assert!(stdout(&output).contains("EFI/OC/config.plist"));
}

#[test]
fn build_wins_over_patch() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("iMac12,2", &["--build", "--patch_sys_vol"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(sandbox.read("builds.log"), "iMac12,2\n");
    assert_eq!(sandbox.read("patch.log"), "");
}

#[test]
fn patch_and_unpatch_run_the_patcher() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    assert_eq!(sandbox.run("iMac12,2", &["--patch_sys_vol"]).status.code(), Some(0));
    assert_eq!(sandbox.run("iMac12,2", &["--unpatch_sys_vol"]).status.code(), Some(0));
    assert_eq!(sandbox.read("patch.log"), "--patch\n--unpatch\n");
}

#[test]
fn unrecognized_spoof_level_warns_and_continues() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("iMac12,2", &["--build", "--smbios_spoof", "Bogus"]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("Unknown SMBIOS arg passed: Bogus"));
    // The log line is there too, and a piped stderr gets no colour codes
    assert!(err.contains("keeping current spoof level"));
    assert!(!err.contains('\u{1b}'), "stderr: {:?}", err);

    let settings: serde_json::Value =
        serde_json::from_str(&sandbox.read("build/EFI/OC/config.plist")).unwrap();
    assert_eq!(settings["serial_settings"], "Minimal");
}

#[test]
fn debug_oc_reaches_the_builder() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("iMac12,2", &["--build", "--debug_oc", "--support_all"]);
    assert_eq!(output.status.code(), Some(0));

    let settings: serde_json::Value =
        serde_json::from_str(&sandbox.read("build/EFI/OC/config.plist")).unwrap();
    assert_eq!(settings["opencore_debug"], true);
    assert_eq!(settings["opencore_build"], "DEBUG");
    assert_eq!(settings["serial_settings"], "None");
    assert_eq!(settings["allow_oc_everywhere"], true);
}

#[test]
fn no_action_is_interactive() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("iMac12,2", &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("No action requested"));
    assert!(stdout(&output).contains("--validate"));
}

#[test]
fn no_action_on_unsupported_host_is_interactive() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");

    let output = sandbox.run("Mac14,7", &[]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No action requested"));
    assert!(!stderr(&output).contains("not supported"));
}

#[test]
fn builder_failure_shows_its_output() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");
    write_script(
        &sandbox.path("build.sh"),
        "echo 'Lilu.kext not found in payloads'\nexit 1",
    );

    let output = sandbox.run("iMac12,2", &["--build"]);
    assert_eq!(output.status.code(), Some(5));
    let err = stderr(&output);
    assert!(err.contains("builder failed for iMac12,2"));
    assert!(err.contains("Lilu.kext not found in payloads"));
}

#[test]
fn patcher_failure_shows_its_output() {
    let sandbox = Sandbox::new();
    sandbox.write_config("");
    write_script(&sandbox.path("patch.sh"), "echo 'no root snapshot' 1>&2\nexit 4");

    let output = sandbox.run("iMac12,2", &["--unpatch_sys_vol"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("no root snapshot"));
}

#[test]
fn missing_config_file_is_an_error() {
    let sandbox = Sandbox::new();
    let output = sandbox.run("iMac12,2", &["--build", "--config", "nope.toml"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("nope.toml"));
}

#[test]
fn missing_builder_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run("iMac12,2", &["--build"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("builder.command"));
}

#[test]
fn validate_sweep_and_report() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("models.toml"), "models = [\"iMac8,1\", \"MacPro3,1\"]\n").unwrap();
    fs::write(
        sandbox.path("fixtures.toml"),
        "[[fixture]]\nlabel = \"Lab iMac\"\nreal_model = \"iMac11,3\"\n",
    )
    .unwrap();
    write_script(&sandbox.path("ocvalidate"), "test -f \"$1\"");
    sandbox.write_config(&format!(
        "report_path = \"{}\"\n\n[catalog]\nmodels_file = \"models.toml\"\nfixtures_file = \"fixtures.toml\"\n",
        sandbox.path("report.json").display()
    ));

    let output = sandbox.run("Mac14,7", &["--validate", "--model", "iMac12,2"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        sandbox.read("builds.log"),
        "iMac8,1\nMacPro3,1\niMac11,3\niMac8,1\nMacPro3,1\niMac11,3\n"
    );

    let report: serde_json::Value = serde_json::from_str(&sandbox.read("report.json")).unwrap();
    assert_eq!(report["iteration_count"], 6);
    assert_eq!(report["iterations"][2]["target"], "Lab iMac");
    assert_eq!(report["iterations"][5]["profile"], "inverted");
}

#[test]
fn validate_failure_exit_code_and_message() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("models.toml"), "models = [\"iMac8,1\"]\n").unwrap();
    write_script(
        &sandbox.path("ocvalidate"),
        "echo 'CheckKernel: Kernel->Add[0] is borked'\nexit 2",
    );
    sandbox.write_config("[catalog]\nmodels_file = \"models.toml\"\n");

    let output = sandbox.run("Mac14,7", &["--validate", "--model", "iMac12,2"]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("Validation failed for predefined model: iMac8,1"));
    assert!(err.contains("Kernel->Add[0] is borked"));
}

#[test]
fn validate_timeout_exit_code() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("models.toml"), "models = [\"iMac8,1\"]\n").unwrap();
    write_script(&sandbox.path("ocvalidate"), "exec sleep 10");
    sandbox.write_config(
        "[catalog]\nmodels_file = \"models.toml\"\n\n[validator]\ntimeout_seconds = 1\n",
    );

    let output = sandbox.run("iMac12,2", &["--validate"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("timed out"));
}
