//! OCLP CLI - OpenCore config builder front end
//!
//! Resolves command-line flags and probed hardware defaults into a single
//! [`Settings`] value, dispatches one action (build, root-volume patch or
//! unpatch), and runs the two-pass validation harness that builds and
//! validates every supported model and hardware fixture.

pub mod args;
pub mod builder;
pub mod config;
pub mod dispatch;
pub mod harness;
pub mod logging;
pub mod probe;
pub mod process;
pub mod resolve;
pub mod settings;
pub mod syspatch;
pub mod timeout;
pub mod validator;

pub use args::Args;
pub use builder::{BuildError, CommandBuilder, ConfigBuilder};
pub use config::{AppConfig, ConfigError, EffectiveConfig};
pub use dispatch::{dispatch, Action, ActionHandler, CommandHandler, DispatchError, DispatchOutcome};
pub use harness::{HarnessError, HarnessReport, ValidationHarness};
pub use probe::{detect_host_profile, DefaultsProber, ProbeError, TableProber};
pub use resolve::{resolve, Resolution, ResolveError, ResolveWarning};
pub use settings::{OpenCoreBuild, SerialSettings, Settings};
pub use syspatch::{CommandSysPatcher, SysPatchError};
pub use validator::{OcValidate, Validator, ValidatorError, ValidatorOutcome};

pub use oclp_catalog::{FixtureCatalog, HardwareProfile, SupportedModelCatalog};
