//! OCLP CLI
//!
//! Entry point for the `oclp` command-line tool.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use oclp_cli::config::LOCAL_CONFIG_FILE;
use oclp_cli::resolve::UNSUPPORTED_MODEL_GUIDANCE;
use oclp_cli::{
    detect_host_profile, dispatch, logging, resolve, Action, AppConfig, Args, CommandBuilder,
    CommandHandler, CommandSysPatcher, DispatchOutcome, EffectiveConfig, FixtureCatalog,
    OcValidate, ResolveError, Settings, SupportedModelCatalog, ValidationHarness,
};

/// Configuration, catalog and probe-table errors
const EXIT_CONFIG: i32 = 2;

/// Detected model is not supported and no --model was given
const EXIT_UNSUPPORTED: i32 = 1;

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    logging::init_tracing(&config.app.log_level);
    for source in &config.sources {
        tracing::debug!(origin = ?source.origin, path = ?source.path, "config layer");
    }

    // Interactive mode needs no model, so the host gate does not apply.
    if !args.has_action() {
        run_interactive();
        return;
    }

    let (models, fixtures) = match load_catalogs(&config.app) {
        Ok(catalogs) => catalogs,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    let settings = resolve_settings(&args, &config.app, &models);
    let action = Action::select(&args);
    tracing::info!(
        action = action.name(),
        model = settings.target_model(),
        build = %settings.opencore_build,
        "settings resolved"
    );

    match action {
        Action::Validate => run_validate(&config.app, &settings, &models, &fixtures),
        other => run_action(other, &config.app, &settings),
    }
}

fn load_config(args: &Args) -> Result<EffectiveConfig, oclp_cli::ConfigError> {
    let (local, required) = match args.config {
        Some(ref path) => (path.clone(), true),
        None => (PathBuf::from(LOCAL_CONFIG_FILE), false),
    };

    let cli_overrides = args
        .log_level
        .as_ref()
        .map(|level| serde_json::json!({ "log_level": level }));

    EffectiveConfig::build(
        EffectiveConfig::default_host_path().as_deref(),
        Some(&local),
        required,
        cli_overrides,
    )
}

fn load_catalogs(
    app: &AppConfig,
) -> Result<(SupportedModelCatalog, FixtureCatalog), oclp_cli::ConfigError> {
    Ok((app.supported_models()?, app.fixtures()?))
}

fn resolve_settings(args: &Args, app: &AppConfig, models: &SupportedModelCatalog) -> Settings {
    let computer = detect_host_profile();
    tracing::debug!(model = %computer.real_model, "detected host");

    let prior = match app.initial_settings(computer) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    let prober = match app.prober() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading probe tables: {}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    match resolve(args, prior, &prober, models) {
        Ok(resolution) => {
            for warning in &resolution.warnings {
                eprintln!("{}", warning);
            }
            resolution.settings
        }
        Err(ResolveError::UnsupportedModel { model }) => {
            tracing::error!(model, "unsupported model");
            eprintln!("{}", UNSUPPORTED_MODEL_GUIDANCE);
            process::exit(EXIT_UNSUPPORTED);
        }
        Err(e) => {
            eprintln!("Error resolving settings: {}", e);
            process::exit(EXIT_CONFIG);
        }
    }
}

fn run_validate(
    app: &AppConfig,
    settings: &Settings,
    models: &SupportedModelCatalog,
    fixtures: &FixtureCatalog,
) {
    let builder = CommandBuilder::new(app.builder.command.clone());
    let validator = OcValidate::new(
        settings.ocvalidate_path.clone(),
        app.timeouts().validator_duration(),
    );
    let harness = ValidationHarness::new(&builder, &validator, models, fixtures);

    let report = match harness.run(settings) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            if let Some(output) = e.output() {
                eprintln!("{}", output);
            }
            process::exit(e.exit_code());
        }
    };

    report.print_summary();

    if let Some(ref path) = app.report_path {
        let written = report
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Error writing report to {}: {}", path.display(), e);
            process::exit(EXIT_CONFIG);
        }
        println!("Report: {}", path.display());
    }
}

fn run_action(action: Action, app: &AppConfig, settings: &Settings) {
    let handler = CommandHandler::new(
        CommandBuilder::new(app.builder.command.clone()),
        CommandSysPatcher::new(app.sys_patch.command.clone()),
    );

    match dispatch(action, settings, &handler) {
        Ok(DispatchOutcome::Built(path)) => {
            println!("Your OpenCore EFI has been built at:");
            println!("    {}", path.display());
        }
        Ok(DispatchOutcome::Patched) => println!("Root volume patched"),
        Ok(DispatchOutcome::Unpatched) => println!("Root volume unpatched"),
        Ok(DispatchOutcome::Interactive) => run_interactive(),
        Err(e) => {
            eprintln!("{}", e);
            if let Some(output) = e.output() {
                eprintln!("{}", output);
            }
            process::exit(e.exit_code());
        }
    }
}

fn run_interactive() {
    println!("No action requested; interactive mode is not available here.");
    println!();
    println!("{}", Args::command().render_help());
}
