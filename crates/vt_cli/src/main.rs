//! vt CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error
//! - 5: State store error
//! - 6: Provider error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vt_provider::{BatchAction, ProviderError};
use vt_state::StateError;
use vt_templates::TemplateError;

mod commands;
mod config;

use commands::{BatchFailed, Cli, Commands, Context};
use config::{AppConfig, ConfigOverrides};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const STATE_ERROR: u8 = 5;
    pub const PROVIDER_ERROR: u8 = 6;
}

/// Crates whose log output follows `--verbosity`.
const LOG_TARGETS: [&str; 4] = ["vt_cli", "vt_templates", "vt_state", "vt_provider"];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(ConfigOverrides {
        templates_path: cli.templates_path.clone(),
        storage_path: cli.storage_path.clone(),
        log_level: cli.verbosity.clone(),
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            return ExitCode::from(ExitCodes::INVALID_ARGS);
        }
    };

    init_logging(&config.log_level);

    let ctx = Context::new(config);
    let result = match cli.command {
        Commands::Start(args) => commands::lifecycle::execute(BatchAction::Start, args, &ctx).await,
        Commands::Stop(args) => commands::lifecycle::execute(BatchAction::Stop, args, &ctx).await,
        Commands::Ps => commands::ps::execute(&ctx).await,
        Commands::Template(args) => commands::template::execute(args, &ctx).await,
        Commands::Inspect(args) => commands::inspect::execute(args, &ctx).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(level: &str) {
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        if let Ok(directive) = format!("{}={}", target, level.to_lowercase()).parse() {
            filter = filter.add_directive(directive);
        }
    }
    if let Ok(directive) = "warn".parse() {
        filter = filter.add_directive(directive);
    }

    // Already initialized is fine
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return if err.is_validation() {
                ExitCodes::VALIDATION_FAILURE
            } else {
                ExitCodes::TEMPLATE_ERROR
            };
        }
        if cause.downcast_ref::<StateError>().is_some() {
            return ExitCodes::STATE_ERROR;
        }
        if let Some(err) = cause.downcast_ref::<ProviderError>() {
            return match err {
                ProviderError::ProviderNotFound(_) => ExitCodes::INVALID_ARGS,
                ProviderError::State(_) => ExitCodes::STATE_ERROR,
                _ => ExitCodes::PROVIDER_ERROR,
            };
        }
        if cause.downcast_ref::<BatchFailed>().is_some() {
            return ExitCodes::PROVIDER_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}
