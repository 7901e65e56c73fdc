//! protonizer CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Terraform parse error
//! - 4: Template error
//! - 5: Publish error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use protonizer_iac::IacError;
use protonizer_publish::PublishError;
use protonizer_templates::TemplateError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PARSE_ERROR: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const PUBLISH_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Protonize(args) => commands::protonize::execute(args).await,
        Commands::New(args) => commands::new::execute(args).await,
        Commands::Publish(args) => commands::publish::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Log filter: `RUST_LOG` wins, otherwise info (debug with `--verbose`).
fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("protonizer={},warn", level)))
}

fn init_logging(verbose: bool) {
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(log_filter(verbose))
        .try_init();
}

/// Map the first typed error in the chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<IacError>() {
            return iac_exit_code(err);
        }
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return template_exit_code(err);
        }
        if let Some(err) = cause.downcast_ref::<PublishError>() {
            return match err {
                PublishError::Config(_) => ExitCodes::INVALID_ARGS,
                PublishError::Template(inner) => template_exit_code(inner),
                PublishError::Io(_) | PublishError::Walk(_) => ExitCodes::GENERAL_ERROR,
                _ => ExitCodes::PUBLISH_ERROR,
            };
        }
    }
    ExitCodes::GENERAL_ERROR
}

fn iac_exit_code(err: &IacError) -> u8 {
    match err {
        IacError::Parse { .. } => ExitCodes::PARSE_ERROR,
        IacError::Io(_) => ExitCodes::GENERAL_ERROR,
        _ => ExitCodes::INVALID_ARGS,
    }
}

fn template_exit_code(err: &TemplateError) -> u8 {
    match err {
        TemplateError::InvalidConfig(_)
        | TemplateError::InvalidName(_)
        | TemplateError::InvalidCompatibleEnvironment(_)
        | TemplateError::ReadConfig { .. }
        | TemplateError::Yaml(_) => ExitCodes::INVALID_ARGS,
        TemplateError::Io(_) | TemplateError::Walk(_) => ExitCodes::GENERAL_ERROR,
        TemplateError::Render(_)
        | TemplateError::InvalidPath(_)
        | TemplateError::DuplicatePath(_) => ExitCodes::TEMPLATE_ERROR,
    }
}
