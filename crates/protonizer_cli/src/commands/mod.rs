//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod new;
pub mod protonize;
pub mod publish;

/// protonizer - generate and publish AWS Proton templates
#[derive(Parser, Debug)]
#[command(name = "protonizer")]
#[command(version, about = "protonizer - generate and publish AWS Proton templates")]
#[command(long_about = r#"
protonizer turns existing Terraform modules into AWS Proton templates and
publishes them.

COMMANDS:
  protonize  → Wrap a Terraform module as an environment or service template
  new        → Scaffold a new template from scratch
  publish    → Bundle, upload and register a template version

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Terraform parse error
  4 - Template error
  5 - Publish error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a Proton template from an existing Terraform module
    Protonize(protonize::ProtonizeArgs),

    /// Scaffold a new Proton template
    New(new::NewArgs),

    /// Publish a template to AWS Proton
    Publish(publish::PublishArgs),
}
