//! New command - Scaffold a fresh Proton template.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use protonizer_iac::{IacTool, ProvisioningKind, TemplateKind};
use protonizer_templates::{
    CompatibleEnvironment, NewTemplateRequest, ScaffoldBuilder, TemplateConfig, TemplateRegistry,
};

#[derive(Args, Debug)]
pub struct NewArgs {
    /// The name of the template
    #[arg(short, long)]
    name: String,

    /// Template type: environment or service
    #[arg(short = 't', long = "type", default_value = "environment")]
    kind: TemplateKind,

    /// The directory to output the template to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// The provisioning mode to use: codebuild or awsmanaged
    #[arg(short, long, default_value = "codebuild")]
    provisioning: ProvisioningKind,

    /// The tool to use with codebuild provisioning. Currently, only Terraform is supported
    #[arg(long, default_value = "terraform")]
    tool: IacTool,

    /// The S3 bucket to use for template publishing. Only needed by `publish`
    #[arg(short = 'b', long)]
    publish_bucket: Option<String>,

    /// The S3 bucket to use for storing Terraform remote state. Required
    /// for codebuild provisioning
    #[arg(long)]
    terraform_remote_state_bucket: Option<String>,

    /// Environment templates (name:majorVersion) a service template is
    /// compatible with. Repeat the flag for each one
    #[arg(long = "compatible-env")]
    compatible_envs: Vec<CompatibleEnvironment>,
}

pub async fn execute(args: NewArgs) -> Result<()> {
    info!(
        "Creating {} template `{}` ({} provisioning)",
        args.kind, args.name, args.provisioning
    );

    if args.provisioning == ProvisioningKind::CodeBuild {
        match args.tool {
            IacTool::Terraform => info!("Using {} for infrastructure", args.tool),
        }
    }

    let config = TemplateConfig::new(&args.name, args.kind)
        .with_publish_bucket(args.publish_bucket.clone())
        .with_compatible_environments(
            args.compatible_envs.iter().map(ToString::to_string).collect(),
        );

    let registry = TemplateRegistry::new().context("Failed to load template assets")?;
    let tree = ScaffoldBuilder::new(&registry)
        .scaffold(&NewTemplateRequest {
            config,
            provisioning: args.provisioning,
            remote_state_bucket: args.terraform_remote_state_bucket.clone(),
        })
        .context("Failed to generate template")?;

    tree.write_to(&args.out)
        .with_context(|| format!("Failed to write template to {}", args.out.display()))?;

    println!(
        "template source outputted to {}",
        args.out.join(&args.name).display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> NewArgs {
        let mut argv = vec!["protonizer", "new"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::New(args) => args,
            other => panic!("expected new, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["-n", "net"]);
        assert_eq!(args.kind, TemplateKind::Environment);
        assert_eq!(args.provisioning, ProvisioningKind::CodeBuild);
        assert_eq!(args.out, PathBuf::from("."));
        assert!(args.publish_bucket.is_none());
        assert!(args.terraform_remote_state_bucket.is_none());
    }

    #[test]
    fn test_awsmanaged_service() {
        let args = parse(&[
            "-n",
            "api",
            "-t",
            "service",
            "-p",
            "awsmanaged",
            "-b",
            "templates",
            "--compatible-env",
            "net:1",
        ]);
        assert_eq!(args.kind, TemplateKind::Service);
        assert_eq!(args.provisioning, ProvisioningKind::AwsManaged);
        assert_eq!(args.publish_bucket.as_deref(), Some("templates"));
        assert_eq!(args.compatible_envs.len(), 1);
    }
}
