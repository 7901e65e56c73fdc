//! Protonize command - Wrap an existing Terraform module as a Proton template.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use protonizer_iac::{IacTool, ModuleAnalyzer, ProvisioningKind, TemplateKind, TypeMapper};
use protonizer_templates::{
    protonized_description, CompatibleEnvironment, ProtonizeRequest, ScaffoldBuilder,
    TemplateConfig, TemplateRegistry, PROTON_YAML_FILE,
};

use super::publish::{publish_template, PollArgs};

#[derive(Args, Debug)]
pub struct ProtonizeArgs {
    /// The name of the template
    #[arg(short, long)]
    name: String,

    /// Template type: environment or service
    #[arg(short = 't', long = "type", default_value = "environment")]
    kind: TemplateKind,

    /// The source directory of the Terraform module to parse
    #[arg(short = 's', long)]
    dir: PathBuf,

    /// The directory to output the protonized template
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// The provisioning mode to use
    #[arg(short, long, default_value = "codebuild")]
    provisioning: ProvisioningKind,

    /// The tool to use. Currently, only Terraform is supported
    #[arg(long, default_value = "terraform")]
    tool: IacTool,

    /// The S3 bucket to use for storing Terraform remote state
    #[arg(short, long)]
    bucket: String,

    /// The S3 bucket to upload template bundles to when publishing
    #[arg(long)]
    publish_bucket: Option<String>,

    /// Environment templates (name:majorVersion) a service template is
    /// compatible with. Repeat the flag for each one
    #[arg(long = "compatible-env")]
    compatible_envs: Vec<CompatibleEnvironment>,

    /// Publish the template after generating it
    #[arg(long)]
    publish: bool,

    #[command(flatten)]
    poll: PollArgs,
}

pub async fn execute(args: ProtonizeArgs) -> Result<()> {
    info!("Protonizing {:?} as {} template `{}`", args.dir, args.kind, args.name);

    let source = match args.tool {
        IacTool::Terraform => "Terraform module",
    };

    let module = ModuleAnalyzer::load(&args.dir)
        .with_context(|| format!("Failed to parse {} in {}", source, args.dir.display()))?;
    let mapped = TypeMapper::new(args.kind).map_all(&module.variables);
    if !mapped.warnings.is_empty() {
        info!(
            "{} variable(s) were skipped because their types are not supported",
            mapped.warnings.len()
        );
    }

    let config = TemplateConfig::new(&args.name, args.kind)
        .with_description(protonized_description(args.kind, &args.name))
        .with_publish_bucket(args.publish_bucket.clone())
        .with_compatible_environments(
            args.compatible_envs.iter().map(ToString::to_string).collect(),
        );

    let registry = TemplateRegistry::new().context("Failed to load template assets")?;
    let tree = ScaffoldBuilder::new(&registry)
        .protonize(&ProtonizeRequest {
            config,
            provisioning: args.provisioning,
            remote_state_bucket: Some(args.bucket.clone()),
            variables: mapped,
            outputs: module.outputs,
            source_dir: args.dir.clone(),
        })
        .context("Failed to generate template")?;

    tree.write_to(&args.out)
        .with_context(|| format!("Failed to write template to {}", args.out.display()))?;

    let template_dir = args.out.join(&args.name);
    println!("template source outputted to {}", template_dir.display());

    if args.publish {
        publish_template(&template_dir.join(PROTON_YAML_FILE), args.poll.policy()).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<ProtonizeArgs, clap::Error> {
        let mut argv = vec!["protonizer", "protonize"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv)?.command {
            Commands::Protonize(args) => Ok(args),
            other => panic!("expected protonize, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["-n", "vpc", "-s", "./modules/vpc", "-b", "state"]).unwrap();
        assert_eq!(args.kind, TemplateKind::Environment);
        assert_eq!(args.provisioning, ProvisioningKind::CodeBuild);
        assert_eq!(args.tool, IacTool::Terraform);
        assert_eq!(args.out, PathBuf::from("."));
        assert!(args.compatible_envs.is_empty());
        assert!(!args.publish);
    }

    #[test]
    fn test_service_with_compatible_envs() {
        let args = parse(&[
            "--name",
            "api",
            "--type",
            "service",
            "--dir",
            "./api",
            "--bucket",
            "state",
            "--compatible-env",
            "net:1",
            "--compatible-env",
            "shared:2",
        ])
        .unwrap();
        assert_eq!(args.kind, TemplateKind::Service);
        let envs: Vec<String> = args.compatible_envs.iter().map(|e| e.to_string()).collect();
        assert_eq!(envs, vec!["net:1", "shared:2"]);
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(parse(&["-n", "x", "-s", ".", "-b", "s", "-t", "database"]).is_err());
        assert!(parse(&["-n", "x", "-s", ".", "-b", "s", "-p", "jenkins"]).is_err());
        assert!(parse(&["-n", "x", "-s", ".", "-b", "s", "--tool", "pulumi"]).is_err());
        assert!(parse(&["-n", "x", "-s", ".", "-b", "s", "--compatible-env", "net"]).is_err());
    }

    #[test]
    fn test_bucket_is_required() {
        assert!(parse(&["-n", "x", "-s", "."]).is_err());
    }
}
