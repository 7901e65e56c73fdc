//! Publish command - Register a generated template with AWS Proton.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use protonizer_publish::{
    cancel_pair, load_sdk_config, PollPolicy, ProtonRegistryClient, PublishOptions,
    PublishTarget, PublishWorkflow, S3BlobStore,
};

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// The proton.yaml file of the template to publish
    #[arg(short, long, default_value = "proton.yaml")]
    file: PathBuf,

    #[command(flatten)]
    poll: PollArgs,
}

/// Registration polling limits.
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds between registration status checks
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,

    /// Maximum number of status checks
    #[arg(long, default_value_t = 450)]
    max_attempts: u32,

    /// Give up waiting for registration after this many seconds
    #[arg(long, default_value_t = 900)]
    timeout: u64,
}

impl PollArgs {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::default()
            .with_interval(Duration::from_secs(self.poll_interval))
            .with_max_attempts(self.max_attempts)
            .with_timeout(Duration::from_secs(self.timeout))
    }
}

pub async fn execute(args: PublishArgs) -> Result<()> {
    publish_template(&args.file, args.poll.policy()).await
}

/// Publish the template described by `config_path` using the ambient AWS
/// credentials. Ctrl-C cancels a pending registration wait.
pub async fn publish_template(config_path: &Path, poll: PollPolicy) -> Result<()> {
    info!("Publishing template from {:?}", config_path);

    // Configuration problems are reported before any AWS client is built.
    PublishTarget::load(config_path)
        .with_context(|| format!("Invalid template configuration: {}", config_path.display()))?;

    let sdk_config = load_sdk_config().await;
    let registry =
        ProtonRegistryClient::new(&sdk_config).context("Failed to configure AWS Proton client")?;
    let workflow = PublishWorkflow::new(
        S3BlobStore::new(&sdk_config),
        registry,
        PublishOptions {
            poll,
            ..Default::default()
        },
    );

    let (handle, signal) = cancel_pair();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling publish");
            handle.cancel();
        }
    });

    let result = workflow.run(config_path, &signal).await;
    interrupt.abort();

    let outcome = result.context("Failed to publish template")?;
    println!(
        "published {}:{}.{}",
        outcome.template_name, outcome.major_version, outcome.minor_version
    );
    println!("{}", outcome.console_url);

    Ok(())
}
