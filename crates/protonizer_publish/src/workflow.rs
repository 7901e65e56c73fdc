//! The publish workflow: bundle, upload, register, wait, publish.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use protonizer_iac::TemplateKind;
use protonizer_templates::{CompatibleEnvironment, TemplateConfig};

use crate::bundle::{bundle_key, Bundle};
use crate::client::{
    BlobStore, BundleLocation, CreateOutcome, RegistryClient, TemplateDefinition, VersionRef,
    VersionRequest, VersionStatus,
};
use crate::error::{PublishError, PublishResult};
use crate::poll::{poll_until, CancelSignal, PollPolicy, PollStep};

/// Major version every publish registers under.
pub const DEFAULT_MAJOR_VERSION: &str = "1";

/// Description attached to published versions.
pub const PUBLISHED_DESCRIPTION: &str = "published by protonizer";

/// Console URL of a template.
pub fn console_url(region: &str, kind: TemplateKind, name: &str) -> String {
    format!(
        "https://{}.console.aws.amazon.com/proton/home#/templates/{}s/detail/{}",
        region, kind, name
    )
}

/// Workflow options.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub poll: PollPolicy,
    pub major_version: String,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            major_version: DEFAULT_MAJOR_VERSION.to_string(),
        }
    }
}

/// A published template version.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub template_name: String,
    pub template_kind: TemplateKind,
    pub major_version: String,
    pub minor_version: String,
    pub console_url: String,
    pub published_at: DateTime<Utc>,
}

/// A `proton.yaml` that passed publish validation.
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub config: TemplateConfig,
    pub bucket: String,
    pub compatible_environments: Vec<CompatibleEnvironment>,
    /// Directory archived into the bundle.
    pub template_dir: PathBuf,
}

impl PublishTarget {
    /// Read and validate a template descriptor.
    ///
    /// Fails before any remote call if the publish bucket is missing, a
    /// compatible environment token is malformed, or a service template
    /// lists no compatible environments.
    pub fn load(config_path: &Path) -> PublishResult<Self> {
        let config = TemplateConfig::read_from(config_path)?;
        let config_error = |e: protonizer_templates::TemplateError| PublishError::Config(e.to_string());

        let bucket = config.require_publish_bucket().map_err(config_error)?.to_string();
        config.validate().map_err(config_error)?;

        let compatible_environments = match config.kind {
            TemplateKind::Service => config
                .compatible_environment_templates()
                .map_err(config_error)?,
            TemplateKind::Environment => Vec::new(),
        };

        let template_dir = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            config,
            bucket,
            compatible_environments,
            template_dir,
        })
    }
}

/// Publishes a template directory through a blob store and registry.
pub struct PublishWorkflow<B, R> {
    blob_store: B,
    registry: R,
    options: PublishOptions,
}

impl<B: BlobStore, R: RegistryClient> PublishWorkflow<B, R> {
    pub fn new(blob_store: B, registry: R, options: PublishOptions) -> Self {
        Self {
            blob_store,
            registry,
            options,
        }
    }

    /// Publish the template described by `config_path`.
    pub async fn run(
        &self,
        config_path: &Path,
        cancel: &CancelSignal,
    ) -> PublishResult<PublishOutcome> {
        let target = PublishTarget::load(config_path)?;
        let config = &target.config;
        info!("Publishing {} template `{}`", config.kind, config.name);

        let bundle = Bundle::create(&target.template_dir)?;
        let location = BundleLocation {
            bucket: target.bucket.clone(),
            key: bundle_key(&config.name),
        };
        info!(
            "Uploading template bundle to s3://{}/{}",
            location.bucket, location.key
        );
        self.blob_store
            .put(&location.bucket, &location.key, bundle.data.clone())
            .await?;
        bundle.remove()?;

        let definition = TemplateDefinition {
            kind: config.kind,
            name: config.name.clone(),
            display_name: config.display_name.clone(),
            description: config.description.clone(),
        };
        match self.registry.create_template(&definition).await? {
            CreateOutcome::Created => info!("Created template `{}`", config.name),
            CreateOutcome::AlreadyExists => {
                info!("Template `{}` already exists, adding a new version", config.name)
            }
        }

        let created = self
            .registry
            .create_template_version(&VersionRequest {
                kind: config.kind,
                template_name: config.name.clone(),
                major_version: self.options.major_version.clone(),
                source: location,
                compatible_environments: target.compatible_environments.clone(),
            })
            .await?;
        debug!(
            "Created version {}.{} ({})",
            created.major_version, created.minor_version, created.status
        );

        let mut version = VersionRef {
            kind: config.kind,
            template_name: config.name.clone(),
            major_version: self.options.major_version.clone(),
            minor_version: created.minor_version,
        };

        info!("Waiting for registration to complete");
        version.minor_version = self.wait_for_draft(&version, cancel).await?;

        self.registry
            .update_template_version(&version, VersionStatus::Published, PUBLISHED_DESCRIPTION)
            .await?;
        info!(
            "Published {}:{}.{}",
            config.name, version.major_version, version.minor_version
        );

        Ok(PublishOutcome {
            template_name: config.name.clone(),
            template_kind: config.kind,
            major_version: version.major_version,
            minor_version: version.minor_version,
            console_url: console_url(self.registry.region(), config.kind, &config.name),
            published_at: Utc::now(),
        })
    }

    /// Poll until the version leaves registration. Returns its minor version.
    async fn wait_for_draft(
        &self,
        version: &VersionRef,
        cancel: &CancelSignal,
    ) -> PublishResult<String> {
        let registry = &self.registry;

        poll_until(&self.options.poll, cancel, |attempt| async move {
            let current = registry.get_template_version(version).await?;
            debug!(
                "Poll {}: version {}.{} is {}",
                attempt, current.major_version, current.minor_version, current.status
            );
            if let Some(message) = &current.status_message {
                debug!("{}", message);
            }

            match current.status {
                VersionStatus::Submitted | VersionStatus::RegistrationInProgress => {
                    Ok(PollStep::Pending)
                }
                VersionStatus::RegistrationFailed => Err(PublishError::RegistrationFailed(
                    current.status_message.unwrap_or_default(),
                )),
                VersionStatus::Draft | VersionStatus::Published => {
                    Ok(PollStep::Done(current.minor_version))
                }
            }
        })
        .await
    }
}
