//! AWS implementations of the blob store and registry.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_proton::error::DisplayErrorContext;
use aws_sdk_proton::types::{
    CompatibleEnvironmentTemplateInput, EnvironmentTemplateVersion, Provisioning, S3ObjectSource,
    ServiceTemplateVersion, Tag, TemplateVersionSourceInput, TemplateVersionStatus,
};
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, warn};

use protonizer_iac::TemplateKind;

use crate::client::{
    BlobStore, CreateOutcome, RegistryClient, TemplateDefinition, TemplateVersion, VersionRef,
    VersionRequest, VersionStatus, CREATOR_TAG,
};
use crate::error::{PublishError, PublishResult};

/// Load the shared AWS configuration from the standard provider chain.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest()).load().await
}

/// S3-backed [`BlobStore`].
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
}

impl S3BlobStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> PublishResult<()> {
        debug!("Uploading {} bytes to s3://{}/{}", body.len(), bucket, key);
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| PublishError::BlobStore {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

/// AWS Proton-backed [`RegistryClient`].
///
/// Every operation dispatches to the environment or service flavour of the
/// Proton API based on the template kind.
#[derive(Debug, Clone)]
pub struct ProtonRegistryClient {
    client: aws_sdk_proton::Client,
    region: String,
}

impl ProtonRegistryClient {
    pub fn new(config: &SdkConfig) -> PublishResult<Self> {
        let region = config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| {
                PublishError::Config(
                    "no AWS region configured; set AWS_REGION or a profile region".to_string(),
                )
            })?;

        Ok(Self {
            client: aws_sdk_proton::Client::new(config),
            region,
        })
    }
}

fn creator_tag() -> PublishResult<Tag> {
    Tag::builder()
        .key(CREATOR_TAG.0)
        .value(CREATOR_TAG.1)
        .build()
        .map_err(|e| PublishError::registry("build tag", e.to_string()))
}

fn sdk_error<E>(operation: &str, err: E) -> PublishError
where
    E: std::error::Error,
{
    PublishError::registry(operation, DisplayErrorContext(&err).to_string())
}

fn status_from_sdk(status: &TemplateVersionStatus) -> VersionStatus {
    match status {
        TemplateVersionStatus::RegistrationInProgress => VersionStatus::RegistrationInProgress,
        TemplateVersionStatus::RegistrationFailed => VersionStatus::RegistrationFailed,
        TemplateVersionStatus::Draft => VersionStatus::Draft,
        TemplateVersionStatus::Published => VersionStatus::Published,
        other => {
            warn!("Unrecognised template version status: {}", other.as_str());
            VersionStatus::Submitted
        }
    }
}

fn status_to_sdk(status: VersionStatus) -> PublishResult<TemplateVersionStatus> {
    match status {
        VersionStatus::Draft => Ok(TemplateVersionStatus::Draft),
        VersionStatus::Published => Ok(TemplateVersionStatus::Published),
        other => Err(PublishError::Config(format!(
            "a template version cannot be moved to {}",
            other
        ))),
    }
}

fn from_environment_version(v: &EnvironmentTemplateVersion) -> TemplateVersion {
    TemplateVersion {
        major_version: v.major_version().to_string(),
        minor_version: v.minor_version().to_string(),
        status: status_from_sdk(v.status()),
        status_message: v.status_message().map(str::to_string),
    }
}

fn from_service_version(v: &ServiceTemplateVersion) -> TemplateVersion {
    TemplateVersion {
        major_version: v.major_version().to_string(),
        minor_version: v.minor_version().to_string(),
        status: status_from_sdk(v.status()),
        status_message: v.status_message().map(str::to_string),
    }
}

fn missing_version(operation: &str) -> PublishError {
    PublishError::registry(operation, "response did not include a template version")
}

#[async_trait]
impl RegistryClient for ProtonRegistryClient {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_template(&self, template: &TemplateDefinition) -> PublishResult<CreateOutcome> {
        let tag = creator_tag()?;

        let conflict = match template.kind {
            TemplateKind::Environment => {
                let op = "CreateEnvironmentTemplate";
                debug!("proton.{}({})", op, template.name);
                match self
                    .client
                    .create_environment_template()
                    .name(&template.name)
                    .display_name(&template.display_name)
                    .description(&template.description)
                    .tags(tag)
                    .send()
                    .await
                {
                    Ok(_) => false,
                    Err(e) if matches!(e.as_service_error(), Some(s) if s.is_conflict_exception()) => {
                        debug!("Template {} already exists", template.name);
                        true
                    }
                    Err(e) => return Err(sdk_error(op, e)),
                }
            }
            TemplateKind::Service => {
                let op = "CreateServiceTemplate";
                debug!("proton.{}({})", op, template.name);
                match self
                    .client
                    .create_service_template()
                    .name(&template.name)
                    .display_name(&template.display_name)
                    .description(&template.description)
                    .pipeline_provisioning(Provisioning::CustomerManaged)
                    .tags(tag)
                    .send()
                    .await
                {
                    Ok(_) => false,
                    Err(e) if matches!(e.as_service_error(), Some(s) if s.is_conflict_exception()) => {
                        debug!("Template {} already exists", template.name);
                        true
                    }
                    Err(e) => return Err(sdk_error(op, e)),
                }
            }
        };

        Ok(if conflict {
            CreateOutcome::AlreadyExists
        } else {
            CreateOutcome::Created
        })
    }

    async fn create_template_version(
        &self,
        request: &VersionRequest,
    ) -> PublishResult<TemplateVersion> {
        let source = S3ObjectSource::builder()
            .bucket(&request.source.bucket)
            .key(&request.source.key)
            .build()
            .map_err(|e| PublishError::registry("build version source", e.to_string()))?;
        let source = TemplateVersionSourceInput::S3(source);

        match request.kind {
            TemplateKind::Environment => {
                let op = "CreateEnvironmentTemplateVersion";
                debug!("proton.{}({})", op, request.template_name);
                let output = self
                    .client
                    .create_environment_template_version()
                    .template_name(&request.template_name)
                    .major_version(&request.major_version)
                    .source(source)
                    .send()
                    .await
                    .map_err(|e| sdk_error(op, e))?;
                output
                    .environment_template_version()
                    .map(from_environment_version)
                    .ok_or_else(|| missing_version(op))
            }
            TemplateKind::Service => {
                let op = "CreateServiceTemplateVersion";
                debug!("proton.{}({})", op, request.template_name);
                let compatible = request
                    .compatible_environments
                    .iter()
                    .map(|env| {
                        CompatibleEnvironmentTemplateInput::builder()
                            .template_name(&env.template_name)
                            .major_version(&env.major_version)
                            .build()
                            .map_err(|e| PublishError::registry(op, e.to_string()))
                    })
                    .collect::<PublishResult<Vec<_>>>()?;

                let output = self
                    .client
                    .create_service_template_version()
                    .template_name(&request.template_name)
                    .major_version(&request.major_version)
                    .source(source)
                    .set_compatible_environment_templates(Some(compatible))
                    .send()
                    .await
                    .map_err(|e| sdk_error(op, e))?;
                output
                    .service_template_version()
                    .map(from_service_version)
                    .ok_or_else(|| missing_version(op))
            }
        }
    }

    async fn get_template_version(&self, version: &VersionRef) -> PublishResult<TemplateVersion> {
        match version.kind {
            TemplateKind::Environment => {
                let op = "GetEnvironmentTemplateVersion";
                let output = self
                    .client
                    .get_environment_template_version()
                    .template_name(&version.template_name)
                    .major_version(&version.major_version)
                    .minor_version(&version.minor_version)
                    .send()
                    .await
                    .map_err(|e| sdk_error(op, e))?;
                output
                    .environment_template_version()
                    .map(from_environment_version)
                    .ok_or_else(|| missing_version(op))
            }
            TemplateKind::Service => {
                let op = "GetServiceTemplateVersion";
                let output = self
                    .client
                    .get_service_template_version()
                    .template_name(&version.template_name)
                    .major_version(&version.major_version)
                    .minor_version(&version.minor_version)
                    .send()
                    .await
                    .map_err(|e| sdk_error(op, e))?;
                output
                    .service_template_version()
                    .map(from_service_version)
                    .ok_or_else(|| missing_version(op))
            }
        }
    }

    async fn update_template_version(
        &self,
        version: &VersionRef,
        status: VersionStatus,
        description: &str,
    ) -> PublishResult<TemplateVersion> {
        let status = status_to_sdk(status)?;

        match version.kind {
            TemplateKind::Environment => {
                let op = "UpdateEnvironmentTemplateVersion";
                debug!("proton.{}({})", op, version.template_name);
                let output = self
                    .client
                    .update_environment_template_version()
                    .template_name(&version.template_name)
                    .major_version(&version.major_version)
                    .minor_version(&version.minor_version)
                    .status(status)
                    .description(description)
                    .send()
                    .await
                    .map_err(|e| sdk_error(op, e))?;
                output
                    .environment_template_version()
                    .map(from_environment_version)
                    .ok_or_else(|| missing_version(op))
            }
            TemplateKind::Service => {
                let op = "UpdateServiceTemplateVersion";
                debug!("proton.{}({})", op, version.template_name);
                let output = self
                    .client
                    .update_service_template_version()
                    .template_name(&version.template_name)
                    .major_version(&version.major_version)
                    .minor_version(&version.minor_version)
                    .status(status)
                    .description(description)
                    .send()
                    .await
                    .map_err(|e| sdk_error(op, e))?;
                output
                    .service_template_version()
                    .map(from_service_version)
                    .ok_or_else(|| missing_version(op))
            }
        }
    }
}
