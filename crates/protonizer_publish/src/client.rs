//! Remote service traits and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use protonizer_iac::TemplateKind;
use protonizer_templates::CompatibleEnvironment;

use crate::error::PublishResult;

/// Tag attached to every template protonizer creates.
pub const CREATOR_TAG: (&str, &str) = ("creator", "protonizer-cli");

/// Registration status of a template version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionStatus {
    /// Accepted, registration not started yet.
    Submitted,
    RegistrationInProgress,
    RegistrationFailed,
    Draft,
    Published,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Submitted => "SUBMITTED",
            VersionStatus::RegistrationInProgress => "REGISTRATION_IN_PROGRESS",
            VersionStatus::RegistrationFailed => "REGISTRATION_FAILED",
            VersionStatus::Draft => "DRAFT",
            VersionStatus::Published => "PUBLISHED",
        }
    }

    /// Whether registration is still running.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            VersionStatus::Submitted | VersionStatus::RegistrationInProgress
        )
    }
}

impl std::fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of creating a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// A template to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    pub kind: TemplateKind,
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// Location of an uploaded bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocation {
    pub bucket: String,
    pub key: String,
}

/// A new version to register from an uploaded bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    pub kind: TemplateKind,
    pub template_name: String,
    pub major_version: String,
    pub source: BundleLocation,
    /// Only sent for service templates.
    pub compatible_environments: Vec<CompatibleEnvironment>,
}

/// Identifies one template version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub kind: TemplateKind,
    pub template_name: String,
    pub major_version: String,
    pub minor_version: String,
}

/// A template version as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVersion {
    pub major_version: String,
    pub minor_version: String,
    pub status: VersionStatus,
    pub status_message: Option<String>,
}

/// Object storage the bundle is uploaded to.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `body` at `bucket`/`key`, replacing any existing object.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> PublishResult<()>;
}

/// The template registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Region the client talks to.
    fn region(&self) -> &str;

    /// Create a template. An existing template is reported, not an error.
    async fn create_template(&self, template: &TemplateDefinition) -> PublishResult<CreateOutcome>;

    /// Register a new version from a bundle.
    async fn create_template_version(&self, request: &VersionRequest)
        -> PublishResult<TemplateVersion>;

    async fn get_template_version(&self, version: &VersionRef) -> PublishResult<TemplateVersion>;

    /// Move a version to `status` with a description.
    async fn update_template_version(
        &self,
        version: &VersionRef,
        status: VersionStatus,
        description: &str,
    ) -> PublishResult<TemplateVersion>;
}
