//! Mock blob store and registry for testing.
//!
//! Both mocks capture every call and return scripted responses, so the
//! publish workflow can be exercised without AWS credentials.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::{
    BlobStore, CreateOutcome, RegistryClient, TemplateDefinition, TemplateVersion, VersionRef,
    VersionRequest, VersionStatus,
};
use crate::error::{PublishError, PublishResult};

/// An object stored by [`MockBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

/// In-memory blob store.
#[derive(Clone, Default)]
pub struct MockBlobStore {
    objects: Arc<RwLock<Vec<StoredObject>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every upload with `message`.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.read().clone()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> PublishResult<()> {
        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(PublishError::BlobStore {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            });
        }

        self.objects.write().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
        });
        Ok(())
    }
}

/// Captured registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub method: String,
    pub template_name: String,
    /// Method-specific detail, e.g. the bundle location or target status.
    pub detail: Option<String>,
}

/// Scripted registry.
///
/// `get_template_version` walks through the scripted statuses and keeps
/// returning the last one once the script is exhausted.
#[derive(Clone)]
pub struct MockRegistry {
    region: String,
    minor_version: Arc<RwLock<String>>,
    existing_templates: Arc<RwLock<Vec<String>>>,
    statuses: Arc<RwLock<Vec<(VersionStatus, Option<String>)>>>,
    status_index: Arc<AtomicUsize>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            region: "us-east-1".to_string(),
            minor_version: Arc::new(RwLock::new("0".to_string())),
            existing_templates: Arc::new(RwLock::new(Vec::new())),
            statuses: Arc::new(RwLock::new(vec![(VersionStatus::Draft, None)])),
            status_index: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_minor_version(self, minor: impl Into<String>) -> Self {
        *self.minor_version.write() = minor.into();
        self
    }

    /// Make `create_template` report the template as already existing.
    pub fn add_existing_template(self, name: impl Into<String>) -> Self {
        self.existing_templates.write().push(name.into());
        self
    }

    /// Statuses returned by successive `get_template_version` calls.
    pub fn with_statuses(self, statuses: Vec<(VersionStatus, Option<String>)>) -> Self {
        *self.statuses.write() = statuses;
        self
    }

    /// Fail calls to `method` with a registry error.
    pub fn fail_method(self, method: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.write().insert(method.into(), message.into());
        self
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.method == method)
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    fn record_call(&self, method: &str, template_name: &str, detail: Option<String>) {
        self.captured_calls.write().push(CapturedCall {
            method: method.to_string(),
            template_name: template_name.to_string(),
            detail,
        });
    }

    fn check_failure(&self, method: &str) -> PublishResult<()> {
        match self.failures.read().get(method) {
            Some(message) => Err(PublishError::registry(method, message.clone())),
            None => Ok(()),
        }
    }

    fn next_status(&self) -> (VersionStatus, Option<String>) {
        let statuses = self.statuses.read();
        let index = self.status_index.fetch_add(1, Ordering::SeqCst);
        statuses
            .get(index.min(statuses.len().saturating_sub(1)))
            .cloned()
            .unwrap_or((VersionStatus::Draft, None))
    }

    fn version(&self, major: &str, status: VersionStatus, message: Option<String>) -> TemplateVersion {
        TemplateVersion {
            major_version: major.to_string(),
            minor_version: self.minor_version.read().clone(),
            status,
            status_message: message,
        }
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_template(&self, template: &TemplateDefinition) -> PublishResult<CreateOutcome> {
        self.record_call("create_template", &template.name, Some(template.kind.to_string()));
        self.check_failure("create_template")?;

        let mut existing = self.existing_templates.write();
        if existing.contains(&template.name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        existing.push(template.name.clone());
        Ok(CreateOutcome::Created)
    }

    async fn create_template_version(
        &self,
        request: &VersionRequest,
    ) -> PublishResult<TemplateVersion> {
        self.record_call(
            "create_template_version",
            &request.template_name,
            Some(format!("s3://{}/{}", request.source.bucket, request.source.key)),
        );
        self.check_failure("create_template_version")?;

        Ok(self.version(&request.major_version, VersionStatus::RegistrationInProgress, None))
    }

    async fn get_template_version(&self, version: &VersionRef) -> PublishResult<TemplateVersion> {
        self.record_call(
            "get_template_version",
            &version.template_name,
            Some(format!("{}.{}", version.major_version, version.minor_version)),
        );
        self.check_failure("get_template_version")?;

        let (status, message) = self.next_status();
        Ok(self.version(&version.major_version, status, message))
    }

    async fn update_template_version(
        &self,
        version: &VersionRef,
        status: VersionStatus,
        description: &str,
    ) -> PublishResult<TemplateVersion> {
        self.record_call(
            "update_template_version",
            &version.template_name,
            Some(format!("{}: {}", status, description)),
        );
        self.check_failure("update_template_version")?;

        Ok(self.version(&version.major_version, status, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BundleLocation;
    use protonizer_iac::TemplateKind;

    fn definition(name: &str) -> TemplateDefinition {
        TemplateDefinition {
            kind: TemplateKind::Environment,
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
        }
    }

    fn version_ref() -> VersionRef {
        VersionRef {
            kind: TemplateKind::Environment,
            template_name: "t".to_string(),
            major_version: "1".to_string(),
            minor_version: "0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_blob_store_records_objects() {
        let store = MockBlobStore::new();
        store.put("bucket", "t/bundle.tar.gz", vec![1, 2, 3]).await.unwrap();

        let objects = store.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "t/bundle.tar.gz");
        assert_eq!(objects[0].body, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_mock_blob_store_failure() {
        let store = MockBlobStore::new().simulate_failure("access denied");
        let result = store.put("bucket", "key", Vec::new()).await;
        assert!(matches!(result, Err(PublishError::BlobStore { .. })));
        assert!(store.objects().is_empty());
    }

    #[tokio::test]
    async fn test_mock_registry_existing_template() {
        let registry = MockRegistry::new().add_existing_template("t");
        assert_eq!(
            registry.create_template(&definition("t")).await.unwrap(),
            CreateOutcome::AlreadyExists
        );
        assert_eq!(
            registry.create_template(&definition("u")).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(registry.get_method_calls("create_template").len(), 2);
    }

    #[tokio::test]
    async fn test_mock_registry_status_script() {
        let registry = MockRegistry::new().with_statuses(vec![
            (VersionStatus::RegistrationInProgress, None),
            (VersionStatus::Draft, None),
        ]);

        let statuses = [
            registry.get_template_version(&version_ref()).await.unwrap().status,
            registry.get_template_version(&version_ref()).await.unwrap().status,
            registry.get_template_version(&version_ref()).await.unwrap().status,
        ];
        assert_eq!(
            statuses,
            [
                VersionStatus::RegistrationInProgress,
                VersionStatus::Draft,
                VersionStatus::Draft
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_registry_method_failure() {
        let registry = MockRegistry::new().fail_method("create_template_version", "ValidationException");
        let request = VersionRequest {
            kind: TemplateKind::Environment,
            template_name: "t".to_string(),
            major_version: "1".to_string(),
            source: BundleLocation {
                bucket: "b".to_string(),
                key: "t/bundle.tar.gz".to_string(),
            },
            compatible_environments: Vec::new(),
        };

        let result = registry.create_template_version(&request).await;
        assert!(matches!(result, Err(PublishError::Registry { .. })));
        assert!(registry.was_called("create_template_version"));
    }
}
