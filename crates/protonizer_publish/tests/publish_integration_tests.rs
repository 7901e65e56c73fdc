//! Integration tests for the publish workflow using mock remotes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use protonizer_iac::TemplateKind;
use protonizer_publish::{
    cancel_pair, MockBlobStore, MockRegistry, PollPolicy, PublishError, PublishOptions,
    PublishWorkflow, VersionStatus, BUNDLE_FILE_NAME,
};
use tar::Archive;
use tempfile::{tempdir, TempDir};

const ENV_CONFIG: &str = "\
name: net
type: environment
displayName: net
description: network
publishBucket: templates-bucket
";

const SVC_CONFIG: &str = "\
name: api
type: service
displayName: api
description: service
publishBucket: templates-bucket
compatibleEnvironments:
  - net:1
";

fn template_dir(config: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("proton.yaml"), config).unwrap();
    fs::create_dir_all(dir.path().join("schema")).unwrap();
    fs::write(dir.path().join("schema/schema.yaml"), "schema: {}\n").unwrap();
    fs::create_dir_all(dir.path().join("infrastructure")).unwrap();
    fs::write(dir.path().join("infrastructure/main.tf"), "# main\n").unwrap();
    let config_path = dir.path().join("proton.yaml");
    (dir, config_path)
}

fn fast_options(max_attempts: u32) -> PublishOptions {
    PublishOptions {
        poll: PollPolicy::default()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(max_attempts),
        ..Default::default()
    }
}

async fn publish(
    store: &MockBlobStore,
    registry: &MockRegistry,
    config_path: &Path,
    options: PublishOptions,
) -> Result<protonizer_publish::PublishOutcome, PublishError> {
    let workflow = PublishWorkflow::new(store.clone(), registry.clone(), options);
    let (_handle, signal) = cancel_pair();
    workflow.run(config_path, &signal).await
}

fn archive_paths(data: &[u8]) -> Vec<String> {
    let mut archive = Archive::new(GzDecoder::new(data));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[tokio::test]
async fn test_publish_environment_template() {
    let (dir, config_path) = template_dir(ENV_CONFIG);
    let store = MockBlobStore::new();
    let registry = MockRegistry::new()
        .with_region("eu-west-1")
        .with_minor_version("3")
        .with_statuses(vec![
            (VersionStatus::RegistrationInProgress, None),
            (VersionStatus::RegistrationInProgress, None),
            (VersionStatus::Draft, None),
        ]);

    let outcome = publish(&store, &registry, &config_path, fast_options(10))
        .await
        .unwrap();

    assert_eq!(outcome.template_name, "net");
    assert_eq!(outcome.template_kind, TemplateKind::Environment);
    assert_eq!(outcome.major_version, "1");
    assert_eq!(outcome.minor_version, "3");
    assert_eq!(
        outcome.console_url,
        "https://eu-west-1.console.aws.amazon.com/proton/home#/templates/environments/detail/net"
    );

    let objects = store.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].bucket, "templates-bucket");
    assert_eq!(objects[0].key, "net/bundle.tar.gz");
    assert_eq!(
        archive_paths(&objects[0].body),
        vec!["infrastructure/main.tf", "proton.yaml", "schema/schema.yaml"]
    );
    assert!(!dir.path().join(BUNDLE_FILE_NAME).exists());

    let methods: Vec<_> = registry.get_calls().into_iter().map(|c| c.method).collect();
    assert_eq!(
        methods,
        vec![
            "create_template",
            "create_template_version",
            "get_template_version",
            "get_template_version",
            "get_template_version",
            "update_template_version",
        ]
    );

    let update = &registry.get_method_calls("update_template_version")[0];
    assert_eq!(
        update.detail.as_deref(),
        Some("PUBLISHED: published by protonizer")
    );
}

#[tokio::test]
async fn test_publish_tolerates_existing_template() {
    let (_dir, config_path) = template_dir(SVC_CONFIG);
    let store = MockBlobStore::new();
    let registry = MockRegistry::new().add_existing_template("api");

    let outcome = publish(&store, &registry, &config_path, fast_options(10))
        .await
        .unwrap();

    assert_eq!(outcome.template_kind, TemplateKind::Service);
    assert!(outcome.console_url.ends_with("/templates/services/detail/api"));
    assert_eq!(registry.get_method_calls("update_template_version").len(), 1);
}

#[tokio::test]
async fn test_registration_failure_stops_polling() {
    let (_dir, config_path) = template_dir(SVC_CONFIG);
    let store = MockBlobStore::new();
    let registry = MockRegistry::new().with_statuses(vec![
        (VersionStatus::RegistrationInProgress, None),
        (
            VersionStatus::RegistrationFailed,
            Some("invalid source: schema.yaml not found".to_string()),
        ),
        (VersionStatus::Draft, None),
    ]);

    let result = publish(&store, &registry, &config_path, fast_options(10)).await;

    match result {
        Err(PublishError::RegistrationFailed(message)) => {
            assert_eq!(message, "invalid source: schema.yaml not found")
        }
        other => panic!("expected registration failure, got {:?}", other),
    }
    assert_eq!(registry.get_method_calls("get_template_version").len(), 2);
    assert!(!registry.was_called("update_template_version"));
}

#[tokio::test]
async fn test_poll_exhausted() {
    let (_dir, config_path) = template_dir(ENV_CONFIG);
    let store = MockBlobStore::new();
    let registry =
        MockRegistry::new().with_statuses(vec![(VersionStatus::RegistrationInProgress, None)]);

    let result = publish(&store, &registry, &config_path, fast_options(3)).await;

    assert!(matches!(
        result,
        Err(PublishError::PollExhausted { attempts: 3, .. })
    ));
    assert_eq!(registry.get_method_calls("get_template_version").len(), 3);
    assert!(!registry.was_called("update_template_version"));
}

#[tokio::test]
async fn test_cancelled_publish() {
    let (_dir, config_path) = template_dir(ENV_CONFIG);
    let store = MockBlobStore::new();
    let registry =
        MockRegistry::new().with_statuses(vec![(VersionStatus::RegistrationInProgress, None)]);
    let workflow = PublishWorkflow::new(store.clone(), registry.clone(), PublishOptions::default());

    let (handle, signal) = cancel_pair();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let result = workflow.run(&config_path, &signal).await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(PublishError::Cancelled)));
    assert!(!registry.was_called("update_template_version"));
}

#[tokio::test]
async fn test_missing_publish_bucket() {
    let (dir, config_path) = template_dir("name: net\ntype: environment\ndisplayName: net\ndescription: d\n");
    let store = MockBlobStore::new();
    let registry = MockRegistry::new();

    let result = publish(&store, &registry, &config_path, fast_options(10)).await;

    match result {
        Err(PublishError::Config(message)) => assert!(message.contains("publishBucket")),
        other => panic!("expected config error, got {:?}", other),
    }
    assert!(store.objects().is_empty());
    assert_eq!(registry.call_count(), 0);
    assert!(!dir.path().join(BUNDLE_FILE_NAME).exists());
}

#[tokio::test]
async fn test_malformed_compatible_environment() {
    let config = SVC_CONFIG.replace("net:1", "net");
    let (_dir, config_path) = template_dir(&config);
    let store = MockBlobStore::new();
    let registry = MockRegistry::new();

    let result = publish(&store, &registry, &config_path, fast_options(10)).await;

    assert!(matches!(result, Err(PublishError::Config(_))));
    assert!(store.objects().is_empty());
    assert_eq!(registry.call_count(), 0);
}

#[tokio::test]
async fn test_service_without_compatible_environments() {
    let config = "name: api\ntype: service\ndisplayName: api\ndescription: d\npublishBucket: b\n";
    let (_dir, config_path) = template_dir(config);
    let registry = MockRegistry::new();

    let result = publish(&MockBlobStore::new(), &registry, &config_path, fast_options(10)).await;

    assert!(matches!(result, Err(PublishError::Config(_))));
    assert_eq!(registry.call_count(), 0);
}

#[tokio::test]
async fn test_upload_failure_keeps_local_bundle() {
    let (dir, config_path) = template_dir(ENV_CONFIG);
    let store = MockBlobStore::new().simulate_failure("AccessDenied");
    let registry = MockRegistry::new();

    let result = publish(&store, &registry, &config_path, fast_options(10)).await;

    assert!(matches!(result, Err(PublishError::BlobStore { .. })));
    assert!(dir.path().join(BUNDLE_FILE_NAME).exists());
    assert_eq!(registry.call_count(), 0);
}

#[tokio::test]
async fn test_missing_config_file() {
    let dir = tempdir().unwrap();
    let result = publish(
        &MockBlobStore::new(),
        &MockRegistry::new(),
        &dir.path().join("proton.yaml"),
        fast_options(10),
    )
    .await;
    assert!(matches!(result, Err(PublishError::Template(_))));
}
