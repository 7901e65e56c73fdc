//! # protonizer_publish
//!
//! Template publishing for protonizer.
//!
//! This crate takes a generated template directory and registers it with
//! AWS Proton:
//!
//! - **Bundling**: deterministic `bundle.tar.gz` of the template directory
//! - **Remote seams**: `BlobStore` and `RegistryClient` traits with AWS
//!   implementations
//! - **Polling**: bounded, cancellable wait for registration
//! - **Mocks**: in-memory blob store and scripted registry for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use protonizer_publish::{
//!     cancel_pair, load_sdk_config, ProtonRegistryClient, PublishOptions, PublishWorkflow,
//!     S3BlobStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sdk_config = load_sdk_config().await;
//!     let workflow = PublishWorkflow::new(
//!         S3BlobStore::new(&sdk_config),
//!         ProtonRegistryClient::new(&sdk_config)?,
//!         PublishOptions::default(),
//!     );
//!
//!     let (_handle, signal) = cancel_pair();
//!     let outcome = workflow.run(Path::new("my-env/proton.yaml"), &signal).await?;
//!     println!("{}", outcome.console_url);
//!
//!     Ok(())
//! }
//! ```

pub mod aws;
pub mod bundle;
pub mod client;
pub mod error;
pub mod mock;
pub mod poll;
pub mod workflow;

pub use aws::{load_sdk_config, ProtonRegistryClient, S3BlobStore};
pub use bundle::{bundle_key, Bundle, BUNDLE_FILE_NAME};
pub use client::{
    BlobStore, BundleLocation, CreateOutcome, RegistryClient, TemplateDefinition,
    TemplateVersion, VersionRef, VersionRequest, VersionStatus, CREATOR_TAG,
};
pub use error::{PublishError, PublishResult};
pub use mock::{CapturedCall, MockBlobStore, MockRegistry, StoredObject};
pub use poll::{cancel_pair, poll_until, CancelHandle, CancelSignal, PollPolicy, PollStep};
pub use workflow::{
    console_url, PublishOptions, PublishOutcome, PublishTarget, PublishWorkflow,
    DEFAULT_MAJOR_VERSION, PUBLISHED_DESCRIPTION,
};
