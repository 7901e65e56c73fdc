//! Error types for publishing.

use thiserror::Error;

use protonizer_templates::TemplateError;

/// Result type alias for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur while bundling and publishing a template.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Invalid publish configuration: {0}")]
    Config(String),

    #[error("Upload to s3://{bucket}/{key} failed: {message}")]
    BlobStore {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Registry { operation: String, message: String },

    #[error("Template version registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Template version was still registering after {attempts} checks ({elapsed_secs}s)")]
    PollExhausted { attempts: u32, elapsed_secs: u64 },

    #[error("Publish cancelled")]
    Cancelled,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl PublishError {
    pub(crate) fn registry(operation: &str, message: impl Into<String>) -> Self {
        PublishError::Registry {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}
