//! Error types for IaC module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during IaC operations.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Invalid template type: {0} (expected environment or service)")]
    InvalidTemplateKind(String),

    #[error("Invalid provisioning: {0} (expected awsmanaged or codebuild)")]
    InvalidProvisioning(String),

    #[error("Unsupported tool: {0} (only terraform is supported)")]
    UnsupportedTool(String),

    #[error("Terraform module not found: {0}")]
    ModuleNotFound(PathBuf),

    #[error("No Terraform files found in {0}")]
    EmptyModule(PathBuf),

    #[error("Failed to parse Terraform in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IacError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IacError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
