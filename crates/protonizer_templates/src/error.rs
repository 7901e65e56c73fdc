//! Error types for templates.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template config: {0}")]
    InvalidConfig(String),

    #[error("Invalid template name `{0}`: must start with a letter and contain only letters, digits, `-` and `_`")]
    InvalidName(String),

    #[error("Invalid compatible environment `{0}`: expected the format name:majorVersion")]
    InvalidCompatibleEnvironment(String),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Duplicate output path: {0}")]
    DuplicatePath(String),

    #[error("Template rendering failed: {0}")]
    Render(#[from] minijinja::Error),

    #[error("Could not read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
