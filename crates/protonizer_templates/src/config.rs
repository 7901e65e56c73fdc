//! The `proton.yaml` template descriptor.
//!
//! Every generated template carries a `proton.yaml` at its root. It names
//! the template, records its kind and holds what `publish` needs later:
//! the bucket to upload the bundle to and, for service templates, the
//! environment templates it can be deployed into.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use protonizer_iac::TemplateKind;

use crate::error::{TemplateError, TemplateResult};

/// File name of the template descriptor.
pub const PROTON_YAML_FILE: &str = "proton.yaml";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][0-9A-Za-z_\-]{0,99}$").expect("template name pattern is valid")
    })
}

/// Validate a Proton template name.
pub fn validate_template_name(name: &str) -> TemplateResult<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(TemplateError::InvalidName(name.to_string()))
    }
}

/// An environment template a service template is compatible with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompatibleEnvironment {
    pub template_name: String,
    pub major_version: String,
}

impl FromStr for CompatibleEnvironment {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [name, version] if !name.trim().is_empty() && !version.trim().is_empty() => {
                Ok(CompatibleEnvironment {
                    template_name: name.trim().to_string(),
                    major_version: version.trim().to_string(),
                })
            }
            _ => Err(TemplateError::InvalidCompatibleEnvironment(s.to_string())),
        }
    }
}

impl std::fmt::Display for CompatibleEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.template_name, self.major_version)
    }
}

/// Contents of `proton.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub display_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_bucket: Option<String>,
    /// `name:majorVersion` tokens, kept in the order given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compatible_environments: Vec<String>,
}

impl TemplateConfig {
    pub fn new(name: impl Into<String>, kind: TemplateKind) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            description: format!("A {} template", kind),
            name,
            kind,
            publish_bucket: None,
            compatible_environments: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_publish_bucket(mut self, bucket: Option<String>) -> Self {
        self.publish_bucket = bucket.filter(|b| !b.trim().is_empty());
        self
    }

    pub fn with_compatible_environments(mut self, envs: Vec<String>) -> Self {
        self.compatible_environments = envs;
        self
    }

    /// Parse every compatible environment token.
    pub fn compatible_environment_templates(&self) -> TemplateResult<Vec<CompatibleEnvironment>> {
        self.compatible_environments
            .iter()
            .map(|token| token.parse())
            .collect()
    }

    /// Check name, kind requirements and token format.
    pub fn validate(&self) -> TemplateResult<()> {
        validate_template_name(&self.name)?;

        let envs = self.compatible_environment_templates()?;
        if self.kind.requires_compatible_environments() && envs.is_empty() {
            return Err(TemplateError::InvalidConfig(
                "service templates require at least one compatible environment (name:majorVersion)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Publish bucket, or a configuration error when it is not set.
    pub fn require_publish_bucket(&self) -> TemplateResult<&str> {
        self.publish_bucket.as_deref().ok_or_else(|| {
            TemplateError::InvalidConfig(format!(
                "The `publishBucket` key is not specified in {}. This setting is required for publishing.",
                PROTON_YAML_FILE
            ))
        })
    }

    pub fn to_yaml(&self) -> TemplateResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(content: &str) -> TemplateResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read a descriptor from disk.
    pub fn read_from(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        debug!("Reading template config from {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| TemplateError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }
}
