//! Template and provisioning kind definitions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IacError;

/// Proton template kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Environment,
    Service,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Environment => "environment",
            TemplateKind::Service => "service",
        }
    }

    /// Short form used to select template variants.
    pub fn shorthand(&self) -> &'static str {
        match self {
            TemplateKind::Environment => "env",
            TemplateKind::Service => "svc",
        }
    }

    /// Directory holding the infrastructure files of this kind.
    pub fn infrastructure_dir(&self) -> &'static str {
        match self {
            TemplateKind::Environment => "infrastructure",
            TemplateKind::Service => "instance_infrastructure",
        }
    }

    /// Terraform variable Proton populates with the resource being provisioned.
    pub fn input_namespace(&self) -> &'static str {
        match self {
            TemplateKind::Environment => "environment",
            TemplateKind::Service => "service_instance",
        }
    }

    /// Variable names Proton supplies itself. These never become schema inputs.
    pub fn reserved_variables(&self) -> &'static [&'static str] {
        match self {
            TemplateKind::Environment => &["name"],
            TemplateKind::Service => &["name", "environment"],
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_variables().contains(&name)
    }

    /// Expression a reserved variable is bound to in the generated entry point.
    pub fn context_binding(&self, name: &str) -> Option<&'static str> {
        match (self, name) {
            (TemplateKind::Environment, "name") => Some("var.environment.name"),
            (TemplateKind::Service, "name") => Some("var.service_instance.name"),
            (TemplateKind::Service, "environment") => Some("var.environment.name"),
            _ => None,
        }
    }

    /// Whether a template of this kind must list compatible environments.
    pub fn requires_compatible_environments(&self) -> bool {
        match self {
            TemplateKind::Environment => false,
            TemplateKind::Service => true,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![TemplateKind::Environment, TemplateKind::Service]
    }
}

impl Default for TemplateKind {
    fn default() -> Self {
        Self::Environment
    }
}

impl FromStr for TemplateKind {
    type Err = IacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "environment" => Ok(TemplateKind::Environment),
            "service" => Ok(TemplateKind::Service),
            _ => Err(IacError::InvalidTemplateKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How Proton provisions the template's infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisioningKind {
    /// Proton renders and deploys CloudFormation itself.
    AwsManaged,
    /// Proton hands off to a CodeBuild job that runs the IaC tool.
    CodeBuild,
}

impl ProvisioningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningKind::AwsManaged => "awsmanaged",
            ProvisioningKind::CodeBuild => "codebuild",
        }
    }
}

impl Default for ProvisioningKind {
    fn default() -> Self {
        Self::CodeBuild
    }
}

impl FromStr for ProvisioningKind {
    type Err = IacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "awsmanaged" => Ok(ProvisioningKind::AwsManaged),
            "codebuild" => Ok(ProvisioningKind::CodeBuild),
            _ => Err(IacError::InvalidProvisioning(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProvisioningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// IaC tools a CodeBuild template can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IacTool {
    Terraform,
}

impl IacTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            IacTool::Terraform => "terraform",
        }
    }
}

impl Default for IacTool {
    fn default() -> Self {
        Self::Terraform
    }
}

impl FromStr for IacTool {
    type Err = IacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terraform" => Ok(IacTool::Terraform),
            _ => Err(IacError::UnsupportedTool(s.to_string())),
        }
    }
}

impl std::fmt::Display for IacTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
