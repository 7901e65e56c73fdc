//! Data records rendered into the template assets.
//!
//! Each asset is rendered against exactly one of these records. They are
//! plain views over already-mapped data; building them never changes a
//! value, it only selects what an asset needs.

use serde::Serialize;

use protonizer_iac::{
    ContextBinding, MappedVariables, ModuleOutput, ProvisioningKind, SchemaVariable, TemplateKind,
};

/// Static configuration embedded into the registry manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateManifest {
    pub template_name: String,
    pub template_kind: TemplateKind,
    pub provisioning_kind: ProvisioningKind,
    /// Bucket holding Terraform remote state. Required for CodeBuild provisioning.
    pub remote_state_bucket: Option<String>,
}

impl TemplateManifest {
    pub fn new(
        template_name: impl Into<String>,
        template_kind: TemplateKind,
        provisioning_kind: ProvisioningKind,
    ) -> Self {
        Self {
            template_name: template_name.into(),
            template_kind,
            provisioning_kind,
            remote_state_bucket: None,
        }
    }

    pub fn with_remote_state_bucket(mut self, bucket: Option<String>) -> Self {
        self.remote_state_bucket = bucket.filter(|b| !b.trim().is_empty());
        self
    }
}

/// Record for `schema/schema.yaml`.
#[derive(Debug, Serialize)]
pub struct SchemaRecord<'a> {
    pub variables: &'a [SchemaVariable],
    /// Names of the variables without a default.
    pub required: Vec<&'a str>,
}

impl<'a> SchemaRecord<'a> {
    pub fn new(variables: &'a [SchemaVariable]) -> Self {
        Self {
            variables,
            required: variables
                .iter()
                .filter(|v| v.required)
                .map(|v| v.name.as_str())
                .collect(),
        }
    }
}

/// Record for the Terraform entry point.
#[derive(Debug, Serialize)]
pub struct MainRecord<'a> {
    pub module_name: &'a str,
    pub variables: &'a [SchemaVariable],
    pub context_bindings: Vec<ContextBinding>,
}

impl<'a> MainRecord<'a> {
    pub fn new(module_name: &'a str, mapped: &'a MappedVariables) -> Self {
        Self {
            module_name,
            variables: &mapped.variables,
            context_bindings: mapped.context_bindings(),
        }
    }
}

/// Record for `outputs.tf`.
#[derive(Debug, Serialize)]
pub struct OutputsRecord<'a> {
    pub module_name: &'a str,
    pub outputs: &'a [ModuleOutput],
}

/// Record for `README.md`.
#[derive(Debug, Serialize)]
pub struct ReadmeRecord<'a> {
    pub name: &'a str,
    pub template_kind: TemplateKind,
    pub provisioning_kind: ProvisioningKind,
    pub infrastructure_dir: &'static str,
}
