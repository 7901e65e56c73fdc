//! Assembly of complete Proton templates.
//!
//! [`ScaffoldBuilder::protonize`] wraps an existing Terraform module;
//! [`ScaffoldBuilder::scaffold`] produces a fresh template around a small
//! example input. Both return a [`GeneratedFileTree`] rooted at the
//! template name; nothing is written until the caller asks for it.

use std::path::PathBuf;

use serde_json::json;
use tracing::info;

use protonizer_iac::{
    MappedVariables, ModuleOutput, ModuleVariable, ProvisioningKind, TemplateKind, TypeMapper,
};

use crate::config::{TemplateConfig, PROTON_YAML_FILE};
use crate::error::{TemplateError, TemplateResult};
use crate::manifest::{MainRecord, OutputsRecord, ReadmeRecord, SchemaRecord, TemplateManifest};
use crate::registry::{TemplateAsset, TemplateRegistry};
use crate::renderer::TemplateRenderer;
use crate::tree::{GeneratedFileTree, RelativePath};

/// Input for wrapping an existing module.
#[derive(Debug, Clone)]
pub struct ProtonizeRequest {
    pub config: TemplateConfig,
    pub provisioning: ProvisioningKind,
    pub remote_state_bucket: Option<String>,
    pub variables: MappedVariables,
    pub outputs: Vec<ModuleOutput>,
    /// Module directory mounted under `<infra>/src`.
    pub source_dir: PathBuf,
}

/// Input for a fresh template.
#[derive(Debug, Clone)]
pub struct NewTemplateRequest {
    pub config: TemplateConfig,
    pub provisioning: ProvisioningKind,
    pub remote_state_bucket: Option<String>,
}

/// Builds template trees from the embedded assets.
#[derive(Debug, Clone, Copy)]
pub struct ScaffoldBuilder<'a> {
    renderer: TemplateRenderer<'a>,
}

impl<'a> ScaffoldBuilder<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self {
            renderer: TemplateRenderer::new(registry),
        }
    }

    /// Wrap a Terraform module as a CodeBuild-provisioned template.
    pub fn protonize(&self, request: &ProtonizeRequest) -> TemplateResult<GeneratedFileTree> {
        if request.provisioning != ProvisioningKind::CodeBuild {
            return Err(TemplateError::InvalidConfig(format!(
                "provisioning `{}` is not supported for Terraform modules, use `{}`",
                request.provisioning,
                ProvisioningKind::CodeBuild
            )));
        }

        let config = &request.config;
        config.validate()?;
        let manifest = self.manifest(config, request.provisioning, &request.remote_state_bucket)?;

        let root = RelativePath::new(&config.name)?;
        let infra = root.join(config.kind.infrastructure_dir())?;

        let mut tree = GeneratedFileTree::new();
        self.add_common(&mut tree, &root, config, request.provisioning, &request.variables)?;
        self.add_terraform(&mut tree, &infra, &manifest, &request.variables, &request.outputs)?;
        let mounted = tree.mount_dir(&infra.join("src")?, &request.source_dir)?;

        info!(
            "Protonized {} template `{}`: {} inputs, {} outputs, {} source files",
            config.kind,
            config.name,
            request.variables.variables.len(),
            request.outputs.len(),
            mounted
        );
        Ok(tree)
    }

    /// Create a new template with a single example input.
    pub fn scaffold(&self, request: &NewTemplateRequest) -> TemplateResult<GeneratedFileTree> {
        let config = &request.config;
        config.validate()?;
        let manifest = self.manifest(config, request.provisioning, &request.remote_state_bucket)?;

        let root = RelativePath::new(&config.name)?;
        let infra = root.join(config.kind.infrastructure_dir())?;
        let variables = TypeMapper::new(config.kind).map_all(&[ModuleVariable::new(
            "example_input",
            "string",
        )
        .with_description("An example input")
        .with_default(json!("default"))]);

        let mut tree = GeneratedFileTree::new();
        self.add_common(&mut tree, &root, config, request.provisioning, &variables)?;

        match request.provisioning {
            ProvisioningKind::CodeBuild => {
                let outputs = vec![ModuleOutput::new("example_output", "An example output")];
                self.add_terraform(&mut tree, &infra, &manifest, &variables, &outputs)?;
                tree.insert(
                    infra.join("src/main.tf")?,
                    self.renderer.copy(TemplateAsset::StarterModule),
                )?;
            }
            ProvisioningKind::AwsManaged => {
                tree.insert(
                    infra.join("manifest.yaml")?,
                    self.renderer.copy(TemplateAsset::ManifestAwsManaged),
                )?;
                tree.insert(
                    infra.join("cloudformation.yaml")?,
                    self.renderer.copy(TemplateAsset::cloudformation(config.kind)),
                )?;
            }
        }

        info!(
            "Scaffolded {} template `{}` ({} provisioning)",
            config.kind, config.name, request.provisioning
        );
        Ok(tree)
    }

    fn manifest(
        &self,
        config: &TemplateConfig,
        provisioning: ProvisioningKind,
        remote_state_bucket: &Option<String>,
    ) -> TemplateResult<TemplateManifest> {
        let manifest = TemplateManifest::new(&config.name, config.kind, provisioning)
            .with_remote_state_bucket(remote_state_bucket.clone());

        if provisioning == ProvisioningKind::CodeBuild && manifest.remote_state_bucket.is_none() {
            return Err(TemplateError::InvalidConfig(
                "a Terraform remote state bucket is required for codebuild provisioning".to_string(),
            ));
        }
        Ok(manifest)
    }

    /// `proton.yaml`, `README.md` and the schema.
    fn add_common(
        &self,
        tree: &mut GeneratedFileTree,
        root: &RelativePath,
        config: &TemplateConfig,
        provisioning: ProvisioningKind,
        variables: &MappedVariables,
    ) -> TemplateResult<()> {
        tree.insert(root.join(PROTON_YAML_FILE)?, config.to_yaml()?)?;

        let readme = ReadmeRecord {
            name: &config.name,
            template_kind: config.kind,
            provisioning_kind: provisioning,
            infrastructure_dir: config.kind.infrastructure_dir(),
        };
        tree.insert(
            root.join("README.md")?,
            self.renderer.render(TemplateAsset::Readme, &readme)?,
        )?;

        tree.insert(
            root.join("schema/schema.yaml")?,
            self.renderer.render(
                TemplateAsset::schema(config.kind),
                &SchemaRecord::new(&variables.variables),
            )?,
        )?;
        Ok(())
    }

    /// Manifest, entry point, outputs and helper scripts for CodeBuild.
    fn add_terraform(
        &self,
        tree: &mut GeneratedFileTree,
        infra: &RelativePath,
        manifest: &TemplateManifest,
        variables: &MappedVariables,
        outputs: &[ModuleOutput],
    ) -> TemplateResult<()> {
        let kind = manifest.template_kind;
        let module_name = manifest.template_name.as_str();

        tree.insert(
            infra.join("manifest.yaml")?,
            self.renderer.render(TemplateAsset::ManifestCodeBuild, manifest)?,
        )?;
        tree.insert(
            infra.join("main.tf")?,
            self.renderer
                .render(TemplateAsset::main(kind), &MainRecord::new(module_name, variables))?,
        )?;
        tree.insert(
            infra.join("variables.tf")?,
            self.renderer.copy(TemplateAsset::variables(kind)),
        )?;
        tree.insert(
            infra.join("outputs.tf")?,
            self.renderer.render(
                TemplateAsset::Outputs,
                &OutputsRecord {
                    module_name,
                    outputs,
                },
            )?,
        )?;
        tree.insert(
            infra.join("output.sh")?,
            self.renderer.copy(TemplateAsset::OutputScript),
        )?;
        tree.insert(
            infra.join("install-terraform.sh")?,
            self.renderer.copy(TemplateAsset::InstallTerraformScript),
        )?;
        Ok(())
    }
}

/// Default description for a protonized template.
pub fn protonized_description(kind: TemplateKind, name: &str) -> String {
    format!("A {} template generated from {}", kind, name)
}
