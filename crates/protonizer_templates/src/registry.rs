//! Embedded template assets.

use minijinja::{AutoEscape, Environment, Template, UndefinedBehavior};
use tracing::debug;

use protonizer_iac::{ProvisioningKind, TemplateKind};

use crate::error::TemplateResult;

/// Every asset shipped with protonizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateAsset {
    SchemaEnvironment,
    SchemaService,
    ManifestCodeBuild,
    ManifestAwsManaged,
    MainEnvironment,
    MainService,
    VariablesEnvironment,
    VariablesService,
    Outputs,
    OutputScript,
    InstallTerraformScript,
    CloudFormationEnvironment,
    CloudFormationService,
    StarterModule,
    Readme,
}

impl TemplateAsset {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateAsset::SchemaEnvironment => "schema.env.yaml",
            TemplateAsset::SchemaService => "schema.svc.yaml",
            TemplateAsset::ManifestCodeBuild => "manifest.codebuild.yaml",
            TemplateAsset::ManifestAwsManaged => "manifest.awsmanaged.yaml",
            TemplateAsset::MainEnvironment => "main.env.tf",
            TemplateAsset::MainService => "main.svc.tf",
            TemplateAsset::VariablesEnvironment => "variables.env.tf",
            TemplateAsset::VariablesService => "variables.svc.tf",
            TemplateAsset::Outputs => "outputs.tf",
            TemplateAsset::OutputScript => "output.sh",
            TemplateAsset::InstallTerraformScript => "install-terraform.sh",
            TemplateAsset::CloudFormationEnvironment => "cloudformation.env.yaml",
            TemplateAsset::CloudFormationService => "cloudformation.svc.yaml",
            TemplateAsset::StarterModule => "starter.main.tf",
            TemplateAsset::Readme => "README.md",
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            TemplateAsset::SchemaEnvironment => include_str!("../assets/schema.env.yaml"),
            TemplateAsset::SchemaService => include_str!("../assets/schema.svc.yaml"),
            TemplateAsset::ManifestCodeBuild => include_str!("../assets/manifest.codebuild.yaml"),
            TemplateAsset::ManifestAwsManaged => include_str!("../assets/manifest.awsmanaged.yaml"),
            TemplateAsset::MainEnvironment => include_str!("../assets/main.env.tf"),
            TemplateAsset::MainService => include_str!("../assets/main.svc.tf"),
            TemplateAsset::VariablesEnvironment => include_str!("../assets/variables.env.tf"),
            TemplateAsset::VariablesService => include_str!("../assets/variables.svc.tf"),
            TemplateAsset::Outputs => include_str!("../assets/outputs.tf"),
            TemplateAsset::OutputScript => include_str!("../assets/output.sh"),
            TemplateAsset::InstallTerraformScript => include_str!("../assets/install-terraform.sh"),
            TemplateAsset::CloudFormationEnvironment => {
                include_str!("../assets/cloudformation.env.yaml")
            }
            TemplateAsset::CloudFormationService => include_str!("../assets/cloudformation.svc.yaml"),
            TemplateAsset::StarterModule => include_str!("../assets/starter.main.tf"),
            TemplateAsset::Readme => include_str!("../assets/README.md"),
        }
    }

    /// Verbatim assets are copied byte-for-byte and never rendered.
    ///
    /// CloudFormation assets contain Proton's own Jinja placeholders, so
    /// they must not go through our renderer.
    pub fn is_verbatim(&self) -> bool {
        matches!(
            self,
            TemplateAsset::ManifestAwsManaged
                | TemplateAsset::VariablesEnvironment
                | TemplateAsset::VariablesService
                | TemplateAsset::OutputScript
                | TemplateAsset::InstallTerraformScript
                | TemplateAsset::CloudFormationEnvironment
                | TemplateAsset::CloudFormationService
                | TemplateAsset::StarterModule
        )
    }

    pub fn schema(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Environment => TemplateAsset::SchemaEnvironment,
            TemplateKind::Service => TemplateAsset::SchemaService,
        }
    }

    pub fn main(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Environment => TemplateAsset::MainEnvironment,
            TemplateKind::Service => TemplateAsset::MainService,
        }
    }

    pub fn variables(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Environment => TemplateAsset::VariablesEnvironment,
            TemplateKind::Service => TemplateAsset::VariablesService,
        }
    }

    pub fn cloudformation(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::Environment => TemplateAsset::CloudFormationEnvironment,
            TemplateKind::Service => TemplateAsset::CloudFormationService,
        }
    }

    pub fn manifest(provisioning: ProvisioningKind) -> Self {
        match provisioning {
            ProvisioningKind::CodeBuild => TemplateAsset::ManifestCodeBuild,
            ProvisioningKind::AwsManaged => TemplateAsset::ManifestAwsManaged,
        }
    }

    pub fn all() -> &'static [TemplateAsset] {
        &[
            TemplateAsset::SchemaEnvironment,
            TemplateAsset::SchemaService,
            TemplateAsset::ManifestCodeBuild,
            TemplateAsset::ManifestAwsManaged,
            TemplateAsset::MainEnvironment,
            TemplateAsset::MainService,
            TemplateAsset::VariablesEnvironment,
            TemplateAsset::VariablesService,
            TemplateAsset::Outputs,
            TemplateAsset::OutputScript,
            TemplateAsset::InstallTerraformScript,
            TemplateAsset::CloudFormationEnvironment,
            TemplateAsset::CloudFormationService,
            TemplateAsset::StarterModule,
            TemplateAsset::Readme,
        ]
    }
}

impl std::fmt::Display for TemplateAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The compiled set of renderable assets.
///
/// Build it once and share it by reference.
pub struct TemplateRegistry {
    env: Environment<'static>,
}

impl TemplateRegistry {
    pub fn new() -> TemplateResult<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("tf_string", tf_string);

        for asset in TemplateAsset::all().iter().filter(|a| !a.is_verbatim()) {
            env.add_template(asset.name(), asset.source())?;
            debug!("Registered template asset: {}", asset);
        }

        Ok(Self { env })
    }

    /// Compiled template for a renderable asset.
    pub fn template(&self, asset: TemplateAsset) -> TemplateResult<Template<'_, '_>> {
        Ok(self.env.get_template(asset.name())?)
    }
}

/// Quote a value as a Terraform string literal. Interpolation and directive
/// openers are doubled so the text is taken literally.
fn tf_string(value: String) -> String {
    let literal = value.replace("${", "$${").replace("%{", "%%{");
    serde_json::Value::String(literal).to_string()
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry").finish_non_exhaustive()
    }
}
