//! # protonizer_templates
//!
//! Proton template generation for protonizer.
//!
//! This crate turns mapped module data into a complete Proton template:
//!
//! - `proton.yaml` configuration
//! - Embedded template assets rendered with MiniJinja
//! - An in-memory file tree with validated paths
//! - Scaffold assembly for `protonize` and `new`
//!
//! ## Example
//!
//! ```rust,no_run
//! use protonizer_iac::{ProvisioningKind, TemplateKind};
//! use protonizer_templates::{NewTemplateRequest, ScaffoldBuilder, TemplateConfig, TemplateRegistry};
//!
//! let registry = TemplateRegistry::new().unwrap();
//! let tree = ScaffoldBuilder::new(&registry)
//!     .scaffold(&NewTemplateRequest {
//!         config: TemplateConfig::new("my-env", TemplateKind::Environment),
//!         provisioning: ProvisioningKind::AwsManaged,
//!         remote_state_bucket: None,
//!     })
//!     .unwrap();
//!
//! tree.write_to(std::path::Path::new(".")).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod renderer;
pub mod scaffold;
pub mod tree;

pub use config::{validate_template_name, CompatibleEnvironment, TemplateConfig, PROTON_YAML_FILE};
pub use error::{TemplateError, TemplateResult};
pub use manifest::{MainRecord, OutputsRecord, ReadmeRecord, SchemaRecord, TemplateManifest};
pub use registry::{TemplateAsset, TemplateRegistry};
pub use renderer::TemplateRenderer;
pub use scaffold::{protonized_description, NewTemplateRequest, ProtonizeRequest, ScaffoldBuilder};
pub use tree::{GeneratedFileTree, RelativePath};
