//! # protonizer_iac
//!
//! Terraform module introspection for protonizer.
//!
//! This crate reads the interface of an existing Terraform module and maps
//! it onto what a Proton template can express:
//!
//! - Module analysis (`variable` and `output` blocks)
//! - Terraform type to portable schema type mapping
//! - Template kind and provisioning kind definitions
//!
//! ## Example
//!
//! ```rust,no_run
//! use protonizer_iac::{ModuleAnalyzer, TemplateKind, TypeMapper};
//!
//! let module = ModuleAnalyzer::load("./my-module").unwrap();
//! let mapped = TypeMapper::new(TemplateKind::Service).map_all(&module.variables);
//!
//! for warning in &mapped.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

pub mod error;
pub mod kind;
pub mod mapper;
pub mod module;

pub use error::{IacError, IacResult};
pub use kind::{IacTool, ProvisioningKind, TemplateKind};
pub use mapper::{
    escape_double_quoted, ContextBinding, MappedVariables, MappingWarning, PortableType,
    SchemaVariable, TypeMapper,
};
pub use module::{ModuleAnalyzer, ModuleOutput, ModuleVariable, TerraformModule};
