//! Terraform module analysis.
//!
//! Loads the `variable` and `output` blocks declared by a Terraform module.
//! Only the top-level `*.tf` files of the module directory are read, the
//! same set Terraform itself loads for a module.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hcl::expr::{Expression, TemplateExpr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IacError, IacResult};

/// A declared input variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleVariable {
    pub name: String,
    /// Source text of the `type` expression, empty when no type is declared.
    pub declared_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    pub required: bool,
}

impl ModuleVariable {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            description: String::new(),
            default: None,
            required: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self.required = false;
        self
    }
}

/// A declared output value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ModuleOutput {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// The parsed interface of a Terraform module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerraformModule {
    /// Variables sorted by name.
    pub variables: Vec<ModuleVariable>,
    /// Outputs sorted by name.
    pub outputs: Vec<ModuleOutput>,
}

/// Terraform module analyzer.
pub struct ModuleAnalyzer;

impl ModuleAnalyzer {
    /// Load a module from a directory of `.tf` files.
    pub fn load(dir: impl AsRef<Path>) -> IacResult<TerraformModule> {
        let dir = dir.as_ref();
        info!("Parsing terraform module: {:?}", dir);

        if !dir.is_dir() {
            return Err(IacError::ModuleNotFound(dir.to_path_buf()));
        }

        let files = Self::terraform_files(dir)?;
        if files.is_empty() {
            return Err(IacError::EmptyModule(dir.to_path_buf()));
        }

        let mut collector = Collector::default();
        for file in &files {
            debug!("Reading {:?}", file);
            let content = fs::read_to_string(file)?;
            collector.collect(file, &content)?;
        }

        let module = collector.finish();
        info!(
            "Found {} variables and {} outputs",
            module.variables.len(),
            module.outputs.len()
        );
        Ok(module)
    }

    /// Parse a single Terraform source file held in memory.
    pub fn parse_str(source: &str) -> IacResult<TerraformModule> {
        let mut collector = Collector::default();
        collector.collect(Path::new("<memory>"), source)?;
        Ok(collector.finish())
    }

    fn terraform_files(dir: &Path) -> IacResult<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "tf"))
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Accumulates blocks across the files of one module.
#[derive(Default)]
struct Collector {
    variables: BTreeMap<String, ModuleVariable>,
    outputs: BTreeMap<String, ModuleOutput>,
}

impl Collector {
    fn collect(&mut self, path: &Path, source: &str) -> IacResult<()> {
        let body = hcl::parse(source).map_err(|e| IacError::parse(path, e.to_string()))?;

        for block in body.blocks() {
            match block.identifier() {
                "variable" => {
                    let name = block_name(path, block)?;
                    let variable = parse_variable(path, name, block.body())?;
                    debug!(
                        "{} (type: {}; default: {:?})",
                        variable.name, variable.declared_type, variable.default
                    );
                    if self.variables.contains_key(&variable.name) {
                        return Err(IacError::parse(
                            path,
                            format!("duplicate variable \"{}\"", variable.name),
                        ));
                    }
                    self.variables.insert(variable.name.clone(), variable);
                }
                "output" => {
                    let name = block_name(path, block)?;
                    let description = find_description(path, block.body())?;
                    debug!("{} (description: {})", name, description);
                    if self.outputs.contains_key(&name) {
                        return Err(IacError::parse(path, format!("duplicate output \"{}\"", name)));
                    }
                    self.outputs
                        .insert(name.clone(), ModuleOutput::new(name, description));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn finish(self) -> TerraformModule {
        // BTreeMap iteration is already name-ordered
        TerraformModule {
            variables: self.variables.into_values().collect(),
            outputs: self.outputs.into_values().collect(),
        }
    }
}

fn block_name(path: &Path, block: &hcl::Block) -> IacResult<String> {
    match block.labels() {
        [label] => Ok(label.as_str().to_string()),
        _ => Err(IacError::parse(
            path,
            format!("{} block must have exactly one label", block.identifier()),
        )),
    }
}

fn parse_variable(path: &Path, name: String, body: &hcl::Body) -> IacResult<ModuleVariable> {
    let mut variable = ModuleVariable::new(name, "");
    variable.description = find_description(path, body)?;

    for attr in body.attributes() {
        match attr.key() {
            "type" => variable.declared_type = attr.expr().to_string().trim().to_string(),
            "default" => {
                let value = hcl::Value::from(attr.expr().clone());
                let value = serde_json::to_value(&value)
                    .map_err(|e| IacError::parse(path, format!("invalid default: {}", e)))?;
                variable.default = Some(value);
                variable.required = false;
            }
            _ => {}
        }
    }

    Ok(variable)
}

fn find_description(path: &Path, body: &hcl::Body) -> IacResult<String> {
    let Some(attr) = body.attributes().find(|a| a.key() == "description") else {
        return Ok(String::new());
    };

    match attr.expr() {
        Expression::String(s) => Ok(s.clone()),
        Expression::TemplateExpr(t) => match t.as_ref() {
            TemplateExpr::QuotedString(s) => Ok(s.clone()),
            TemplateExpr::Heredoc(h) => Ok(h.template.trim_end().to_string()),
            #[allow(unreachable_patterns)]
            other => Ok(other.to_string()),
        },
        other => Err(IacError::parse(
            path,
            format!("description must be a string, found `{}`", other),
        )),
    }
}
