//! Terraform variable to Proton schema type mapping.
//!
//! Proton schemas are a subset of OpenAPI. Only scalar types and arrays of
//! scalars can be expressed faithfully; everything else is dropped with a
//! warning rather than miscast.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::kind::TemplateKind;
use crate::module::ModuleVariable;

/// Portable schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortableType {
    String,
    Number,
    Boolean,
    Array,
}

impl PortableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortableType::String => "string",
            PortableType::Number => "number",
            PortableType::Boolean => "boolean",
            PortableType::Array => "array",
        }
    }

    /// Map a scalar Terraform type. Returns `None` for anything that is not
    /// a primitive.
    fn scalar(declared: &str) -> Option<Self> {
        match declared {
            "string" => Some(PortableType::String),
            "number" => Some(PortableType::Number),
            "bool" => Some(PortableType::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for PortableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A variable ready to be written into a Proton schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVariable {
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub portable_type: PortableType,
    pub array_element_type: Option<PortableType>,
    /// Description escaped for embedding in double-quoted YAML.
    pub description: String,
    pub default: Option<serde_json::Value>,
    pub required: bool,
}

/// A variable dropped because its type cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingWarning {
    pub name: String,
    pub declared_type: String,
}

impl std::fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let declared = if self.declared_type.is_empty() {
            "<undeclared>"
        } else {
            self.declared_type.as_str()
        };
        write!(
            f,
            "variable `{}` has unsupported type `{}` and was skipped",
            self.name, declared
        )
    }
}

/// Binding of a reserved variable to a value Proton supplies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBinding {
    pub name: String,
    pub expression: String,
}

/// Result of mapping a module's variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedVariables {
    /// Supported variables, sorted by name.
    pub variables: Vec<SchemaVariable>,
    /// Variables dropped for unsupported types.
    pub warnings: Vec<MappingWarning>,
    /// Reserved names the module declared.
    pub reserved: Vec<String>,
    #[serde(skip)]
    kind: Option<TemplateKind>,
}

impl MappedVariables {
    /// Bindings for the reserved variables the module declared.
    pub fn context_bindings(&self) -> Vec<ContextBinding> {
        let Some(kind) = self.kind else {
            return Vec::new();
        };
        self.reserved
            .iter()
            .filter_map(|name| {
                kind.context_binding(name).map(|expr| ContextBinding {
                    name: name.clone(),
                    expression: expr.to_string(),
                })
            })
            .collect()
    }
}

/// Maps Terraform variables onto portable schema variables.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper {
    kind: TemplateKind,
}

impl TypeMapper {
    pub fn new(kind: TemplateKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Map a single variable.
    ///
    /// Returns `None` for reserved names and for unsupported types; only the
    /// latter is logged as a warning.
    pub fn map_variable(&self, variable: &ModuleVariable) -> Option<SchemaVariable> {
        self.try_map(variable).ok().flatten()
    }

    /// Map every variable, collecting warnings. Output is sorted by name.
    pub fn map_all(&self, variables: &[ModuleVariable]) -> MappedVariables {
        let mut mapped = MappedVariables {
            kind: Some(self.kind),
            ..Default::default()
        };

        for variable in variables {
            match self.try_map(variable) {
                Ok(Some(schema_var)) => mapped.variables.push(schema_var),
                Ok(None) => mapped.reserved.push(variable.name.clone()),
                Err(warning) => mapped.warnings.push(warning),
            }
        }

        mapped.variables.sort_by(|a, b| a.name.cmp(&b.name));
        mapped.reserved.sort();
        mapped
    }

    /// `Ok(None)` means reserved, `Err` means unsupported.
    fn try_map(&self, variable: &ModuleVariable) -> Result<Option<SchemaVariable>, MappingWarning> {
        if self.kind.is_reserved(&variable.name) {
            debug!("Skipping reserved variable: {}", variable.name);
            return Ok(None);
        }

        let declared = variable.declared_type.trim();
        let default = variable.default.clone().filter(|v| !v.is_null());

        let mapped = if let Some(portable) = PortableType::scalar(declared) {
            Some((portable, None, default))
        } else if let Some(inner) = list_element(declared) {
            PortableType::scalar(inner).map(|element| (PortableType::Array, Some(element), None))
        } else {
            None
        };

        let Some((portable_type, array_element_type, default)) = mapped else {
            let warning = MappingWarning {
                name: variable.name.clone(),
                declared_type: declared.to_string(),
            };
            warn!("{}", warning);
            return Err(warning);
        };

        Ok(Some(SchemaVariable {
            name: variable.name.clone(),
            title: variable.name.clone(),
            portable_type,
            array_element_type,
            description: escape_double_quoted(&variable.description),
            default,
            required: variable.required,
        }))
    }
}

/// Inner type of a `list(T)` expression.
fn list_element(declared: &str) -> Option<&str> {
    declared
        .strip_prefix("list(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
}

/// Escape text for a double-quoted YAML scalar. Line breaks and tabs are
/// kept as escape sequences so multi-line descriptions survive folding.
pub fn escape_double_quoted(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn var(name: &str, declared: &str) -> ModuleVariable {
        ModuleVariable::new(name, declared)
    }

    #[test]
    fn test_scalar_types() {
        let mapper = TypeMapper::new(TemplateKind::Environment);

        let s = mapper.map_variable(&var("a", "string")).unwrap();
        assert_eq!(s.portable_type, PortableType::String);
        assert_eq!(s.title, "a");

        let n = mapper.map_variable(&var("b", "number")).unwrap();
        assert_eq!(n.portable_type, PortableType::Number);

        let b = mapper.map_variable(&var("c", "bool")).unwrap();
        assert_eq!(b.portable_type, PortableType::Boolean);
    }

    #[test]
    fn test_list_discards_default() {
        let mapper = TypeMapper::new(TemplateKind::Service);
        let v = var("subnets", "list(string)").with_default(json!(["a", "b"]));

        let s = mapper.map_variable(&v).unwrap();
        assert_eq!(s.portable_type, PortableType::Array);
        assert_eq!(s.array_element_type, Some(PortableType::String));
        assert_eq!(s.default, None);
    }

    #[test]
    fn test_list_of_bool_maps_element() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let s = mapper.map_variable(&var("flags", "list(bool)")).unwrap();
        assert_eq!(s.array_element_type, Some(PortableType::Boolean));
    }

    #[test]
    fn test_unsupported_types_are_skipped() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let variables = vec![
            var("a", "map(string)"),
            var("b", "object({ name = string })"),
            var("c", "set(string)"),
            var("d", "any"),
            var("e", ""),
            var("f", "list(object({ id = string }))"),
            var("g", "string"),
        ];

        let mapped = mapper.map_all(&variables);
        assert_eq!(mapped.variables.len(), 1);
        assert_eq!(mapped.variables[0].name, "g");
        let skipped: Vec<_> = mapped.warnings.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(skipped, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_reserved_names_environment() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let variables = vec![var("name", "string"), var("environment", "string")];

        let mapped = mapper.map_all(&variables);
        assert_eq!(mapped.variables.len(), 1);
        assert_eq!(mapped.variables[0].name, "environment");
        assert_eq!(mapped.reserved, vec!["name"]);
        assert!(mapped.warnings.is_empty());
    }

    #[test]
    fn test_reserved_names_service_any_type() {
        let mapper = TypeMapper::new(TemplateKind::Service);
        let variables = vec![var("name", "map(string)"), var("environment", "object({})")];

        let mapped = mapper.map_all(&variables);
        assert!(mapped.variables.is_empty());
        assert!(mapped.warnings.is_empty());

        let bindings = mapped.context_bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name, "environment");
        assert_eq!(bindings[0].expression, "var.environment.name");
        assert_eq!(bindings[1].expression, "var.service_instance.name");
    }

    #[test]
    fn test_output_sorted_case_sensitive() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let variables = vec![var("b", "string"), var("B", "string"), var("a", "string")];

        let names: Vec<_> = mapper
            .map_all(&variables)
            .variables
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["B", "a", "b"]);
    }

    #[test]
    fn test_description_quotes_escaped() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let v = var("a", "string").with_description(r#"the "primary" region"#);
        let s = mapper.map_variable(&v).unwrap();
        assert_eq!(s.description, r#"the \"primary\" region"#);
    }

    #[test]
    fn test_description_line_breaks_escaped() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let v = var("cidr", "string").with_description("The VPC CIDR.\nMust be a /16.\tC:\\");
        let s = mapper.map_variable(&v).unwrap();
        assert_eq!(s.description, r"The VPC CIDR.\nMust be a /16.\tC:\\");
    }

    #[test]
    fn test_null_default_dropped() {
        let mapper = TypeMapper::new(TemplateKind::Environment);
        let v = var("a", "string").with_default(serde_json::Value::Null);
        let s = mapper.map_variable(&v).unwrap();
        assert_eq!(s.default, None);
        assert!(!s.required);
    }
}
