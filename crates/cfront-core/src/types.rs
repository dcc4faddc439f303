//! Core type definitions

use serde::{Deserialize, Serialize};
use crate::location::Location;

/// A preprocessor macro definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    /// Parameter names of a function-like macro
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    /// `None` marks an `#undef`
    pub value: Option<String>,
}

impl MacroDefinition {
    /// A macro defined to `1`
    pub fn defined(name: &str) -> Self {
        Self::with_value(name, "1")
    }

    /// A macro with a specific replacement text (may be empty)
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            params: None,
            value: Some(value.to_string()),
        }
    }

    /// A function-like macro
    pub fn function_like(name: &str, params: &[&str], body: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Some(params.iter().map(|p| p.to_string()).collect()),
            value: Some(body.to_string()),
        }
    }

    /// An undefined macro
    pub fn undefined(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: None,
            value: None,
        }
    }

    /// Render as a preprocessor directive line
    pub fn to_directive(&self) -> String {
        let head = match &self.params {
            Some(params) => format!("{}({})", self.name, params.join(", ")),
            None => self.name.clone(),
        };
        match self.value.as_deref() {
            Some("") => format!("#define {}", head),
            Some(v) => format!("#define {} {}", head, v),
            None => format!("#undef {}", self.name),
        }
    }
}

/// Function definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Return type
    pub return_type: String,
    /// Parameters
    pub params: Vec<Parameter>,
    /// Location in source
    pub location: Option<Location>,
}

/// Function parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (empty when anonymous)
    pub name: String,
    /// Parameter type
    pub type_name: String,
}

/// Struct definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDef {
    /// Struct name
    pub name: String,
    /// Fields
    pub fields: Vec<StructField>,
    /// Location in source
    pub location: Option<Location>,
}

/// Struct field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructField {
    /// Field name
    pub name: String,
    /// Field type
    pub type_name: String,
    /// Is pointer type
    pub is_pointer: bool,
    /// Array size (if applicable)
    pub array_size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_directive() {
        assert_eq!(MacroDefinition::defined("FOO").to_directive(), "#define FOO 1");
        assert_eq!(
            MacroDefinition::with_value("__SIZE_TYPE__", "unsigned long").to_directive(),
            "#define __SIZE_TYPE__ unsigned long"
        );
        assert_eq!(MacroDefinition::with_value("__extension__", "").to_directive(), "#define __extension__");
        assert_eq!(MacroDefinition::undefined("BAZ").to_directive(), "#undef BAZ");
        assert_eq!(
            MacroDefinition::function_like("MAX", &["a", "b"], "((a) > (b) ? (a) : (b))").to_directive(),
            "#define MAX(a, b) ((a) > (b) ? (a) : (b))"
        );
        assert_eq!(MacroDefinition::function_like("__attribute__", &["x"], "").to_directive(), "#define __attribute__(x)");
    }
}
