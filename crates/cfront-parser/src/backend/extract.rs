//! Declaration extraction from tree-sitter syntax trees

use cfront_core::{FunctionDef, Location, MacroDefinition, Parameter, StructDef, StructField};
use tracing::debug;
use tree_sitter::Node;

use super::include::IncludeResolver;
use super::unit::{Include, Origin};

/// Everything collected from one fragment
#[derive(Debug, Default)]
pub(crate) struct Definitions {
    pub functions: Vec<FunctionDef>,
    pub structs: Vec<StructDef>,
    pub macros: Vec<MacroDefinition>,
    pub includes: Vec<Include>,
}

/// Walks a fragment's tree and records declarations and directives
pub(crate) struct Extractor<'a> {
    source: &'a str,
    origin: &'a Origin,
    file: String,
    includes: &'a IncludeResolver,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a str, origin: &'a Origin, includes: &'a IncludeResolver) -> Self {
        Self {
            source,
            origin,
            file: origin.to_string(),
            includes,
        }
    }

    pub fn run(&self, root: Node) -> Definitions {
        let mut defs = Definitions::default();
        self.visit(root, &mut defs);
        defs
    }

    fn visit(&self, node: Node, defs: &mut Definitions) {
        match node.kind() {
            "function_definition" => {
                if let Some(func) = self.function(node) {
                    debug!("Found function: {}", func.name);
                    defs.functions.push(func);
                }
            }
            "struct_specifier" => {
                if let Some(st) = self.structure(node) {
                    debug!("Found struct: {}", st.name);
                    defs.structs.push(st);
                }
            }
            "preproc_def" | "preproc_function_def" => {
                if let Some(m) = self.define(node) {
                    defs.macros.push(m);
                }
            }
            "preproc_call" => {
                if let Some(m) = self.undef(node) {
                    defs.macros.push(m);
                }
            }
            "preproc_include" => {
                if let Some(include) = self.include(node) {
                    defs.includes.push(include);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, defs);
        }
    }

    fn location(&self, node: Node) -> Location {
        let pos = node.start_position();
        Location::new(self.file.clone(), pos.row as u32 + 1, pos.column as u32)
    }

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source.as_bytes()).unwrap_or("").to_string()
    }

    // Preprocessor directives

    fn define(&self, node: Node) -> Option<MacroDefinition> {
        let name = self.text(node.child_by_field_name("name")?);
        let value = node
            .child_by_field_name("value")
            .map(|v| self.text(v).trim().to_string())
            .unwrap_or_default();

        let params = node.child_by_field_name("parameters").map(|list| {
            let mut cursor = list.walk();
            let names: Vec<String> = list
                .children(&mut cursor)
                .filter(|c| matches!(c.kind(), "identifier" | "..."))
                .map(|c| self.text(c))
                .collect();
            names
        });

        Some(MacroDefinition {
            name,
            params,
            value: Some(value),
        })
    }

    fn undef(&self, node: Node) -> Option<MacroDefinition> {
        let directive = self.text(node.child_by_field_name("directive")?);
        if directive != "#undef" {
            return None;
        }
        let name = self.text(node.child_by_field_name("argument")?);
        Some(MacroDefinition::undefined(name.trim()))
    }

    fn include(&self, node: Node) -> Option<Include> {
        let path = node.child_by_field_name("path")?;
        let system = match path.kind() {
            "system_lib_string" => true,
            "string_literal" => false,
            other => {
                debug!("Skipping computed include ({})", other);
                return None;
            }
        };

        let raw = self.text(path);
        let header = raw.get(1..raw.len().saturating_sub(1))?.to_string();
        let from_dir = match self.origin {
            Origin::File(path) => path.parent(),
            _ => None,
        };

        Some(Include {
            target: self.includes.resolve(&header, system, from_dir),
            header,
            system,
            location: self.location(node),
        })
    }

    // Functions

    fn function(&self, node: Node) -> Option<FunctionDef> {
        let mut name = String::new();
        let mut return_type = String::new();
        let mut params = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "primitive_type" | "type_identifier" | "sized_type_specifier" => {
                    return_type = self.text(child);
                }
                "struct_specifier" => {
                    return_type = format!("struct {}", self.struct_name(child));
                }
                "function_declarator" => {
                    name = self.declarator_name(child);
                    params = self.parameters(child);
                }
                "pointer_declarator" => {
                    return_type.push('*');
                    name = self.declarator_name(child);
                    params = self.parameters(child);
                }
                _ => {}
            }
        }

        if name.is_empty() {
            return None;
        }

        Some(FunctionDef {
            name,
            return_type,
            params,
            location: Some(self.location(node)),
        })
    }

    fn declarator_name(&self, node: Node) -> String {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "identifier" => return self.text(child),
                "pointer_declarator" | "function_declarator" | "parenthesized_declarator" => {
                    let name = self.declarator_name(child);
                    if !name.is_empty() {
                        return name;
                    }
                }
                _ => {}
            }
        }
        String::new()
    }

    fn parameters(&self, node: Node) -> Vec<Parameter> {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "parameter_list" => {
                    let mut list_cursor = child.walk();
                    let params: Vec<Parameter> = child
                        .children(&mut list_cursor)
                        .filter(|p| p.kind() == "parameter_declaration")
                        .filter_map(|p| self.parameter(p))
                        .collect();
                    return params;
                }
                "function_declarator" | "pointer_declarator" => {
                    return self.parameters(child);
                }
                _ => {}
            }
        }
        Vec::new()
    }

    fn parameter(&self, node: Node) -> Option<Parameter> {
        let mut name = String::new();
        let mut type_name = String::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "primitive_type" | "type_identifier" | "sized_type_specifier" => {
                    if type_name.is_empty() {
                        type_name = self.text(child);
                    }
                }
                "struct_specifier" => {
                    type_name = format!("struct {}", self.struct_name(child));
                }
                "pointer_declarator" => {
                    type_name.push('*');
                    name = self.declarator_name(child);
                }
                "abstract_pointer_declarator" => {
                    type_name.push('*');
                }
                "identifier" => {
                    name = self.text(child);
                }
                _ => {}
            }
        }

        if name.is_empty() && type_name.is_empty() {
            None
        } else {
            Some(Parameter { name, type_name })
        }
    }

    // Structs

    fn struct_name(&self, node: Node) -> String {
        node.child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default()
    }

    /// Named structs with a body; bare references are skipped
    fn structure(&self, node: Node) -> Option<StructDef> {
        let body = node.child_by_field_name("body")?;
        let name = self.struct_name(node);
        if name.is_empty() {
            return None;
        }

        let mut fields = Vec::new();
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "field_declaration" {
                fields.extend(self.field(child));
            }
        }

        Some(StructDef {
            name,
            fields,
            location: Some(self.location(node)),
        })
    }

    fn field(&self, node: Node) -> Option<StructField> {
        let mut name = String::new();
        let mut type_name = String::new();
        let mut is_pointer = false;
        let mut array_size = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "primitive_type" | "type_identifier" | "sized_type_specifier" => {
                    type_name = self.text(child);
                }
                "struct_specifier" => {
                    type_name = format!("struct {}", self.struct_name(child));
                }
                "field_identifier" => {
                    name = self.text(child);
                }
                "pointer_declarator" | "function_declarator" => {
                    is_pointer = true;
                    name = self.field_name(child);
                }
                "array_declarator" => {
                    if let Some(inner) = child.child_by_field_name("declarator") {
                        name = self.text(inner);
                    }
                    array_size = child.child_by_field_name("size").map(|s| self.text(s));
                }
                _ => {}
            }
        }

        if name.is_empty() {
            return None;
        }

        Some(StructField {
            name,
            type_name,
            is_pointer,
            array_size,
        })
    }

    fn field_name(&self, node: Node) -> String {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "field_identifier" | "identifier" => return self.text(child),
                "pointer_declarator" | "function_declarator" | "parenthesized_declarator" => {
                    let name = self.field_name(child);
                    if !name.is_empty() {
                        return name;
                    }
                }
                _ => {}
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser as TSParser;

    fn extract(source: &str, origin: Origin) -> Definitions {
        let mut parser = TSParser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        let includes = IncludeResolver::default();
        Extractor::new(source, &origin, &includes).run(tree.root_node())
    }

    #[test]
    fn test_function_with_params() {
        let source = r#"
int my_function(int a, char *b) {
    return a;
}
"#;
        let defs = extract(source, Origin::Body);

        assert_eq!(defs.functions.len(), 1);
        let func = &defs.functions[0];
        assert_eq!(func.name, "my_function");
        assert_eq!(func.return_type, "int");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.params[1].name, "b");
        assert_eq!(func.params[1].type_name, "char*");
        assert_eq!(func.location.as_ref().unwrap().to_string(), "<body>:2:0");
    }

    #[test]
    fn test_pointer_return() {
        let defs = extract("static char *name_of(struct dev *d) { return d->name; }\n", Origin::Body);

        let func = &defs.functions[0];
        assert_eq!(func.name, "name_of");
        assert_eq!(func.return_type, "char*");
        assert_eq!(func.params[0].type_name, "struct dev*");
    }

    #[test]
    fn test_struct_with_body_only() {
        let source = r#"
struct inner_data {
    int value;
    char name[32];
};

struct outer_container {
    struct inner_data data;
    struct inner_data *data_ptr;
    int count;
};
"#;
        let defs = extract(source, Origin::Body);

        let names: Vec<_> = defs.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["inner_data", "outer_container"]);

        let inner = &defs.structs[0];
        assert_eq!(inner.fields.len(), 2);
        assert_eq!(inner.fields[1].name, "name");
        assert_eq!(inner.fields[1].array_size.as_deref(), Some("32"));

        let outer = &defs.structs[1];
        assert_eq!(outer.fields.len(), 3);
        assert_eq!(outer.fields[0].type_name, "struct inner_data");
        assert!(outer.fields[1].is_pointer);
    }

    #[test]
    fn test_macros() {
        let source = r#"
#define LIMIT 16
#define EMPTY
#define MAX(a, b) ((a) > (b) ? (a) : (b))
#undef LIMIT
"#;
        let defs = extract(source, Origin::Predefined);

        assert_eq!(
            defs.macros,
            vec![
                MacroDefinition::with_value("LIMIT", "16"),
                MacroDefinition::with_value("EMPTY", ""),
                MacroDefinition::function_like("MAX", &["a", "b"], "((a) > (b) ? (a) : (b))"),
                MacroDefinition::undefined("LIMIT"),
            ]
        );
    }

    #[test]
    fn test_includes() {
        let source = "#include <stdio.h>\n#include \"local.h\"\n";
        let defs = extract(source, Origin::Body);

        assert_eq!(defs.includes.len(), 2);
        assert_eq!(defs.includes[0].header, "stdio.h");
        assert!(defs.includes[0].system);
        assert_eq!(defs.includes[1].header, "local.h");
        assert!(!defs.includes[1].system);
        assert_eq!(defs.includes[1].location.line, 2);
    }
}
