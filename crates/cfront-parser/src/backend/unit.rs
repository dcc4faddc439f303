//! Translation unit produced by the tree-sitter backend

use cfront_core::{FunctionDef, Location, MacroDefinition, StructDef};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tree_sitter::{Node, Tree};
use url::Url;

use super::extract::Definitions;

/// Where a fragment of the translation unit came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Origin {
    /// The predefined macro text
    Predefined,
    /// A target file
    File(PathBuf),
    /// The inline source body
    Body,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Predefined => f.write_str("<predefined>"),
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Body => f.write_str("<body>"),
        }
    }
}

/// One parsed input
#[derive(Debug, Clone)]
pub struct Fragment {
    origin: Origin,
    source: String,
    tree: Tree,
}

impl Fragment {
    pub(crate) fn new(origin: Origin, source: String, tree: Tree) -> Self {
        Self {
            origin,
            source,
            tree,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Resolution of an `#include` directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum IncludeTarget {
    Local(PathBuf),
    Web(Url),
    Unresolved,
}

/// An `#include` directive
#[derive(Debug, Clone, Serialize)]
pub struct Include {
    /// Header name without delimiters
    pub header: String,
    /// `<...>` form
    pub system: bool,
    pub location: Location,
    pub target: IncludeTarget,
}

/// Parsed translation unit
#[derive(Debug, Default, Clone)]
pub struct TranslationUnit {
    fragments: Vec<Fragment>,
    functions: HashMap<String, FunctionDef>,
    structs: HashMap<String, StructDef>,
    macros: Vec<MacroDefinition>,
    includes: Vec<Include>,
}

impl TranslationUnit {
    pub(crate) fn push(&mut self, fragment: Fragment, definitions: Definitions) {
        for func in definitions.functions {
            self.functions.insert(func.name.clone(), func);
        }
        for st in definitions.structs {
            self.structs.insert(st.name.clone(), st);
        }
        self.macros.extend(definitions.macros);
        self.includes.extend(definitions.includes);
        self.fragments.push(fragment);
    }

    /// Parsed inputs in order: predefined text, files, body
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Function definitions by name; later inputs win
    pub fn functions(&self) -> &HashMap<String, FunctionDef> {
        &self.functions
    }

    /// Struct definitions with a body, by name
    pub fn structs(&self) -> &HashMap<String, StructDef> {
        &self.structs
    }

    /// Every `#define` and `#undef`, in input order
    pub fn macros(&self) -> &[MacroDefinition] {
        &self.macros
    }

    pub fn includes(&self) -> &[Include] {
        &self.includes
    }

    /// Replacement text of a macro as of the end of the unit
    pub fn macro_value(&self, name: &str) -> Option<&str> {
        self.macros
            .iter()
            .rev()
            .find(|m| m.name == name)
            .and_then(|m| m.value.as_deref())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macro_value(name).is_some()
    }

    pub fn unresolved_includes(&self) -> impl Iterator<Item = &Include> {
        self.includes
            .iter()
            .filter(|i| i.target == IncludeTarget::Unresolved)
    }

    /// Serializable overview of the unit
    pub fn summary(&self) -> UnitSummary {
        let mut functions: Vec<String> = self.functions.keys().cloned().collect();
        functions.sort();
        let mut structs: Vec<String> = self.structs.keys().cloned().collect();
        structs.sort();

        UnitSummary {
            inputs: self.fragments.iter().map(|f| f.origin.clone()).collect(),
            functions,
            structs,
            macros: self.macros.len(),
            includes: self.includes.clone(),
        }
    }
}

/// Overview of a translation unit
#[derive(Debug, Clone, Serialize)]
pub struct UnitSummary {
    pub inputs: Vec<Origin>,
    pub functions: Vec<String>,
    pub structs: Vec<String>,
    pub macros: usize,
    pub includes: Vec<Include>,
}
