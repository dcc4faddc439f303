//! Parser backends
//!
//! A backend owns the actual C parsing. cfront hands it a [`ParseConfig`],
//! lets it validate that record, and calls its parse entry point once.
//!
//! The default backend is tree-sitter with the `tree-sitter-c` grammar. The
//! predefined text, every path and the inline body are preprocessed against
//! one shared macro table, then parsed into separate syntax trees and
//! collected into one [`TranslationUnit`].

mod extract;
mod include;
mod preprocess;
mod unit;

pub use include::IncludeResolver;
pub use preprocess::{PreprocessError, Preprocessor};
pub use unit::{Fragment, Include, IncludeTarget, Origin, TranslationUnit, UnitSummary};

use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use tree_sitter::{Node, Parser as TSParser};
use url::Url;

use extract::Extractor;

/// Invocation record handed to a backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseConfig {
    /// Predefined macro text applied to every input
    pub predefined: String,
    /// Absolute paths of the files to parse
    pub paths: Vec<PathBuf>,
    /// Inline source, parsed after the files
    pub body: Vec<u8>,
    /// Directories searched for `#include` targets
    pub sys_include_paths: Vec<PathBuf>,
    pub web_includes_enabled: bool,
    pub web_include_prefix: String,
}

/// Rejections from a backend's configuration check
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("nothing to parse: no paths and no source body")]
    NoInput,

    #[error("path is not absolute: {}", .0.display())]
    RelativePath(PathBuf),

    #[error("source body is not valid UTF-8: {0}")]
    BodyEncoding(#[from] std::str::Utf8Error),

    #[error("web includes enabled but no prefix given")]
    MissingWebPrefix,

    #[error("invalid web include prefix {prefix:?}: {source}")]
    InvalidWebPrefix {
        prefix: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported web include scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),
}

/// Failures while parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load C grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parser produced no tree for {0}")]
    Aborted(Origin),

    #[error("{origin}: {source}")]
    Preprocess {
        origin: Origin,
        #[source]
        source: PreprocessError,
    },

    #[error("{origin}:{line}:{column}: syntax error near {near:?}")]
    Syntax {
        origin: Origin,
        line: u32,
        column: u32,
        near: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Backend trait for the external C parser
pub trait Backend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Validate an invocation record
    fn check(&self, config: &ParseConfig) -> Result<(), ConfigError>;

    /// Parse everything the record names into one translation unit
    fn parse(&self, config: &ParseConfig) -> Result<TranslationUnit, ParseError>;
}

/// Get the default backend
pub fn get_backend() -> Box<dyn Backend> {
    Box::new(TreeSitterBackend::new())
}

/// Validate a record the way the default backend does
pub fn check_parse_config(config: &ParseConfig) -> Result<(), ConfigError> {
    if config.paths.is_empty() && config.body.is_empty() {
        return Err(ConfigError::NoInput);
    }
    if let Some(path) = config.paths.iter().find(|p| !p.is_absolute()) {
        return Err(ConfigError::RelativePath(path.clone()));
    }
    std::str::from_utf8(&config.body)?;
    web_base(config)?;
    Ok(())
}

/// Base URL for web includes, `None` when they are disabled
fn web_base(config: &ParseConfig) -> Result<Option<Url>, ConfigError> {
    if !config.web_includes_enabled {
        return Ok(None);
    }

    let prefix = config.web_include_prefix.trim();
    if prefix.is_empty() {
        return Err(ConfigError::MissingWebPrefix);
    }

    let mut base = Url::parse(prefix).map_err(|source| ConfigError::InvalidWebPrefix {
        prefix: prefix.to_string(),
        source,
    })?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(base.scheme().to_string()));
    }

    // Url::join replaces the last segment unless the base ends in a slash
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(Some(base))
}

/// tree-sitter based backend
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterBackend;

impl TreeSitterBackend {
    pub fn new() -> Self {
        Self
    }

    fn parse_fragment(
        &self,
        parser: &mut TSParser,
        preprocessor: &mut Preprocessor,
        includes: &IncludeResolver,
        origin: Origin,
        text: &str,
        unit: &mut TranslationUnit,
    ) -> Result<(), ParseError> {
        let source = preprocessor.run(text).map_err(|source| ParseError::Preprocess {
            origin: origin.clone(),
            source,
        })?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::Aborted(origin.clone()))?;

        let root = tree.root_node();
        if root.has_error() {
            let node = first_error(root).unwrap_or(root);
            let pos = node.start_position();
            return Err(ParseError::Syntax {
                near: error_context(node, &source),
                origin,
                line: pos.row as u32 + 1,
                column: pos.column as u32,
            });
        }

        let definitions = Extractor::new(&source, &origin, includes).run(root);
        debug!(
            "Parsed {}: {} functions, {} structs, {} macros, {} includes",
            origin,
            definitions.functions.len(),
            definitions.structs.len(),
            definitions.macros.len(),
            definitions.includes.len()
        );
        unit.push(Fragment::new(origin, source, tree), definitions);
        Ok(())
    }
}

impl Backend for TreeSitterBackend {
    fn name(&self) -> &str {
        "tree-sitter"
    }

    fn check(&self, config: &ParseConfig) -> Result<(), ConfigError> {
        check_parse_config(config)
    }

    fn parse(&self, config: &ParseConfig) -> Result<TranslationUnit, ParseError> {
        self.check(config)?;

        let mut parser = TSParser::new();
        parser.set_language(&tree_sitter_c::LANGUAGE.into())?;

        let includes = IncludeResolver::new(config.sys_include_paths.clone(), web_base(config)?);
        let mut preprocessor = Preprocessor::new();
        let mut unit = TranslationUnit::default();

        self.parse_fragment(
            &mut parser,
            &mut preprocessor,
            &includes,
            Origin::Predefined,
            &config.predefined,
            &mut unit,
        )?;

        for path in &config.paths {
            let bytes = fs::read(path).map_err(|source| ParseError::Read {
                path: path.clone(),
                source,
            })?;
            let source = String::from_utf8_lossy(&bytes);
            self.parse_fragment(
                &mut parser,
                &mut preprocessor,
                &includes,
                Origin::File(path.clone()),
                &source,
                &mut unit,
            )?;
        }

        if !config.body.is_empty() {
            let body = std::str::from_utf8(&config.body).map_err(ConfigError::from)?;
            self.parse_fragment(&mut parser, &mut preprocessor, &includes, Origin::Body, body, &mut unit)?;
        }

        info!(
            "Parsed translation unit: {} inputs, {} functions, {} structs",
            unit.fragments().len(),
            unit.functions().len(),
            unit.structs().len()
        );
        Ok(unit)
    }
}

/// Deepest-first search for the first ERROR or MISSING node
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

fn error_context(node: Node, source: &str) -> String {
    if node.is_missing() {
        return format!("missing {}", node.kind());
    }
    let text = node.utf8_text(source.as_bytes()).unwrap_or("");
    let line = text.lines().next().unwrap_or("").trim();
    line.chars().take(40).collect()
}
