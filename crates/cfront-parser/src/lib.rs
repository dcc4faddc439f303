//! cfront Parser
//!
//! Prepares a C parse and hands it to a backend parser (tree-sitter by
//! default).
//!
//! ## Modules
//!
//! - `normalize` - Required-field checks and target defaults
//! - `resolve` - Target path resolution against the include search list
//! - `preamble` - Architecture-specific predefined macro text
//! - `backend` - Backend trait, invocation record, preprocessor and the tree-sitter backend

pub mod backend;
pub mod error;
pub mod normalize;
pub mod preamble;
pub mod resolve;

pub use backend::{
    get_backend, Backend, ConfigError, Origin, ParseConfig, ParseError, PreprocessError,
    TranslationUnit, TreeSitterBackend,
};
pub use error::{Error, Result};
pub use normalize::Target;
pub use resolve::PathResolver;

use cfront_core::Config;
use std::path::PathBuf;
use tracing::{debug, info};

/// A validated parse, ready to run once
pub struct Parser {
    config: Config,
    target: Target,
    parse_config: ParseConfig,
    backend: Box<dyn Backend>,
}

impl Parser {
    /// Validate a configuration for the default backend
    pub fn new(config: Config) -> Result<Self> {
        Self::with_backend(config, get_backend())
    }

    /// Validate a configuration for a specific backend.
    ///
    /// Checks required fields, resolves target paths, builds the predefined
    /// macro text and lets the backend check the resulting record.
    pub fn with_backend(mut config: Config, backend: Box<dyn Backend>) -> Result<Self> {
        let target = normalize::check_config(&config)?;

        let resolver = PathResolver::from_config(&config)?;
        let paths = resolver.resolve_targets(&config.target_paths)?;

        let predefined = preamble::build(&target, config.custom_defines())?;

        let parse_config = ParseConfig {
            predefined,
            paths: paths.clone(),
            body: config.source_body.clone().into_bytes(),
            sys_include_paths: resolver.search_dirs().to_vec(),
            web_includes_enabled: config.web_includes_enabled,
            web_include_prefix: config.web_include_prefix.clone(),
        };
        backend.check(&parse_config)?;

        debug!(
            "Prepared {} parse: {} of {} targets kept, {}-bit",
            backend.name(),
            paths.len(),
            config.target_paths.len(),
            target.bits.width()
        );
        config.target_paths = paths;

        Ok(Self {
            config,
            target,
            parse_config,
            backend,
        })
    }

    /// Run the backend once and return its translation unit
    pub fn parse(self) -> Result<TranslationUnit> {
        info!(
            "Parsing {} files with {}",
            self.parse_config.paths.len(),
            self.backend.name()
        );
        Ok(self.backend.parse(&self.parse_config)?)
    }

    /// Configuration with target paths replaced by their resolved form
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Predefined macro text, including custom definitions
    pub fn predefined(&self) -> &str {
        &self.parse_config.predefined
    }

    /// Absolute paths of the files that will be parsed
    pub fn target_paths(&self) -> &[PathBuf] {
        &self.parse_config.paths
    }

    pub fn parse_config(&self) -> &ParseConfig {
        &self.parse_config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests;
