//! Target Path Resolver
//!
//! Turns the configured target paths into absolute paths of existing files,
//! searching the working directory first and then the include paths.

use cfront_core::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Resolver for target source files
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Directory relative paths are looked up in first
    work_dir: PathBuf,
    /// Include paths as configured, reported on lookup failure
    include_paths: Vec<PathBuf>,
    /// Include paths anchored at `work_dir`
    search_dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// Create a resolver; relative include paths are anchored at `work_dir`
    pub fn new(work_dir: PathBuf, include_paths: Vec<PathBuf>) -> Self {
        let search_dirs = include_paths.iter().map(|p| work_dir.join(p)).collect();
        Self {
            work_dir,
            include_paths,
            search_dirs,
        }
    }

    /// Create a resolver for a configuration, defaulting to the process working directory
    pub fn from_config(config: &Config) -> Result<Self> {
        let work_dir = match &config.work_dir {
            Some(dir) => std::path::absolute(dir).map_err(Error::WorkDir)?,
            None => std::env::current_dir().map_err(Error::WorkDir)?,
        };
        Ok(Self::new(work_dir, config.include_paths.clone()))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Include search directories, anchored at the working directory
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Find a relative path in the working directory or the include paths.
    /// The first existing match wins.
    pub fn find_file(&self, path: &Path) -> Option<PathBuf> {
        let local = self.work_dir.join(path);
        if local.exists() {
            debug!("Resolved {:?} in working directory", path);
            return Some(local);
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(path);
            if candidate.exists() {
                debug!("Resolved {:?} in {:?}", path, dir);
                return Some(candidate);
            }
        }

        None
    }

    /// Resolve target paths to absolute file paths, preserving order.
    ///
    /// A relative path that cannot be found is an error. Entries that turn
    /// out to be directories (or cannot be stat'ed) are dropped silently.
    pub fn resolve_targets(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut resolved = Vec::with_capacity(paths.len());

        for path in paths {
            let candidate = if path.is_absolute() {
                path.clone()
            } else {
                self.find_file(path).ok_or_else(|| Error::FileNotFound {
                    path: path.clone(),
                    include_paths: self.include_paths.clone(),
                })?
            };

            match fs::metadata(&candidate) {
                Ok(meta) if !meta.is_dir() => {}
                _ => {
                    debug!("Skipping {:?}: not a regular file", candidate);
                    continue;
                }
            }

            let absolute = std::path::absolute(&candidate).unwrap_or(candidate);
            resolved.push(absolute);
        }

        Ok(resolved)
    }
}
