//! Include directive resolution
//!
//! Locates the file an `#include` names without reading it.

use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use super::unit::IncludeTarget;

/// Resolver for `#include` directives
#[derive(Debug, Clone, Default)]
pub struct IncludeResolver {
    /// Include search paths
    search_dirs: Vec<PathBuf>,
    /// Base URL for web includes
    web_base: Option<Url>,
}

impl IncludeResolver {
    pub fn new(search_dirs: Vec<PathBuf>, web_base: Option<Url>) -> Self {
        Self {
            search_dirs,
            web_base,
        }
    }

    /// Resolve a header name.
    ///
    /// Quoted includes (`system == false`) try the including file's
    /// directory first. Then the search paths are tried in order, then the
    /// web prefix if web includes are enabled.
    pub fn resolve(&self, header: &str, system: bool, from_dir: Option<&Path>) -> IncludeTarget {
        if !system {
            if let Some(dir) = from_dir {
                let relative = dir.join(header);
                if relative.is_file() {
                    debug!("Resolved {} relative to {:?}", header, dir);
                    return IncludeTarget::Local(relative);
                }
            }
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(header);
            if candidate.is_file() {
                debug!("Resolved {} in {:?}", header, dir);
                return IncludeTarget::Local(candidate);
            }
        }

        if let Some(base) = &self.web_base {
            if let Some(url) = web_url(base, header) {
                debug!("Resolved {} to {}", header, url);
                return IncludeTarget::Web(url);
            }
        }

        debug!("Failed to resolve include: {}", header);
        IncludeTarget::Unresolved
    }
}

/// Join a header onto the web prefix, refusing anything that lands outside it
fn web_url(base: &Url, header: &str) -> Option<Url> {
    // absolute paths, scheme-bearing and protocol-relative names replace the base
    if header.starts_with('/') || header.starts_with('\\') || Url::parse(header).is_ok() {
        debug!("Refusing web include {:?}: not relative to the prefix", header);
        return None;
    }

    let url = base.join(header).ok()?;
    if !url.as_str().starts_with(base.as_str()) {
        debug!("Refusing web include {:?}: escapes {}", header, base);
        return None;
    }
    Some(url)
}
