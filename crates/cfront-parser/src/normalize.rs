//! Configuration normalizer
//!
//! Fills in the target defaults and rejects configurations with nothing to parse.

use cfront_core::{ArchBits, Architecture, Config};
use tracing::debug;

use crate::error::{Error, Result};

/// Normalized target description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target {
    /// Recognized architecture, `None` when the identifier was empty or unknown
    pub arch: Option<Architecture>,
    /// Pointer width used to pick the predefined macros
    pub bits: ArchBits,
}

impl Target {
    /// Target for an architecture identifier; unknown identifiers fall back to 64-bit
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier.parse::<Architecture>() {
            Ok(arch) => Self {
                arch: Some(arch),
                bits: arch.bits(),
            },
            Err(_) => {
                debug!("Architecture {:?} not recognized, using 64-bit profile", identifier);
                Self::default()
            }
        }
    }
}

/// Validate required fields and derive the target
pub fn check_config(config: &Config) -> Result<Target> {
    if config.target_paths.is_empty() && config.source_body.is_empty() {
        return Err(Error::NoTargetPaths);
    }
    Ok(Target::from_identifier(&config.arch))
}
