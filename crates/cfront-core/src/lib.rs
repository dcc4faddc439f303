//! cfront Core
//!
//! Configuration record, architecture table and shared types for the
//! cfront parser front-end.

pub mod config;
pub mod error;
pub mod location;
pub mod types;

pub use config::{ArchBits, Architecture, Config};
pub use error::{Error, Result};
pub use location::Location;
pub use types::*;
