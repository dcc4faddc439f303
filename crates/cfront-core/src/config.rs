//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::MacroDefinition;

/// Parser front-end configuration.
///
/// Keys are PascalCase in YAML (`Arch`, `IncludePaths`, `TargetPaths`, ...).
/// Missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// Architecture identifier (e.g. "amd64", "arm"); empty or unknown means 64-bit
    pub arch: String,

    /// File with additional macro definitions appended to the predefined text
    pub custom_defines_path: Option<PathBuf>,

    /// Resolve unmatched includes against `web_include_prefix`
    pub web_includes_enabled: bool,

    /// URL prefix for web includes
    pub web_include_prefix: String,

    /// Include search paths, in priority order
    pub include_paths: Vec<PathBuf>,

    /// Source files to parse
    pub target_paths: Vec<PathBuf>,

    /// Inline source text parsed after the target files
    pub source_body: String,

    /// Directory relative paths are resolved against (process cwd if unset)
    pub work_dir: Option<PathBuf>,
}

impl Config {
    /// Create a configuration for the given target paths
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            target_paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(content: &str) -> crate::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a YAML configuration file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn with_custom_defines(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_defines_path = Some(path.into());
        self
    }

    /// Enable web includes under the given URL prefix
    pub fn with_web_includes(mut self, prefix: impl Into<String>) -> Self {
        self.web_includes_enabled = true;
        self.web_include_prefix = prefix.into();
        self
    }

    pub fn with_source_body(mut self, body: impl Into<String>) -> Self {
        self.source_body = body.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Custom defines path, treating an empty path as absent
    pub fn custom_defines(&self) -> Option<&Path> {
        self.custom_defines_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Pointer width of the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchBits {
    Bits32,
    #[default]
    Bits64,
}

impl ArchBits {
    pub fn width(&self) -> u32 {
        match self {
            ArchBits::Bits32 => 32,
            ArchBits::Bits64 => 64,
        }
    }
}

/// Supported target architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    X86_64,
    I386,
    Arm64,
    Arm,
    Riscv64,
    Riscv32,
    Mips,
    PowerPC,
}

impl Architecture {
    /// Pointer width
    pub fn bits(&self) -> ArchBits {
        match self {
            Architecture::X86_64
            | Architecture::Arm64
            | Architecture::Riscv64
            | Architecture::PowerPC => ArchBits::Bits64,
            Architecture::I386 | Architecture::Arm | Architecture::Riscv32 | Architecture::Mips => {
                ArchBits::Bits32
            }
        }
    }

    /// Architecture-specific predefined macros
    pub fn predefined_macros(&self) -> Vec<MacroDefinition> {
        match self {
            Architecture::X86_64 => vec![
                MacroDefinition::defined("__x86_64__"),
                MacroDefinition::defined("__x86_64"),
                MacroDefinition::defined("__amd64__"),
                MacroDefinition::defined("__amd64"),
            ],
            Architecture::I386 => vec![
                MacroDefinition::defined("__i386__"),
                MacroDefinition::defined("__i386"),
                MacroDefinition::defined("__i686__"),
            ],
            Architecture::Arm64 => vec![MacroDefinition::defined("__aarch64__")],
            Architecture::Arm => vec![
                MacroDefinition::defined("__arm__"),
                MacroDefinition::defined("__ARMEL__"),
            ],
            Architecture::Riscv64 => vec![
                MacroDefinition::defined("__riscv"),
                MacroDefinition::with_value("__riscv_xlen", "64"),
            ],
            Architecture::Riscv32 => vec![
                MacroDefinition::defined("__riscv"),
                MacroDefinition::with_value("__riscv_xlen", "32"),
            ],
            Architecture::Mips => vec![
                MacroDefinition::defined("__mips__"),
                MacroDefinition::defined("__mips"),
            ],
            Architecture::PowerPC => vec![
                MacroDefinition::defined("__powerpc__"),
                MacroDefinition::defined("__powerpc64__"),
            ],
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Architecture::X86_64),
            "i386" | "i686" | "x86" | "386" => Ok(Architecture::I386),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "arm" | "arm32" | "armel" => Ok(Architecture::Arm),
            "riscv64" => Ok(Architecture::Riscv64),
            "riscv32" | "riscv" => Ok(Architecture::Riscv32),
            "mips" | "mipsle" => Ok(Architecture::Mips),
            "powerpc" | "ppc64" | "ppc64le" => Ok(Architecture::PowerPC),
            _ => Err(Error::UnknownArchitecture(s.to_string())),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Architecture::X86_64 => "x86_64",
            Architecture::I386 => "i386",
            Architecture::Arm64 => "arm64",
            Architecture::Arm => "arm",
            Architecture::Riscv64 => "riscv64",
            Architecture::Riscv32 => "riscv32",
            Architecture::Mips => "mips",
            Architecture::PowerPC => "powerpc",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_keeps_paths() {
        let config = Config::new(["a.c", "dir/b.h"]);
        assert_eq!(
            config.target_paths,
            vec![PathBuf::from("a.c"), PathBuf::from("dir/b.h")]
        );
        assert!(config.arch.is_empty());
        assert!(!config.web_includes_enabled);
    }

    #[test]
    fn test_yaml_pascal_case_keys() {
        let yaml = r#"
Arch: arm
CustomDefinesPath: defs.h
WebIncludesEnabled: true
WebIncludePrefix: "https://example.com/include/"
IncludePaths:
  - /usr/include
  - inc
TargetPaths:
  - main.c
SourceBody: "int x;"
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.arch, "arm");
        assert_eq!(config.custom_defines(), Some(Path::new("defs.h")));
        assert!(config.web_includes_enabled);
        assert_eq!(config.web_include_prefix, "https://example.com/include/");
        assert_eq!(config.include_paths.len(), 2);
        assert_eq!(config.target_paths, vec![PathBuf::from("main.c")]);
        assert_eq!(config.source_body, "int x;");
        assert_eq!(config.work_dir, None);
    }

    #[test]
    fn test_yaml_empty_document() {
        let config = Config::from_yaml_str("  \n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("cfront.yaml");
        std::fs::write(&path, "Arch: i386\nTargetPaths: [x.c]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.arch, "i386");
        assert_eq!(config.target_paths, vec![PathBuf::from("x.c")]);
    }

    #[test]
    fn test_empty_custom_defines_is_absent() {
        let config = Config::new(["a.c"]).with_custom_defines("");
        assert_eq!(config.custom_defines(), None);
    }

    #[test]
    fn test_architecture_aliases() {
        assert_eq!("amd64".parse::<Architecture>().unwrap(), Architecture::X86_64);
        assert_eq!("386".parse::<Architecture>().unwrap(), Architecture::I386);
        assert_eq!("AArch64".parse::<Architecture>().unwrap(), Architecture::Arm64);

        let err = "vax".parse::<Architecture>().unwrap_err();
        assert!(matches!(&err, Error::UnknownArchitecture(name) if name == "vax"));
        assert_eq!(err.to_string(), "unknown architecture: vax");
    }

    #[test]
    fn test_architecture_bits() {
        assert_eq!(Architecture::X86_64.bits(), ArchBits::Bits64);
        assert_eq!(Architecture::Arm.bits(), ArchBits::Bits32);
        assert_eq!(ArchBits::default(), ArchBits::Bits64);
    }
}
