//! Macro Preamble Builder
//!
//! Produces the predefined macro text injected ahead of every input: a base
//! hosted-C99 block, the pointer-width block, the architecture's own macros
//! and, optionally, user definitions read from a file.

use cfront_core::{ArchBits, MacroDefinition};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::normalize::Target;

/// Marker line separating the predefined text from custom definitions
pub const CUSTOM_DEFINES_MARKER: &str = "// custom defines below";

/// Macros every target gets
pub fn base_macros() -> Vec<MacroDefinition> {
    vec![
        MacroDefinition::defined("__STDC__"),
        MacroDefinition::with_value("__STDC_VERSION__", "199901L"),
        MacroDefinition::defined("__STDC_HOSTED__"),
        MacroDefinition::with_value("__GNUC__", "4"),
        MacroDefinition::with_value("__GNUC_MINOR__", "2"),
        MacroDefinition::with_value("__CHAR_BIT__", "8"),
        MacroDefinition::with_value("__SCHAR_MAX__", "127"),
        MacroDefinition::with_value("__SHRT_MAX__", "32767"),
        MacroDefinition::with_value("__INT_MAX__", "2147483647"),
        MacroDefinition::with_value("__LONG_LONG_MAX__", "9223372036854775807LL"),
        MacroDefinition::with_value("__SIZEOF_INT__", "4"),
        MacroDefinition::with_value("__SIZEOF_LONG_LONG__", "8"),
        MacroDefinition::with_value("__builtin_va_list", "void *"),
        MacroDefinition::with_value("__extension__", ""),
        MacroDefinition::with_value("__inline", "inline"),
        MacroDefinition::with_value("__inline__", "inline"),
        MacroDefinition::with_value("__restrict", "restrict"),
        MacroDefinition::with_value("__restrict__", "restrict"),
        MacroDefinition::with_value("__const", "const"),
        MacroDefinition::with_value("__volatile__", "volatile"),
        MacroDefinition::function_like("__attribute__", &["x"], ""),
        MacroDefinition::function_like("__asm__", &["x"], ""),
    ]
}

/// Macros depending on the pointer width
pub fn width_macros(bits: ArchBits) -> Vec<MacroDefinition> {
    match bits {
        ArchBits::Bits32 => vec![
            MacroDefinition::defined("__ILP32__"),
            MacroDefinition::defined("_ILP32"),
            MacroDefinition::with_value("__SIZEOF_POINTER__", "4"),
            MacroDefinition::with_value("__SIZEOF_LONG__", "4"),
            MacroDefinition::with_value("__LONG_MAX__", "2147483647L"),
            MacroDefinition::with_value("__SIZE_TYPE__", "unsigned int"),
            MacroDefinition::with_value("__PTRDIFF_TYPE__", "int"),
            MacroDefinition::with_value("__INTPTR_TYPE__", "int"),
            MacroDefinition::with_value("__WCHAR_TYPE__", "long int"),
        ],
        ArchBits::Bits64 => vec![
            MacroDefinition::defined("__LP64__"),
            MacroDefinition::defined("_LP64"),
            MacroDefinition::with_value("__SIZEOF_POINTER__", "8"),
            MacroDefinition::with_value("__SIZEOF_LONG__", "8"),
            MacroDefinition::with_value("__LONG_MAX__", "9223372036854775807L"),
            MacroDefinition::with_value("__SIZE_TYPE__", "unsigned long"),
            MacroDefinition::with_value("__PTRDIFF_TYPE__", "long"),
            MacroDefinition::with_value("__INTPTR_TYPE__", "long"),
            MacroDefinition::with_value("__WCHAR_TYPE__", "int"),
        ],
    }
}

/// Predefined text for a target, without custom definitions
pub fn predefined_for(target: &Target) -> String {
    let mut macros = base_macros();
    macros.extend(width_macros(target.bits));
    if let Some(arch) = target.arch {
        macros.extend(arch.predefined_macros());
    }

    let mut text = String::new();
    for m in &macros {
        text.push_str(&m.to_directive());
        text.push('\n');
    }
    text
}

/// Build the full preamble, appending custom definitions if a path is given
pub fn build(target: &Target, custom_defines: Option<&Path>) -> Result<String> {
    let mut predefined = predefined_for(target);

    if let Some(path) = custom_defines {
        let bytes = fs::read(path).map_err(|source| Error::CustomDefines {
            path: path.to_path_buf(),
            source,
        })?;
        let custom = String::from_utf8_lossy(&bytes);
        if !custom.is_empty() {
            debug!("Appending {} bytes of custom defines from {:?}", custom.len(), path);
            predefined = format!("{}\n{}\n{}", predefined, CUSTOM_DEFINES_MARKER, custom);
        }
    }

    Ok(predefined)
}
