//! End-to-end tests for the parser front-end
//!
//! These build small source trees on disk and run configurations through
//! `Parser::new` and `Parser::parse`.

use super::*;
use crate::backend::IncludeTarget;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("include/drv")).unwrap();

    fs::write(
        root.join("src/main.c"),
        r#"#include <drv/device.h>
#include "util.h"
#include <stdio.h>

static int attach(struct device *dev) {
    setup(dev);
    return 0;
}
"#,
    )
    .unwrap();
    fs::write(root.join("src/util.h"), "int setup(struct device *dev);\n").unwrap();
    fs::write(
        root.join("include/drv/device.h"),
        "struct device {\n    int id;\n    const char *name;\n};\n",
    )
    .unwrap();

    temp
}

fn project_config(temp: &TempDir) -> Config {
    Config::default()
        .with_work_dir(temp.path())
        .with_include_path("include")
}

#[test]
fn test_nothing_to_parse() {
    let err = Parser::new(Config::default()).err().unwrap();
    assert!(matches!(err, Error::NoTargetPaths));
    assert_eq!(err.to_string(), "no target paths specified");
}

#[test]
fn test_relative_path_resolves_in_include_dir() {
    let temp = create_project();
    let mut config = project_config(&temp);
    config.target_paths.push("drv/device.h".into());

    let parser = Parser::new(config).unwrap();
    assert_eq!(
        parser.target_paths(),
        &[temp.path().join("include/drv/device.h")]
    );
    assert_eq!(parser.config().target_paths, parser.target_paths());
}

#[test]
fn test_missing_path_names_include_paths() {
    let temp = create_project();
    let mut config = project_config(&temp).with_include_path("/opt/sdk/include");
    config.target_paths.push("nowhere.c".into());

    let err = Parser::new(config).err().unwrap();
    assert_eq!(
        err.to_string(),
        "file specified but not found: nowhere.c (include paths: include, /opt/sdk/include)"
    );
}

#[test]
fn test_unknown_arch_is_not_fatal() {
    let temp = create_project();
    let mut config = project_config(&temp).with_arch("z80");
    config.target_paths.push("src/main.c".into());

    let parser = Parser::new(config).unwrap();
    assert_eq!(parser.target(), Target::default());
    assert!(parser.predefined().contains("#define __LP64__ 1"));
}

#[test]
fn test_unreadable_custom_defines() {
    let temp = create_project();
    let mut config = project_config(&temp).with_custom_defines(temp.path().join("defs.h"));
    config.target_paths.push("src/main.c".into());

    let err = Parser::new(config).err().unwrap();
    assert!(matches!(err, Error::CustomDefines { .. }));
}

#[test]
fn test_directory_target_dropped() {
    let temp = create_project();
    let mut config = project_config(&temp);
    config.target_paths.push("src".into());
    config.target_paths.push("src/main.c".into());
    config.target_paths.push("drv".into());

    let parser = Parser::new(config).unwrap();
    assert_eq!(parser.target_paths(), &[temp.path().join("src/main.c")]);
}

#[test]
fn test_only_directories_fails_backend_check() {
    let temp = create_project();
    let mut config = project_config(&temp);
    config.target_paths.push("src".into());

    let err = Parser::new(config).err().unwrap();
    assert!(matches!(err, Error::InvalidConfig(ConfigError::NoInput)));
}

#[test]
fn test_custom_defines_reach_the_unit() {
    let temp = create_project();
    let defs = temp.path().join("defs.h");
    fs::write(&defs, "#define DRIVER_NAME \"demo\"\n").unwrap();

    let config = project_config(&temp)
        .with_arch("arm")
        .with_custom_defines(&defs)
        .with_source_body("int x;\n");

    let parser = Parser::new(config).unwrap();
    assert!(parser
        .predefined()
        .ends_with("// custom defines below\n#define DRIVER_NAME \"demo\"\n"));

    let unit = parser.parse().unwrap();
    assert_eq!(unit.macro_value("DRIVER_NAME"), Some("\"demo\""));
    assert_eq!(unit.macro_value("__SIZE_TYPE__"), Some("unsigned int"));
    assert!(unit.is_defined("__arm__"));
    assert!(!unit.is_defined("__LP64__"));
}

#[test]
fn test_arch_selects_conditional_branch() {
    let body = "#ifdef __LP64__\nlong only64(void) { return 0; }\n#else\nint only32(void) { return 0; }\n#endif\n";

    let unit = Parser::new(Config::default().with_arch("arm").with_source_body(body))
        .unwrap()
        .parse()
        .unwrap();
    assert!(unit.functions().contains_key("only32"));
    assert!(!unit.functions().contains_key("only64"));

    let unit = Parser::new(Config::default().with_arch("amd64").with_source_body(body))
        .unwrap()
        .parse()
        .unwrap();
    assert!(unit.functions().contains_key("only64"));
    assert!(!unit.functions().contains_key("only32"));
}

#[test]
fn test_custom_macros_expand_in_inputs() {
    let temp = create_project();
    let defs = temp.path().join("defs.h");
    fs::write(
        &defs,
        "#define DECLARE_FN(n) int n(void) { return 0; }\n#define EXPORT_SYMBOL(sym) extern int __export_##sym\n",
    )
    .unwrap();

    let body = "static int x __attribute__((unused));\nEXPORT_SYMBOL(x);\nDECLARE_FN(foo)\nint f(void) { return x; }\n";
    let config = project_config(&temp)
        .with_custom_defines(&defs)
        .with_source_body(body);

    let unit = Parser::new(config).unwrap().parse().unwrap();
    assert!(unit.functions().contains_key("foo"));
    assert_eq!(unit.functions()["f"].location.as_ref().unwrap().line, 4);
    assert!(unit.fragments()[1].source().contains("extern int __export_x"));
}

#[test]
fn test_latin1_inputs_are_read() {
    let temp = create_project();
    fs::write(temp.path().join("src/latin1.c"), b"/* caf\xe9 */ int x;\n").unwrap();
    let defs = temp.path().join("defs.h");
    fs::write(&defs, b"// na\xefve\n#define NAIVE 1\n").unwrap();

    let mut config = project_config(&temp).with_custom_defines(&defs);
    config.target_paths.push("src/latin1.c".into());

    let unit = Parser::new(config).unwrap().parse().unwrap();
    assert!(unit.is_defined("NAIVE"));
    assert_eq!(unit.fragments().len(), 2);
}

#[test]
fn test_parse_project() {
    let temp = create_project();
    let mut config = project_config(&temp).with_source_body("int body_only(void) { return 1; }\n");
    config.target_paths.push("src/main.c".into());
    config.target_paths.push("drv/device.h".into());

    let unit = Parser::new(config).unwrap().parse().unwrap();

    let origins: Vec<_> = unit.fragments().iter().map(|f| f.origin().clone()).collect();
    assert_eq!(
        origins,
        vec![
            Origin::Predefined,
            Origin::File(temp.path().join("src/main.c")),
            Origin::File(temp.path().join("include/drv/device.h")),
            Origin::Body,
        ]
    );

    assert!(unit.functions().contains_key("attach"));
    assert!(unit.functions().contains_key("body_only"));
    assert_eq!(unit.functions()["attach"].params[0].type_name, "struct device*");
    assert_eq!(unit.structs()["device"].fields.len(), 2);

    let targets: Vec<_> = unit
        .includes()
        .iter()
        .map(|i| (i.header.as_str(), i.target.clone()))
        .collect();
    assert_eq!(
        targets,
        vec![
            (
                "drv/device.h",
                IncludeTarget::Local(temp.path().join("include/drv/device.h"))
            ),
            ("util.h", IncludeTarget::Local(temp.path().join("src/util.h"))),
            ("stdio.h", IncludeTarget::Unresolved),
        ]
    );
    assert_eq!(unit.unresolved_includes().count(), 1);
}

#[test]
fn test_web_includes() {
    let config = Config::default()
        .with_source_body("#include <sys/types.h>\n")
        .with_web_includes("https://headers.example.com/libc");

    let unit = Parser::new(config).unwrap().parse().unwrap();
    assert_eq!(
        unit.includes()[0].target,
        IncludeTarget::Web(
            url::Url::parse("https://headers.example.com/libc/sys/types.h").unwrap()
        )
    );
}

#[test]
fn test_invalid_web_prefix_rejected() {
    let config = Config::default()
        .with_source_body("int x;\n")
        .with_web_includes("headers");

    let err = Parser::new(config).err().unwrap();
    assert!(matches!(
        err,
        Error::InvalidConfig(ConfigError::InvalidWebPrefix { .. })
    ));
}

#[test]
fn test_syntax_error_passed_through() {
    let temp = create_project();
    fs::write(temp.path().join("src/bad.c"), "int main( {\n").unwrap();
    let mut config = project_config(&temp);
    config.target_paths.push("src/bad.c".into());

    let err = Parser::new(config).unwrap().parse().unwrap_err();
    match err {
        Error::Parse(ParseError::Syntax { origin, line, .. }) => {
            assert_eq!(origin, Origin::File(temp.path().join("src/bad.c")));
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_summary_serializes() {
    let unit = Parser::new(Config::default().with_source_body("struct s { int a; };\nvoid f(void) {}\n"))
        .unwrap()
        .parse()
        .unwrap();

    let summary = serde_json::to_value(unit.summary()).unwrap();
    assert_eq!(summary["functions"], serde_json::json!(["f"]));
    assert_eq!(summary["structs"], serde_json::json!(["s"]));
    assert_eq!(summary["inputs"][1], serde_json::json!({ "kind": "body" }));
}

/// Backend double recording how it is used
struct RecordingBackend {
    parses: Arc<AtomicUsize>,
    seen: Arc<std::sync::Mutex<Option<ParseConfig>>>,
    fail: bool,
}

impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn check(&self, config: &ParseConfig) -> std::result::Result<(), ConfigError> {
        *self.seen.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    fn parse(&self, _config: &ParseConfig) -> std::result::Result<TranslationUnit, ParseError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ParseError::Read {
                path: "/virtual/input.c".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            })
        } else {
            Ok(TranslationUnit::default())
        }
    }
}

fn recording(fail: bool) -> (RecordingBackend, Arc<AtomicUsize>, Arc<std::sync::Mutex<Option<ParseConfig>>>) {
    let parses = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(std::sync::Mutex::new(None));
    let backend = RecordingBackend {
        parses: parses.clone(),
        seen: seen.clone(),
        fail,
    };
    (backend, parses, seen)
}

#[test]
fn test_backend_receives_assembled_record() {
    let temp = create_project();
    let mut config = project_config(&temp)
        .with_source_body("int x;")
        .with_web_includes("https://example.com/inc/");
    config.target_paths.push("src/main.c".into());

    let (backend, parses, seen) = recording(false);
    let parser = Parser::with_backend(config, Box::new(backend)).unwrap();
    assert_eq!(parser.backend_name(), "recording");
    assert_eq!(parses.load(Ordering::SeqCst), 0);

    let record = seen.lock().unwrap().clone().unwrap();
    assert_eq!(&record, parser.parse_config());
    assert_eq!(record.paths, vec![temp.path().join("src/main.c")]);
    assert_eq!(record.body, b"int x;".to_vec());
    assert_eq!(record.sys_include_paths, vec![temp.path().join("include")]);
    assert!(record.web_includes_enabled);
    assert_eq!(record.web_include_prefix, "https://example.com/inc/");

    parser.parse().unwrap();
    assert_eq!(parses.load(Ordering::SeqCst), 1);
}

#[test]
fn test_backend_error_unchanged() {
    let (backend, parses, _) = recording(true);
    let parser = Parser::with_backend(Config::default().with_source_body("int x;"), Box::new(backend)).unwrap();

    match parser.parse().unwrap_err() {
        Error::Parse(ParseError::Read { path, source }) => {
            assert_eq!(path, Path::new("/virtual/input.c"));
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(parses.load(Ordering::SeqCst), 1);
}
