//! Per-language function/type definition extraction.

use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;

/// One discovered definition, prior to liveness classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDef {
    pub name: String,
    pub file_path: String,
    pub line: u32,
    pub exported: bool,
    pub kind: SymbolKind,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Go,
    JavaScript,
    Python,
    Java,
    Rust,
    Ruby,
    Php,
    Swift,
    Scala,
    Elixir,
    CSharp,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "go" => Self::Go,
            "js" | "jsx" | "ts" | "tsx" => Self::JavaScript,
            "py" => Self::Python,
            "java" => Self::Java,
            "rs" => Self::Rust,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "swift" => Self::Swift,
            "scala" => Self::Scala,
            "ex" => Self::Elixir,
            "cs" => Self::CSharp,
            _ => return None,
        })
    }
}

struct LangPatterns {
    functions: &'static [&'static LazyLock<Regex>],
    types: &'static [&'static LazyLock<Regex>],
}

static GO_FUNC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?(\w+)\s*\(").unwrap());
static GO_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^type\s+(\w+)\s+(?:struct|interface)\b").unwrap());

static JS_FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+(\w+)\s*\(").unwrap()
});
static JS_ARROW_CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s*)?\([^)]*\)\s*=>").unwrap()
});
static JS_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:export\s+)?(?:default\s+)?class\s+(\w+)").unwrap());

static PY_DEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*def\s+(\w+)\s*\(").unwrap());
static PY_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*class\s+(\w+)").unwrap());

static JAVA_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(public|private|protected)\s+(?:static\s+|final\s+)*[\w<>\[\],\s]+?\s+(\w+)\s*\(").unwrap()
});
static JAVA_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(public|private|protected)?\s*(?:final\s+|abstract\s+)*class\s+(\w+)").unwrap());

static RUST_FN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)").unwrap());
static RUST_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+(\w+)").unwrap());

static RB_DEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*def\s+(?:self\.)?(\w+)").unwrap());
static RB_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:class|module)\s+(\w+)").unwrap());

static PHP_FUNC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:public\s+|private\s+|protected\s+|static\s+)*function\s+(\w+)\s*\(").unwrap());
static PHP_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*class\s+(\w+)").unwrap());

static SWIFT_FUNC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:public\s+|private\s+|internal\s+)?func\s+(\w+)\s*\(").unwrap());
static SWIFT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:public\s+|private\s+|internal\s+)?(?:class|struct|enum)\s+(\w+)").unwrap());

static SCALA_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:private\s+|protected\s+)?def\s+(\w+)\s*[(:]").unwrap());
static SCALA_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:case\s+)?(?:class|object|trait)\s+(\w+)").unwrap());

static EX_DEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*def\s+(\w+)").unwrap());
static EX_MODULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*defmodule\s+([\w.]+)").unwrap());

static CS_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(public|private|protected|internal)\s+(?:static\s+|virtual\s+|override\s+)*[\w<>\[\],\s]+?\s+(\w+)\s*\(").unwrap()
});
static CS_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:public|private|protected|internal)?\s*class\s+(\w+)").unwrap());

/// Extracts every candidate function/type definition from `contents`.
/// Does not yet apply `should_skip_symbol` — callers filter afterward.
pub fn extract_definitions(relative_path: &str, contents: &str) -> Vec<SymbolDef> {
    let Some(ext) = Utf8Path::new(relative_path).extension() else {
        return Vec::new();
    };
    let Some(language) = Language::from_extension(ext) else {
        return Vec::new();
    };

    let mut defs = Vec::new();
    match language {
        Language::Go => {
            collect(&GO_FUNC, contents, relative_path, language, SymbolKind::Function, |caps| {
                (caps[1].to_string(), caps[1].chars().next().is_some_and(char::is_uppercase))
            })
            .into_iter()
            .for_each(|d| defs.push(d));
            collect(&GO_TYPE, contents, relative_path, language, SymbolKind::Type, |caps| {
                (caps[1].to_string(), caps[1].chars().next().is_some_and(char::is_uppercase))
            })
            .into_iter()
            .for_each(|d| defs.push(d));
        }
        Language::JavaScript => {
            for re in [&JS_FUNC, &JS_ARROW_CONST] {
                collect(re, contents, relative_path, language, SymbolKind::Function, |caps| (caps[1].to_string(), true))
                    .into_iter()
                    .for_each(|d| defs.push(d));
            }
            collect(&JS_CLASS, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::Python => {
            collect(&PY_DEF, contents, relative_path, language, SymbolKind::Function, |caps| {
                let name = caps[1].to_string();
                let exported = !name.starts_with('_');
                (name, exported)
            })
            .into_iter()
            .for_each(|d| defs.push(d));
            collect(&PY_CLASS, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::Java => {
            collect(&JAVA_METHOD, contents, relative_path, language, SymbolKind::Function, |caps| {
                (caps[2].to_string(), &caps[1] == "public")
            })
            .into_iter()
            .for_each(|d| defs.push(d));
            collect(&JAVA_CLASS, contents, relative_path, language, SymbolKind::Type, |caps| {
                (caps[2].to_string(), caps.get(1).map(|m| m.as_str()) == Some("public"))
            })
            .into_iter()
            .for_each(|d| defs.push(d));
        }
        Language::Rust => {
            collect(&RUST_FN, contents, relative_path, language, SymbolKind::Function, |caps| {
                (caps[2].to_string(), caps.get(1).is_some())
            })
            .into_iter()
            .for_each(|d| defs.push(d));
            collect(&RUST_TYPE, contents, relative_path, language, SymbolKind::Type, |caps| {
                (caps[2].to_string(), caps.get(1).is_some())
            })
            .into_iter()
            .for_each(|d| defs.push(d));
        }
        Language::Ruby => {
            collect(&RB_DEF, contents, relative_path, language, SymbolKind::Function, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
            collect(&RB_CLASS, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::Php => {
            collect(&PHP_FUNC, contents, relative_path, language, SymbolKind::Function, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
            collect(&PHP_CLASS, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::Swift => {
            collect(&SWIFT_FUNC, contents, relative_path, language, SymbolKind::Function, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
            collect(&SWIFT_TYPE, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::Scala => {
            collect(&SCALA_DEF, contents, relative_path, language, SymbolKind::Function, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
            collect(&SCALA_TYPE, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::Elixir => {
            collect(&EX_DEF, contents, relative_path, language, SymbolKind::Function, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
            collect(&EX_MODULE, contents, relative_path, language, SymbolKind::Type, |caps| (caps[1].to_string(), true))
                .into_iter()
                .for_each(|d| defs.push(d));
        }
        Language::CSharp => {
            collect(&CS_METHOD, contents, relative_path, language, SymbolKind::Function, |caps| {
                (caps[2].to_string(), &caps[1] == "public")
            })
            .into_iter()
            .for_each(|d| defs.push(d));
            collect(&CS_CLASS, contents, relative_path, language, SymbolKind::Type, |caps| {
                (caps[1].to_string(), true)
            })
            .into_iter()
            .for_each(|d| defs.push(d));
        }
    }
    defs
}

fn collect(
    re: &Regex,
    contents: &str,
    relative_path: &str,
    language: Language,
    kind: SymbolKind,
    name_and_visibility: impl Fn(&regex::Captures) -> (String, bool),
) -> Vec<SymbolDef> {
    let mut out = Vec::new();
    for caps in re.captures_iter(contents) {
        let whole = caps.get(0).unwrap();
        let line = 1 + contents[..whole.start()].matches('\n').count() as u32;
        let (name, exported) = name_and_visibility(&caps);
        out.push(SymbolDef {
            name,
            file_path: relative_path.to_string(),
            line,
            exported,
            kind,
            language,
        });
    }
    out
}

/// Excludes symbols that are conventionally entry points, lifecycle hooks,
/// or too short to be meaningfully "unused" (constructors, `main`, test
/// harness functions, dunder methods, 1-2 character identifiers).
pub fn should_skip_symbol(name: &str) -> bool {
    if name.len() <= 2 {
        return true;
    }
    if name.starts_with("__") && name.ends_with("__") {
        return true;
    }
    matches!(name, "main" | "init" | "constructor" | "render")
        || name.starts_with("Test")
        || name.starts_with("Benchmark")
        || name.starts_with("Example")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_extracts_function_and_visibility() {
        let defs = extract_definitions("pkg/a.go", "func unusedHelper() {}\n\nfunc UsedFunc() {}\n");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "unusedHelper");
        assert!(!defs[0].exported);
        assert_eq!(defs[1].name, "UsedFunc");
        assert!(defs[1].exported);
    }

    #[test]
    fn rust_detects_pub_prefix() {
        let defs = extract_definitions("src/lib.rs", "pub fn exposed() {}\nfn hidden() {}\n");
        assert_eq!(defs.len(), 2);
        assert!(defs[0].exported);
        assert!(!defs[1].exported);
    }

    #[test]
    fn skip_rules_cover_entrypoints_and_short_names() {
        assert!(should_skip_symbol("main"));
        assert!(should_skip_symbol("TestFoo"));
        assert!(should_skip_symbol("__init__"));
        assert!(should_skip_symbol("ab"));
        assert!(!should_skip_symbol("unusedHelper"));
    }
}
