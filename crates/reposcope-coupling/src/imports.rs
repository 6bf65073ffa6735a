//! Per-language import extraction and resolution to in-repository module
//! identities.
//!
//! Extraction (regex scan of raw text) and resolution (mapping whatever the
//! regex captured to a module identity already present in the repo's
//! module set) are split so that each language's resolution quirks — Go's
//! module-path prefix stripping, relative-path joins for C-family
//! languages, Python's longest-prefix fallback — live next to each other
//! without tangling the extraction regexes.

use std::sync::LazyLock;

use camino::Utf8Path;
use indexmap::IndexSet;
use regex::Regex;

static GO_IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?m)^\s*import\s+"([^"]+)""#).unwrap());
static GO_IMPORT_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)import\s*\(([^)]*)\)").unwrap());
static GO_IMPORT_BLOCK_ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static GO_MODULE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^module\s+(\S+)").unwrap());

static JS_FROM_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:import|export)\s+(?:[^'"]*\sfrom\s+)?['"]([^'"]+)['"]"#).unwrap());
static JS_REQUIRE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static PY_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+)").unwrap());
static PY_FROM_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*from\s+([\w.]+)\s+import").unwrap());

static JAVA_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+)\*?;").unwrap());

static RUST_USE_CRATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"use\s+crate::(\w+)").unwrap());
static RUST_MOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(?:pub\s+)?mod\s+(\w+);").unwrap());

static RB_REQUIRE_RELATIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"require_relative\s+['"]([^'"]+)['"]"#).unwrap());
static RB_REQUIRE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"require\s+['"]([^'"]+)['"]"#).unwrap());

static C_INCLUDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"#include\s+"([^"]+)""#).unwrap());

static PHP_USE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"use\s+([\w\\]+);").unwrap());
static PHP_REQUIRE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"require(?:_once)?\s*\(?['"]([^'"]+)['"]"#).unwrap());

static SWIFT_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+(\w+)").unwrap());

static EX_ALIAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:alias|import|use)\s+([\w.]+)").unwrap());

/// Raw (un-resolved) import tokens extracted from `contents`, given the
/// file's extension.
fn raw_imports(ext: &str, contents: &str) -> Vec<String> {
    let mut out = Vec::new();
    match ext {
        "go" => {
            out.extend(GO_IMPORT_LINE.captures_iter(contents).map(|c| c[1].to_string()));
            for block in GO_IMPORT_BLOCK.captures_iter(contents) {
                out.extend(GO_IMPORT_BLOCK_ENTRY.captures_iter(&block[1]).map(|c| c[1].to_string()));
            }
        }
        "js" | "jsx" | "ts" | "tsx" => {
            out.extend(JS_FROM_IMPORT.captures_iter(contents).map(|c| c[1].to_string()));
            out.extend(JS_REQUIRE.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "py" => {
            out.extend(PY_IMPORT.captures_iter(contents).map(|c| c[1].to_string()));
            out.extend(PY_FROM_IMPORT.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "java" | "scala" => {
            out.extend(JAVA_IMPORT.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "rs" => {
            out.extend(RUST_USE_CRATE.captures_iter(contents).map(|c| c[1].to_string()));
            out.extend(RUST_MOD.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "rb" => {
            out.extend(RB_REQUIRE_RELATIVE.captures_iter(contents).map(|c| c[1].to_string()));
            out.extend(RB_REQUIRE.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "c" | "h" | "cpp" | "hpp" => {
            out.extend(C_INCLUDE.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "php" => {
            out.extend(PHP_USE.captures_iter(contents).map(|c| c[1].replace('\\', "/")));
            out.extend(PHP_REQUIRE.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "swift" => {
            out.extend(SWIFT_IMPORT.captures_iter(contents).map(|c| c[1].to_string()));
        }
        "ex" => {
            out.extend(EX_ALIAS.captures_iter(contents).map(|c| c[1].to_string()));
        }
        _ => {}
    }
    out
}

/// Extracts and resolves every import in `contents` (a file at
/// `relative_path`) to module identities present in `known_modules`.
/// Imports that don't resolve to an in-repo module (standard library,
/// third-party, typo) are silently dropped.
pub fn resolve_file_imports(
    relative_path: &str,
    contents: &str,
    known_modules: &IndexSet<String>,
    go_module_prefix: Option<&str>,
) -> Vec<String> {
    let path = Utf8Path::new(relative_path);
    let Some(ext) = path.extension() else {
        return Vec::new();
    };
    let current_dir = path.parent().map(|p| p.as_str()).unwrap_or("");

    let mut resolved = Vec::new();
    for raw in raw_imports(ext, contents) {
        let candidate = match ext {
            "go" => resolve_go(&raw, go_module_prefix),
            "py" => resolve_python(&raw, known_modules),
            "java" | "scala" => resolve_dotted_package(&raw),
            "rs" => Some(raw),
            "js" | "jsx" | "ts" | "tsx" | "rb" | "c" | "h" | "cpp" | "hpp" | "swift" => {
                resolve_relative(current_dir, &raw, ext)
            }
            "php" => resolve_relative(current_dir, &raw, ext).or(Some(raw)),
            "ex" => resolve_dotted_package(&raw),
            _ => None,
        };

        if let Some(candidate) = candidate
            && known_modules.contains(&candidate)
            && candidate != relative_module_identity(relative_path)
        {
            resolved.push(candidate);
        }
    }
    resolved.sort();
    resolved.dedup();
    resolved
}

fn relative_module_identity(relative_path: &str) -> String {
    crate::identity::module_identity(relative_path).unwrap_or_default()
}

fn resolve_go(raw: &str, module_prefix: Option<&str>) -> Option<String> {
    let prefix = module_prefix?;
    let stripped = raw.strip_prefix(prefix)?;
    let stripped = stripped.trim_start_matches('/');
    Some(if stripped.is_empty() { ".".to_string() } else { stripped.to_string() })
}

/// Extracts the `module` declaration from a `go.mod` file's contents.
pub fn go_module_prefix(go_mod_contents: &str) -> Option<String> {
    GO_MODULE_LINE.captures(go_mod_contents).map(|c| c[1].to_string())
}

fn resolve_python(raw: &str, known_modules: &IndexSet<String>) -> Option<String> {
    if known_modules.contains(raw) {
        return Some(raw.to_string());
    }
    // Longest-prefix fallback: a child module's absent import resolves to
    // its parent package.
    let mut segments: Vec<&str> = raw.split('.').collect();
    while segments.pop().is_some() && !segments.is_empty() {
        let candidate = segments.join(".");
        if known_modules.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn resolve_dotted_package(raw: &str) -> Option<String> {
    let mut segments: Vec<&str> = raw.split('.').collect();
    segments.pop()?;
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("."))
}

/// Resolves a relative import path (`./foo`, `../bar/baz`) against the
/// importing file's directory, trying the literal extension and (for
/// extension-stripped languages) the bare path and `/index` variants.
fn resolve_relative(current_dir: &str, raw: &str, ext: &str) -> Option<String> {
    if !raw.starts_with('.') {
        return None;
    }
    let joined = normalize_join(current_dir, raw);

    match ext {
        "js" | "jsx" | "ts" | "tsx" => Some(joined),
        "rb" | "php" | "swift" => Some(joined),
        "c" | "h" | "cpp" | "hpp" => Some(format!("{joined}.{ext}")),
        _ => Some(joined),
    }
}

fn normalize_join(base: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = if base.is_empty() { Vec::new() } else { base.split('/').collect() };
    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> IndexSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn go_resolves_sibling_package() {
        let modules = set(&["pkga", "pkgb"]);
        let contents = r#"import "example.com/c/pkgb""#;
        let resolved = resolve_file_imports("pkga/a.go", contents, &modules, Some("example.com/c"));
        assert_eq!(resolved, vec!["pkgb".to_string()]);
    }

    #[test]
    fn go_ignores_external_import() {
        let modules = set(&["pkga"]);
        let contents = r#"import "fmt""#;
        let resolved = resolve_file_imports("pkga/a.go", contents, &modules, Some("example.com/c"));
        assert!(resolved.is_empty());
    }

    #[test]
    fn go_block_import() {
        let modules = set(&["pkga", "pkgb", "pkgc"]);
        let contents = "import (\n\t\"fmt\"\n\t\"example.com/c/pkgb\"\n\t\"example.com/c/pkgc\"\n)";
        let resolved = resolve_file_imports("pkga/a.go", contents, &modules, Some("example.com/c"));
        assert_eq!(resolved, vec!["pkgb".to_string(), "pkgc".to_string()]);
    }

    #[test]
    fn python_longest_prefix_fallback() {
        let modules = set(&["pkg.sub", "pkg.other"]);
        let contents = "from pkg.sub.child import thing";
        let resolved = resolve_file_imports("pkg/other/x.py", contents, &modules, None);
        assert_eq!(resolved, vec!["pkg.sub".to_string()]);
    }

    #[test]
    fn js_relative_import_resolves() {
        let modules = set(&["pkg/sibling"]);
        let contents = "import { x } from '../sibling';";
        let resolved = resolve_file_imports("pkg/child/a.ts", contents, &modules, None);
        assert_eq!(resolved, vec!["pkg/sibling".to_string()]);
    }

    #[test]
    fn rust_use_crate_resolves_top_level_module() {
        let modules = set(&["foo", "crate"]);
        let contents = "use crate::foo::Bar;";
        let resolved = resolve_file_imports("src/lib.rs", contents, &modules, None);
        assert_eq!(resolved, vec!["foo".to_string()]);
    }
}
