//! Per-extension extraction of env-var keys referenced at runtime.

use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;

/// System/platform keys that never count as drift even when undeclared.
const WELL_KNOWN_KEYS: &[&str] = &["PATH", "HOME", "USER", "SHELL", "PWD", "LANG", "TERM", "TMPDIR", "TZ"];

/// Whether `key` should be excluded from `env-var-drift` regardless of
/// template declarations (well-known system keys like `PATH`, `HOME`,
/// `GITHUB_*`).
pub fn is_well_known(key: &str) -> bool {
    WELL_KNOWN_KEYS.contains(&key) || key.starts_with("GITHUB_") || key.starts_with("CI_") || key.starts_with("RUNNER_")
}

static GO_GETENV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"os\.(?:Getenv|LookupEnv)\(\s*"([A-Za-z_][A-Za-z0-9_]*)"\s*\)"#).unwrap());
static JS_PROCESS_ENV_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"process\.env\.([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static JS_PROCESS_ENV_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"process\.env\[\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]\s*\]"#).unwrap());
static PY_OS_ENVIRON_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"os\.environ(?:\.get)?\[\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]\s*\]"#).unwrap());
static PY_OS_ENVIRON_GET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"os\.environ\.get\(\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]"#).unwrap());
static PY_OS_GETENV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"os\.getenv\(\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]"#).unwrap());
static RUBY_ENV_INDEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"ENV\[\s*['"]([A-Za-z_][A-Za-z0-9_]*)['"]\s*\]"#).unwrap());
static JAVA_SYSTEM_GETENV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"System\.getenv\(\s*"([A-Za-z_][A-Za-z0-9_]*)"\s*\)"#).unwrap());
static DOTNET_GETENV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Environment\.GetEnvironmentVariable\(\s*"([A-Za-z_][A-Za-z0-9_]*)"\s*\)"#).unwrap());

/// Extracts every literal env-var key referenced in `contents`, based on
/// `path`'s extension. Unknown extensions yield no references.
pub fn extract_references(path: &Utf8Path, contents: &str) -> Vec<String> {
    let patterns: &[&LazyLock<Regex>] = match path.extension() {
        Some("go") => &[&GO_GETENV],
        Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs") => &[&JS_PROCESS_ENV_DOT, &JS_PROCESS_ENV_INDEX],
        Some("py") => &[&PY_OS_ENVIRON_INDEX, &PY_OS_ENVIRON_GET, &PY_OS_GETENV],
        Some("rb") => &[&RUBY_ENV_INDEX],
        Some("java" | "kt") => &[&JAVA_SYSTEM_GETENV],
        Some("cs") => &[&DOTNET_GETENV],
        _ => return Vec::new(),
    };

    let mut keys = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(contents) {
            keys.push(caps[1].to_string());
        }
    }
    keys
}

/// Whether `key`'s literal string appears anywhere in `contents`, used by
/// dead-config-key detection (a looser check than [`extract_references`]
/// since templates may be consumed via config libraries this module
/// doesn't pattern-match).
pub fn contains_literal_key(contents: &str, key: &str) -> bool {
    contents.contains(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    #[test]
    fn extracts_go_getenv() {
        let src = r#"v := os.Getenv("DATABASE_URL")"#;
        assert_eq!(extract_references(Utf8Path::new("main.go"), src), vec!["DATABASE_URL"]);
    }

    #[test]
    fn extracts_js_process_env_both_forms() {
        let src = r#"const a = process.env.API_KEY; const b = process.env['PORT'];"#;
        let keys = extract_references(Utf8Path::new("index.js"), src);
        assert_eq!(keys, vec!["API_KEY", "PORT"]);
    }

    #[test]
    fn extracts_python_forms() {
        let src = "db = os.environ['DB_HOST']\ntoken = os.environ.get('TOKEN')\nport = os.getenv('PORT')\n";
        let keys = extract_references(Utf8Path::new("app.py"), src);
        assert!(keys.contains(&"DB_HOST".to_string()));
        assert!(keys.contains(&"TOKEN".to_string()));
        assert!(keys.contains(&"PORT".to_string()));
    }

    #[test]
    fn unknown_extension_yields_nothing() {
        assert!(extract_references(Utf8Path::new("README.md"), "os.Getenv(\"X\")").is_empty());
    }

    #[test]
    fn well_known_keys_are_excluded() {
        assert!(is_well_known("PATH"));
        assert!(is_well_known("GITHUB_TOKEN"));
        assert!(!is_well_known("DATABASE_URL"));
    }
}
