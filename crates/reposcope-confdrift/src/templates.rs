//! Env-template discovery and parsing.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Suffixes that mark a file as an env template.
const TEMPLATE_SUFFIXES: &[&str] = &[".env.example", ".env.template", ".env.sample"];

/// A single declared `KEY=value` entry within a template file.
pub struct DeclaredKey {
    pub key: String,
    pub value: String,
}

/// A discovered env-template file and its declared keys, in file order.
pub struct EnvTemplate {
    pub path: Utf8PathBuf,
    pub entries: Vec<DeclaredKey>,
}

/// Whether `relative_path`'s file name matches a known template suffix.
pub fn is_template_path(relative_path: &str) -> bool {
    let name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    TEMPLATE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) || name == ".env.example" || name == ".env.sample"
}

/// Parses `.env`-style `KEY=value` lines, skipping blanks, comments, and
/// lines without an `=`.
pub fn parse_env_file(contents: &str) -> Vec<DeclaredKey> {
    let mut entries = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        entries.push(DeclaredKey {
            key: key.to_string(),
            value: value.trim().to_string(),
        });
    }
    entries
}

/// Loads every env template under `repo_root`, reading each via `read`.
pub fn discover_templates(
    candidates: &[Utf8PathBuf],
    repo_root: &Utf8Path,
    read: impl Fn(&Utf8Path) -> std::io::Result<String>,
) -> Vec<EnvTemplate> {
    let mut templates = Vec::new();
    for relative in candidates {
        if !is_template_path(relative.as_str()) {
            continue;
        }
        let absolute = repo_root.join(relative);
        let Ok(contents) = read(&absolute) else {
            continue;
        };
        templates.push(EnvTemplate {
            path: relative.clone(),
            entries: parse_env_file(&contents),
        });
    }
    templates
}

/// The union of keys declared across all templates, each mapped to the
/// (template path, value) pairs that declare it — used both for
/// dead-config-key detection and inconsistent-defaults comparison.
pub fn declared_key_index(templates: &[EnvTemplate]) -> IndexMap<String, Vec<(Utf8PathBuf, String)>> {
    let mut index: IndexMap<String, Vec<(Utf8PathBuf, String)>> = IndexMap::new();
    for template in templates {
        for entry in &template.entries {
            index
                .entry(entry.key.clone())
                .or_default()
                .push((template.path.clone(), entry.value.clone()));
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_template_suffixes() {
        assert!(is_template_path(".env.example"));
        assert!(is_template_path("config/.env.sample"));
        assert!(is_template_path(".env.template"));
        assert!(!is_template_path(".env"));
        assert!(!is_template_path("env.go"));
    }

    #[test]
    fn parses_simple_env_file() {
        let contents = "# comment\nAPI_KEY=changeme\nexport PORT=8080\n\nMALFORMED LINE\n";
        let entries = parse_env_file(contents);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "API_KEY");
        assert_eq!(entries[0].value, "changeme");
        assert_eq!(entries[1].key, "PORT");
        assert_eq!(entries[1].value, "8080");
    }
}
