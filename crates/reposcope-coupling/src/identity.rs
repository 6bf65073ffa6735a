//! Maps a repo-relative file path to a single module identity, per the
//! per-extension table.

use camino::Utf8Path;

/// Computes the module identity for `relative_path`, or `None` if the
/// extension isn't recognized.
pub fn module_identity(relative_path: &str) -> Option<String> {
    let path = Utf8Path::new(relative_path);
    let ext = path.extension()?;

    match ext {
        "go" => {
            let parent = path.parent().map(|p| p.as_str()).unwrap_or("");
            Some(if parent.is_empty() { ".".to_string() } else { parent.to_string() })
        }
        "js" | "jsx" | "ts" | "tsx" => Some(strip_extension(relative_path)),
        "py" => {
            let stripped = strip_extension(relative_path);
            Some(stripped.replace('/', "."))
        }
        "java" | "scala" => {
            let parent = path.parent().map(|p| p.as_str()).unwrap_or("");
            Some(parent.replace('/', "."))
        }
        "rs" => {
            let stem = path.file_stem().unwrap_or("");
            if stem == "main" || stem == "lib" {
                Some("crate".to_string())
            } else {
                Some(stem.to_string())
            }
        }
        "rb" | "php" | "swift" | "ex" => Some(strip_extension(relative_path)),
        "c" | "h" | "cpp" | "hpp" => Some(relative_path.to_string()),
        _ => None,
    }
}

fn strip_extension(relative_path: &str) -> String {
    Utf8Path::new(relative_path)
        .with_extension("")
        .as_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_identity_is_parent_dir() {
        assert_eq!(module_identity("pkga/a.go").as_deref(), Some("pkga"));
        assert_eq!(module_identity("main.go").as_deref(), Some("."));
    }

    #[test]
    fn rust_identity_is_crate_for_entrypoints() {
        assert_eq!(module_identity("src/main.rs").as_deref(), Some("crate"));
        assert_eq!(module_identity("src/lib.rs").as_deref(), Some("crate"));
        assert_eq!(module_identity("src/foo.rs").as_deref(), Some("foo"));
    }

    #[test]
    fn python_identity_is_dotted() {
        assert_eq!(module_identity("pkg/sub/mod.py").as_deref(), Some("pkg.sub.mod"));
    }

    #[test]
    fn java_identity_is_package_path() {
        assert_eq!(module_identity("com/example/app/Main.java").as_deref(), Some("com.example.app"));
    }

    #[test]
    fn unknown_extension_is_none() {
        assert_eq!(module_identity("README.md"), None);
    }
}
