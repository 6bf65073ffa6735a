//! Per-ecosystem manifest detection and parsing into a canonical
//! `(ecosystem, name, version)` list.

use std::collections::HashMap;

use camino::Utf8Path;
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;

/// A package ecosystem this crate knows how to check.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Ecosystem {
    Go,
    Npm,
    Cargo,
    Maven,
    NuGet,
    PyPI,
}

impl Ecosystem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Npm => "npm",
            Self::Cargo => "cargo",
            Self::Maven => "maven",
            Self::NuGet => "nuget",
            Self::PyPI => "pypi",
        }
    }
}

/// A single `(ecosystem, name, version)` dependency entry.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
    pub manifest_path: String,
}

/// A `replace` directive in a `go.mod` file.
pub struct GoReplace {
    pub module: String,
    pub target: String,
}

impl GoReplace {
    /// Whether the replacement target is a filesystem path rather than
    /// another module (the `local-replace` check).
    pub fn is_local(&self) -> bool {
        self.target.starts_with("./") || self.target.starts_with("../") || self.target.starts_with('/')
    }
}

/// Everything extracted from a single `go.mod`.
pub struct GoModule {
    pub dependencies: Vec<Dependency>,
    pub replaces: Vec<GoReplace>,
    pub retracted: Vec<String>,
}

/// Parses a `go.mod` file's `require`, `replace`, and `retract` blocks.
pub fn parse_go_mod(contents: &str, manifest_path: &str) -> GoModule {
    let mut dependencies = Vec::new();
    let mut replaces = Vec::new();
    let mut retracted = Vec::new();
    let mut block: Option<&str> = None;

    for raw_line in contents.lines() {
        let line = raw_line.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if let Some(kind) = block {
            if line == ")" {
                block = None;
                continue;
            }
            parse_directive_line(kind, line, manifest_path, &mut dependencies, &mut replaces, &mut retracted);
            continue;
        }

        if let Some(rest) = line.strip_prefix("require (") {
            if rest.trim() == ")" {
                continue;
            }
            block = Some("require");
        } else if line == "require (" {
            block = Some("require");
        } else if let Some(rest) = line.strip_prefix("replace (") {
            let _ = rest;
            block = Some("replace");
        } else if let Some(rest) = line.strip_prefix("retract (") {
            let _ = rest;
            block = Some("retract");
        } else if let Some(rest) = line.strip_prefix("require ") {
            parse_directive_line("require", rest, manifest_path, &mut dependencies, &mut replaces, &mut retracted);
        } else if let Some(rest) = line.strip_prefix("replace ") {
            parse_directive_line("replace", rest, manifest_path, &mut dependencies, &mut replaces, &mut retracted);
        } else if let Some(rest) = line.strip_prefix("retract ") {
            parse_directive_line("retract", rest, manifest_path, &mut dependencies, &mut replaces, &mut retracted);
        }
    }

    GoModule {
        dependencies,
        replaces,
        retracted,
    }
}

fn parse_directive_line(
    kind: &str,
    line: &str,
    manifest_path: &str,
    dependencies: &mut Vec<Dependency>,
    replaces: &mut Vec<GoReplace>,
    retracted: &mut Vec<String>,
) {
    match kind {
        "require" => {
            let mut parts = line.split_whitespace();
            if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
                dependencies.push(Dependency {
                    ecosystem: Ecosystem::Go,
                    name: module.to_string(),
                    version: version.to_string(),
                    manifest_path: manifest_path.to_string(),
                });
            }
        }
        "replace" => {
            if let Some((left, right)) = line.split_once("=>") {
                let module = left.split_whitespace().next().unwrap_or("").to_string();
                let target = right.trim().split_whitespace().next().unwrap_or("").to_string();
                if !module.is_empty() && !target.is_empty() {
                    replaces.push(GoReplace { module, target });
                }
            }
        }
        "retract" => {
            let version = line.trim_start_matches('[').trim_end_matches(']').trim();
            if !version.is_empty() {
                retracted.push(version.to_string());
            }
        }
        _ => {}
    }
}

/// Strips common semver-range prefixes (`^`, `~`, `>=`, ...) from an npm
/// `package.json` version specifier.
fn strip_range_prefix(version: &str) -> String {
    version.trim_start_matches(['^', '~', '>', '<', '=', ' ']).to_string()
}

/// Parses `package.json`'s `dependencies`/`devDependencies` tables.
pub fn parse_package_json(contents: &str, manifest_path: &str) -> anyhow::Result<Vec<Dependency>> {
    let doc: serde_json::Value = serde_json::from_str(contents)?;
    let mut deps = Vec::new();
    for field in ["dependencies", "devDependencies"] {
        let Some(table) = doc.get(field).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, version) in table {
            let Some(version) = version.as_str() else { continue };
            deps.push(Dependency {
                ecosystem: Ecosystem::Npm,
                name: name.clone(),
                version: strip_range_prefix(version),
                manifest_path: manifest_path.to_string(),
            });
        }
    }
    Ok(deps)
}

/// Parses a `Cargo.toml`'s `[dependencies]` table (version-specified
/// entries only; path/git dependencies have no registry to check).
pub fn parse_cargo_toml(contents: &str, manifest_path: &str) -> anyhow::Result<Vec<Dependency>> {
    let doc: toml::Value = contents.parse()?;
    let mut deps = Vec::new();
    let Some(table) = doc.get("dependencies").and_then(|v| v.as_table()) else {
        return Ok(deps);
    };
    for (name, spec) in table {
        let version = match spec {
            toml::Value::String(v) => Some(v.clone()),
            toml::Value::Table(t) => t.get("version").and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        };
        if let Some(version) = version {
            deps.push(Dependency {
                ecosystem: Ecosystem::Cargo,
                name: name.clone(),
                version,
                manifest_path: manifest_path.to_string(),
            });
        }
    }
    Ok(deps)
}

/// Parses a `requirements.txt`'s `name==version` pins, ignoring
/// unpinned/range/editable entries (no single version to check).
pub fn parse_requirements_txt(contents: &str, manifest_path: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for line in contents.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        let Some((name, version)) = line.split_once("==") else {
            continue;
        };
        deps.push(Dependency {
            ecosystem: Ecosystem::PyPI,
            name: name.trim().to_string(),
            version: version.trim().to_string(),
            manifest_path: manifest_path.to_string(),
        });
    }
    deps
}

/// Parses `pyproject.toml`'s Poetry or PEP 621 dependency tables.
pub fn parse_pyproject_toml(contents: &str, manifest_path: &str) -> anyhow::Result<Vec<Dependency>> {
    let doc: toml::Value = contents.parse()?;
    let mut deps = Vec::new();

    if let Some(table) = doc
        .get("tool")
        .and_then(|v| v.get("poetry"))
        .and_then(|v| v.get("dependencies"))
        .and_then(|v| v.as_table())
    {
        for (name, spec) in table {
            if name == "python" {
                continue;
            }
            let version = match spec {
                toml::Value::String(v) => Some(v.trim_start_matches('^').trim_start_matches('~').to_string()),
                toml::Value::Table(t) => t.get("version").and_then(|v| v.as_str()).map(str::to_string),
                _ => None,
            };
            if let Some(version) = version {
                deps.push(Dependency {
                    ecosystem: Ecosystem::PyPI,
                    name: name.clone(),
                    version,
                    manifest_path: manifest_path.to_string(),
                });
            }
        }
    }

    if let Some(list) = doc.get("project").and_then(|v| v.get("dependencies")).and_then(|v| v.as_array()) {
        for entry in list {
            let Some(spec) = entry.as_str() else { continue };
            if let Some((name, version)) = spec.split_once("==") {
                deps.push(Dependency {
                    ecosystem: Ecosystem::PyPI,
                    name: name.trim().to_string(),
                    version: version.trim().to_string(),
                    manifest_path: manifest_path.to_string(),
                });
            }
        }
    }

    Ok(deps)
}

/// Parses a Maven `pom.xml`: `<properties>`, the project's own
/// groupId/artifactId/version, and `<dependencies>`, resolving
/// `${…}` references via a single-pass substitution against the
/// properties map plus the built-in `project.version/groupId/artifactId`.
pub fn parse_pom_xml(contents: &str, manifest_path: &str) -> anyhow::Result<Vec<Dependency>> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut properties: HashMap<String, String> = HashMap::new();
    let mut project_group_id = String::new();
    let mut project_artifact_id = String::new();
    let mut project_version = String::new();

    let mut deps_raw: Vec<(String, String, String)> = Vec::new();

    let mut path: Vec<String> = Vec::new();
    let mut current_dep: Option<(String, String, String)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).to_string();
                if name == "dependency" && path.last().map(String::as_str) == Some("dependencies") {
                    current_dep = Some((String::new(), String::new(), String::new()));
                }
                path.push(name);
            }
            Event::End(_) => {
                let name = path.pop();
                if name.as_deref() == Some("dependency")
                    && let Some((group, artifact, version)) = current_dep.take()
                {
                    deps_raw.push((group, artifact, version));
                }
            }
            Event::Text(text) => {
                let value = text.unescape()?.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                let in_dependency = path.last().map(String::as_str) == Some("dependency");
                let depth_tag = path.last().cloned().unwrap_or_default();

                if in_dependency {
                    if let Some(dep) = current_dep.as_mut() {
                        match depth_tag.as_str() {
                            "groupId" => dep.0 = value,
                            "artifactId" => dep.1 = value,
                            "version" => dep.2 = value,
                            _ => {}
                        }
                    }
                } else if path.len() == 2 && path[0] == "project" {
                    match depth_tag.as_str() {
                        "groupId" => project_group_id = value,
                        "artifactId" => project_artifact_id = value,
                        "version" => project_version = value,
                        _ => {}
                    }
                } else if path.len() == 3 && path[0] == "project" && path[1] == "properties" {
                    properties.insert(depth_tag, value);
                }
            }
            _ => {}
        }
        buf.clear();
    }

    let builtins: HashMap<&str, &str> = HashMap::from([
        ("project.version", project_version.as_str()),
        ("project.groupId", project_group_id.as_str()),
        ("project.artifactId", project_artifact_id.as_str()),
    ]);

    let interpolate = |raw: &str| -> String {
        let mut result = raw.to_string();
        if let (Some(start), Some(end)) = (raw.find("${"), raw.find('}')) {
            if end > start {
                let key = &raw[start + 2..end];
                let resolved = builtins.get(key).copied().or_else(|| properties.get(key).map(String::as_str));
                if let Some(resolved) = resolved {
                    result = format!("{}{}{}", &raw[..start], resolved, &raw[end + 1..]);
                }
            }
        }
        result
    };

    let mut deps = Vec::new();
    for (group, artifact, version) in deps_raw {
        if artifact.is_empty() || version.is_empty() {
            continue;
        }
        let name = format!("{group}:{artifact}");
        let version = interpolate(&version);
        deps.push(Dependency {
            ecosystem: Ecosystem::Maven,
            name,
            version,
            manifest_path: manifest_path.to_string(),
        });
    }

    Ok(deps)
}

/// Parses a `.csproj`'s `<PackageReference Include="..." Version="..." />`
/// entries.
pub fn parse_csproj(contents: &str, manifest_path: &str) -> anyhow::Result<Vec<Dependency>> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);
    let mut deps = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(tag) | Event::Empty(tag) => {
                if tag.name().as_ref() != b"PackageReference" {
                    continue;
                }
                let mut name = None;
                let mut version = None;
                for attr in tag.attributes().flatten() {
                    let key = attr.key.as_ref();
                    let value = attr.unescape_value()?.to_string();
                    if key == b"Include" {
                        name = Some(value);
                    } else if key == b"Version" {
                        version = Some(value);
                    }
                }
                if let (Some(name), Some(version)) = (name, version) {
                    deps.push(Dependency {
                        ecosystem: Ecosystem::NuGet,
                        name,
                        version,
                        manifest_path: manifest_path.to_string(),
                    });
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(deps)
}

/// The outcome of scanning the repository root for manifests: the
/// canonical dependency list plus the Go-specific `replace`/`retract`
/// directives, since those don't fit the flat `(ecosystem, name, version)`
/// shape.
#[derive(Default)]
pub struct ManifestScan {
    pub dependencies: Vec<Dependency>,
    pub go_replaces: Vec<GoReplace>,
    pub go_retracted: Vec<String>,
}

/// Detects and parses every known manifest file present at the repository
/// root. `read` is injected so tests can fake the filesystem.
pub fn scan_manifests(repo_root: &Utf8Path, read: impl Fn(&Utf8Path) -> std::io::Result<String>) -> anyhow::Result<ManifestScan> {
    let mut scan = ManifestScan::default();

    if let Ok(contents) = read(&repo_root.join("go.mod")) {
        let parsed = parse_go_mod(&contents, "go.mod");
        scan.dependencies.extend(parsed.dependencies);
        scan.go_replaces = parsed.replaces;
        scan.go_retracted = parsed.retracted;
    }
    if let Ok(contents) = read(&repo_root.join("package.json")) {
        scan.dependencies.extend(parse_package_json(&contents, "package.json")?);
    }
    if let Ok(contents) = read(&repo_root.join("Cargo.toml")) {
        scan.dependencies.extend(parse_cargo_toml(&contents, "Cargo.toml")?);
    }
    if let Ok(contents) = read(&repo_root.join("pom.xml")) {
        scan.dependencies.extend(parse_pom_xml(&contents, "pom.xml")?);
    }
    if let Ok(contents) = read(&repo_root.join("requirements.txt")) {
        scan.dependencies.extend(parse_requirements_txt(&contents, "requirements.txt"));
    }
    if let Ok(contents) = read(&repo_root.join("pyproject.toml")) {
        scan.dependencies.extend(parse_pyproject_toml(&contents, "pyproject.toml")?);
    }
    for entry in std::fs::read_dir(repo_root.as_std_path()).into_iter().flatten().flatten() {
        let Ok(path) = Utf8Path::from_path(&entry.path()).map(|p| p.to_owned()) else {
            continue;
        };
        if path.extension() == Some("csproj")
            && let Ok(contents) = read(&path)
        {
            let relative = path.file_name().unwrap_or_default();
            scan.dependencies.extend(parse_csproj(&contents, relative)?);
        }
    }

    Ok(scan)
}

/// Groups dependencies by ecosystem, preserving first-seen order.
pub fn group_by_ecosystem(deps: &[Dependency]) -> IndexMap<Ecosystem, Vec<&Dependency>> {
    let mut grouped: IndexMap<Ecosystem, Vec<&Dependency>> = IndexMap::new();
    for dep in deps {
        grouped.entry(dep.ecosystem).or_default().push(dep);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_go_mod_require_block() {
        let contents = "module example.com/foo\n\ngo 1.22\n\nrequire (\n\tgithub.com/a/b v1.2.3\n\tgithub.com/c/d v0.1.0\n)\n\nreplace github.com/a/b => ../local-b\n\nretract v0.9.0\n";
        let parsed = parse_go_mod(contents, "go.mod");
        assert_eq!(parsed.dependencies.len(), 2);
        assert_eq!(parsed.dependencies[0].name, "github.com/a/b");
        assert_eq!(parsed.dependencies[0].version, "v1.2.3");
        assert_eq!(parsed.replaces.len(), 1);
        assert!(parsed.replaces[0].is_local());
        assert_eq!(parsed.retracted, vec!["v0.9.0".to_string()]);
    }

    #[test]
    fn parses_package_json_deps() {
        let contents = r#"{"dependencies":{"left-pad":"^1.3.0"},"devDependencies":{"jest":"~29.0.0"}}"#;
        let deps = parse_package_json(contents, "package.json").unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "left-pad" && d.version == "1.3.0"));
        assert!(deps.iter().any(|d| d.name == "jest" && d.version == "29.0.0"));
    }

    #[test]
    fn parses_cargo_toml_deps() {
        let contents = "[dependencies]\nserde = \"1.0\"\ntokio = { version = \"1.40\", features = [\"full\"] }\nlocal = { path = \"../local\" }\n";
        let deps = parse_cargo_toml(contents, "Cargo.toml").unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "serde" && d.version == "1.0"));
        assert!(deps.iter().any(|d| d.name == "tokio" && d.version == "1.40"));
    }

    #[test]
    fn parses_requirements_pins_only() {
        let contents = "requests==2.31.0\nflask>=2.0\n# comment\n-e git+https://example.com\n";
        let deps = parse_requirements_txt(contents, "requirements.txt");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "requests");
        assert_eq!(deps[0].version, "2.31.0");
    }

    #[test]
    fn interpolates_maven_properties() {
        let contents = r#"<project>
  <groupId>com.example</groupId>
  <artifactId>demo</artifactId>
  <version>1.0.0</version>
  <properties>
    <guava.version>32.1.0-jre</guava.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>com.google.guava</groupId>
      <artifactId>guava</artifactId>
      <version>${guava.version}</version>
    </dependency>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>sibling</artifactId>
      <version>${project.version}</version>
    </dependency>
  </dependencies>
</project>"#;
        let deps = parse_pom_xml(contents, "pom.xml").unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "com.google.guava:guava");
        assert_eq!(deps[0].version, "32.1.0-jre");
        assert_eq!(deps[1].version, "1.0.0");
    }

    #[test]
    fn parses_csproj_package_references() {
        let contents = r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.1" />
  </ItemGroup>
</Project>"#;
        let deps = parse_csproj(contents, "demo.csproj").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "Newtonsoft.Json");
        assert_eq!(deps[0].version, "13.0.1");
    }
}
