//! The seven registry clients: one small single-method trait per
//! ecosystem's external service, each backed by the same shared
//! cache-and-retry HTTP client, following `reposcope-core::github::Client`'s
//! own construction.
//!
//! Production code only ever constructs the `Http*` implementations; tests
//! supply fakes implementing the same traits, per the single-method
//! interface design this workspace uses throughout for external services.

use async_trait::async_trait;
use camino::Utf8Path;
use reposcope_core::http::build_client;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("response error: {0}")]
    Response(#[from] reqwest::Error),
    #[error("not found")]
    NotFound,
}

/// The Go module proxy's `@latest` response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoModuleLatest {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Deprecated", default)]
    pub deprecated: Option<String>,
}

#[async_trait]
pub trait GoProxyClient: Send + Sync {
    /// Fetches `@latest` for the given Go module path (e.g.
    /// `github.com/a/b`), surfacing its `Deprecated` field if present.
    async fn latest(&self, module_path: &str) -> Result<GoModuleLatest, ClientError>;
}

pub struct HttpGoProxyClient {
    client: ClientWithMiddleware,
}

impl HttpGoProxyClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("proxy.golang.org", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl GoProxyClient for HttpGoProxyClient {
    async fn latest(&self, module_path: &str) -> Result<GoModuleLatest, ClientError> {
        let escaped = escape_go_module_path(module_path);
        let url = format!("https://proxy.golang.org/{escaped}/@latest");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        Ok(resp.error_for_status()?.json().await?)
    }
}

/// Go module proxy paths escape uppercase letters as `!lowercase`.
fn escape_go_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[derive(Debug, Clone, Deserialize)]
pub struct CratesIoVersion {
    pub num: String,
    pub yanked: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct CratesIoResponse {
    versions: Vec<CratesIoVersion>,
}

#[async_trait]
pub trait CratesIoClient: Send + Sync {
    /// Fetches every published version of `name`, with each version's
    /// `yanked` flag.
    async fn versions(&self, name: &str) -> Result<Vec<CratesIoVersion>, ClientError>;
}

pub struct HttpCratesIoClient {
    client: ClientWithMiddleware,
}

impl HttpCratesIoClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("crates.io", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl CratesIoClient for HttpCratesIoClient {
    async fn versions(&self, name: &str) -> Result<Vec<CratesIoVersion>, ClientError> {
        let url = format!("https://crates.io/api/v1/crates/{name}");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        Ok(resp.error_for_status()?.json::<CratesIoResponse>().await?.versions)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NpmVersionInfo {
    #[serde(default)]
    pub deprecated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct NpmPackageResponse {
    #[serde(default)]
    versions: std::collections::HashMap<String, NpmVersionInfo>,
}

#[async_trait]
pub trait NpmClient: Send + Sync {
    /// Fetches `name`'s registry document and returns the `deprecated`
    /// string for `version`, if the registry sets one.
    async fn deprecation(&self, name: &str, version: &str) -> Result<Option<String>, ClientError>;
}

pub struct HttpNpmClient {
    client: ClientWithMiddleware,
}

impl HttpNpmClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("registry.npmjs.org", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl NpmClient for HttpNpmClient {
    async fn deprecation(&self, name: &str, version: &str) -> Result<Option<String>, ClientError> {
        let url = format!("https://registry.npmjs.org/{name}");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        let doc: NpmPackageResponse = resp.error_for_status()?.json().await?;
        Ok(doc.versions.get(version).and_then(|v| v.deprecated.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MavenSearchResponse {
    response: MavenSearchBody,
}

#[derive(Debug, Clone, Deserialize)]
struct MavenSearchBody {
    docs: Vec<MavenDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MavenDoc {
    pub timestamp: i64,
}

#[async_trait]
pub trait MavenClient: Send + Sync {
    /// Looks up `group:artifact:version` on Maven Central, returning its
    /// publish timestamp (epoch milliseconds) if found.
    async fn artifact_timestamp(&self, group: &str, artifact: &str, version: &str) -> Result<Option<i64>, ClientError>;
}

pub struct HttpMavenClient {
    client: ClientWithMiddleware,
}

impl HttpMavenClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("search.maven.org", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl MavenClient for HttpMavenClient {
    async fn artifact_timestamp(&self, group: &str, artifact: &str, version: &str) -> Result<Option<i64>, ClientError> {
        let url = format!("https://search.maven.org/solrsearch/select?q=g:{group}+AND+a:{artifact}+AND+v:{version}&rows=1&wt=json");
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let doc: MavenSearchResponse = resp.json().await?;
        Ok(doc.response.docs.first().map(|d| d.timestamp))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct NuGetCatalogEntry {
    #[serde(default)]
    version: String,
    #[serde(default)]
    deprecation: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct NuGetLeaf {
    #[serde(default, rename = "catalogEntry")]
    catalog_entry: NuGetCatalogEntry,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct NuGetPage {
    #[serde(default)]
    items: Vec<NuGetLeaf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct NuGetRegistration {
    #[serde(default)]
    items: Vec<NuGetPage>,
}

#[async_trait]
pub trait NuGetClient: Send + Sync {
    /// Whether the catalog entry for `id` at `version` carries a
    /// `deprecation` object.
    async fn is_deprecated(&self, id: &str, version: &str) -> Result<bool, ClientError>;
}

pub struct HttpNuGetClient {
    client: ClientWithMiddleware,
}

impl HttpNuGetClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("api.nuget.org", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl NuGetClient for HttpNuGetClient {
    async fn is_deprecated(&self, id: &str, version: &str) -> Result<bool, ClientError> {
        let lower = id.to_lowercase();
        let url = format!("https://api.nuget.org/v3/registration5-semver1/{lower}/index.json");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        let doc: NuGetRegistration = resp.error_for_status()?.json().await?;
        Ok(doc
            .items
            .iter()
            .flat_map(|page| &page.items)
            .find(|leaf| leaf.catalog_entry.version == version)
            .is_some_and(|leaf| leaf.catalog_entry.deprecation.is_some()))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PyPiResponse {
    info: PyPiInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct PyPiInfo {
    #[serde(default)]
    classifiers: Vec<String>,
}

#[async_trait]
pub trait PyPiClient: Send + Sync {
    /// Whether `name`'s classifiers include `Development Status :: 7 - Inactive`.
    async fn is_inactive(&self, name: &str) -> Result<bool, ClientError>;
}

pub struct HttpPyPiClient {
    client: ClientWithMiddleware,
}

impl HttpPyPiClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("pypi.org", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl PyPiClient for HttpPyPiClient {
    async fn is_inactive(&self, name: &str) -> Result<bool, ClientError> {
        let url = format!("https://pypi.org/pypi/{name}/json");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        let doc: PyPiResponse = resp.error_for_status()?.json().await?;
        Ok(doc.info.classifiers.iter().any(|c| c == "Development Status :: 7 - Inactive"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_uppercase_module_segments() {
        assert_eq!(escape_go_module_path("github.com/BurntSushi/toml"), "github.com/!burnt!sushi/toml");
    }
}
