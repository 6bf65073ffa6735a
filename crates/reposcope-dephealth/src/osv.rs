//! The OSV batch-query + per-vulnerability detail workflow, and
//! CVSS-derived confidence scoring.

use std::collections::HashMap;

use async_trait::async_trait;
use camino::Utf8Path;
use reposcope_core::http::build_client;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use crate::clients::ClientError;
use crate::manifest::Ecosystem;

const OSV_API_BASE: &str = "https://api.osv.dev/v1";

/// Maps this crate's [`Ecosystem`] to OSV's own ecosystem identifiers.
pub fn osv_ecosystem_name(ecosystem: Ecosystem) -> &'static str {
    match ecosystem {
        Ecosystem::Go => "Go",
        Ecosystem::Npm => "npm",
        Ecosystem::Cargo => "crates.io",
        Ecosystem::Maven => "Maven",
        Ecosystem::NuGet => "NuGet",
        Ecosystem::PyPI => "PyPI",
    }
}

#[derive(Debug, Clone, Serialize)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Debug, Clone, Serialize)]
struct OsvQuery {
    package: OsvPackage,
    version: String,
}

#[derive(Debug, Clone, Serialize)]
struct OsvBatchRequest {
    queries: Vec<OsvQuery>,
}

#[derive(Debug, Clone, Deserialize)]
struct OsvBatchResponse {
    results: Vec<OsvBatchResult>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct OsvBatchResult {
    #[serde(default)]
    vulns: Vec<OsvVulnId>,
}

#[derive(Debug, Clone, Deserialize)]
struct OsvVulnId {
    id: String,
}

/// A full OSV vulnerability record, the subset this workspace needs.
#[derive(Debug, Clone, Deserialize)]
pub struct OsvVulnerability {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub severity: Vec<OsvSeverity>,
    #[serde(default)]
    pub affected: Vec<OsvAffected>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsvSeverity {
    #[serde(rename = "type")]
    pub kind: String,
    pub score: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OsvAffected {
    #[serde(default)]
    pub ranges: Vec<OsvRange>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OsvRange {
    #[serde(default)]
    pub events: Vec<OsvEvent>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OsvEvent {
    #[serde(default)]
    pub fixed: Option<String>,
}

impl OsvVulnerability {
    /// The CVSS v3 vector string among this record's severities, if any.
    pub fn cvss_vector(&self) -> Option<&str> {
        self.severity
            .iter()
            .find(|s| s.kind.starts_with("CVSS_V3"))
            .map(|s| s.score.as_str())
    }

    /// The first CVE alias, if this record carries one.
    pub fn cve_alias(&self) -> Option<&str> {
        self.aliases.iter().find(|a| a.starts_with("CVE-")).map(String::as_str)
    }

    /// The id a human-facing title should reference: the first CVE alias,
    /// falling back to the raw OSV id when none exists.
    pub fn display_id(&self) -> &str {
        self.cve_alias().unwrap_or(&self.id)
    }

    /// The first `fixed` version named in any affected range, if any.
    pub fn fixed_version(&self) -> Option<&str> {
        self.affected
            .iter()
            .flat_map(|a| a.ranges.iter())
            .flat_map(|r| r.events.iter())
            .find_map(|e| e.fixed.as_deref())
    }

    /// "Upgrade to v1.0.1." or "No fix available."
    pub fn upgrade_advice(&self) -> String {
        match self.fixed_version() {
            Some(version) => format!("Upgrade to {version}."),
            None => "No fix available.".to_string(),
        }
    }
}

/// A query target: one `(ecosystem, name, version)` dependency.
pub struct OsvTarget {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
}

#[async_trait]
pub trait OsvClient: Send + Sync {
    /// Batches `targets` into a single `querybatch` call, returning, for
    /// each target's index, the vulnerability IDs OSV reports against it.
    async fn query_batch(&self, targets: &[OsvTarget]) -> Result<Vec<Vec<String>>, ClientError>;

    /// Fetches the full record for a single vulnerability ID.
    async fn vulnerability(&self, id: &str) -> Result<OsvVulnerability, ClientError>;
}

pub struct HttpOsvClient {
    client: ClientWithMiddleware,
}

impl HttpOsvClient {
    pub fn new(cache_dir: &Utf8Path) -> Self {
        Self {
            client: build_client("api.osv.dev", cache_dir, 3, Default::default()),
        }
    }
}

#[async_trait]
impl OsvClient for HttpOsvClient {
    async fn query_batch(&self, targets: &[OsvTarget]) -> Result<Vec<Vec<String>>, ClientError> {
        let request = OsvBatchRequest {
            queries: targets
                .iter()
                .map(|t| OsvQuery {
                    package: OsvPackage {
                        name: t.name.clone(),
                        ecosystem: osv_ecosystem_name(t.ecosystem).to_string(),
                    },
                    version: t.version.clone(),
                })
                .collect(),
        };

        let url = format!("{OSV_API_BASE}/querybatch");
        let resp = self.client.post(&url).json(&request).send().await?.error_for_status()?;
        let body: OsvBatchResponse = resp.json().await?;
        Ok(body.results.into_iter().map(|r| r.vulns.into_iter().map(|v| v.id).collect()).collect())
    }

    async fn vulnerability(&self, id: &str) -> Result<OsvVulnerability, ClientError> {
        let url = format!("{OSV_API_BASE}/vulns/{id}");
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        Ok(resp.error_for_status()?.json().await?)
    }
}

/// Confidence for a `vulnerable-dependency` signal, derived from a CVSS
/// v3 vector string: any of `C:H`/`I:H`/`A:H` -> high (0.95); any
/// `C:L`/`I:L`/`A:L` -> medium (0.80); all `N` -> low (0.60); absent
/// severity -> default 0.80.
pub fn cvss_confidence(vector: Option<&str>) -> f64 {
    let Some(vector) = vector else {
        return 0.80;
    };

    let mut values: HashMap<&str, &str> = HashMap::new();
    for part in vector.split('/') {
        if let Some((key, value)) = part.split_once(':') {
            values.insert(key, value);
        }
    }

    let impact_metrics = ["C", "I", "A"];
    if impact_metrics.iter().any(|k| values.get(k) == Some(&"H")) {
        return 0.95;
    }
    if impact_metrics.iter().any(|k| values.get(k) == Some(&"L")) {
        return 0.80;
    }
    if impact_metrics.iter().all(|k| values.get(k) == Some(&"N")) {
        return 0.60;
    }
    0.80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_impact_vector_scores_high() {
        let vector = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H";
        assert_eq!(cvss_confidence(Some(vector)), 0.95);
    }

    #[test]
    fn low_impact_vector_scores_medium() {
        let vector = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:L/I:L/A:N";
        assert_eq!(cvss_confidence(Some(vector)), 0.80);
    }

    #[test]
    fn all_none_vector_scores_low() {
        let vector = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:N/A:N";
        assert_eq!(cvss_confidence(Some(vector)), 0.60);
    }

    #[test]
    fn absent_severity_defaults_to_medium_high() {
        assert_eq!(cvss_confidence(None), 0.80);
    }

    #[test]
    fn osv_ecosystem_names_match_osv_vocabulary() {
        assert_eq!(osv_ecosystem_name(Ecosystem::Cargo), "crates.io");
        assert_eq!(osv_ecosystem_name(Ecosystem::PyPI), "PyPI");
    }

    #[test]
    fn display_id_prefers_cve_alias() {
        let vuln = OsvVulnerability {
            id: "GHSA-xxxx-yyyy-zzzz".to_string(),
            summary: None,
            aliases: vec!["CVE-2024-12345".to_string()],
            severity: Vec::new(),
            affected: Vec::new(),
        };
        assert_eq!(vuln.display_id(), "CVE-2024-12345");
    }

    #[test]
    fn display_id_falls_back_to_osv_id_without_cve_alias() {
        let vuln = OsvVulnerability {
            id: "GHSA-xxxx-yyyy-zzzz".to_string(),
            summary: None,
            aliases: Vec::new(),
            severity: Vec::new(),
            affected: Vec::new(),
        };
        assert_eq!(vuln.display_id(), "GHSA-xxxx-yyyy-zzzz");
    }

    #[test]
    fn upgrade_advice_names_fixed_version() {
        let vuln = OsvVulnerability {
            id: "OSV-1".to_string(),
            summary: None,
            aliases: Vec::new(),
            severity: Vec::new(),
            affected: vec![OsvAffected {
                ranges: vec![OsvRange {
                    events: vec![OsvEvent { fixed: Some("v1.0.1".to_string()) }],
                }],
            }],
        };
        assert_eq!(vuln.upgrade_advice(), "Upgrade to v1.0.1.");
    }

    #[test]
    fn upgrade_advice_without_fix_says_so() {
        let vuln = OsvVulnerability {
            id: "OSV-1".to_string(),
            summary: None,
            aliases: Vec::new(),
            severity: Vec::new(),
            affected: Vec::new(),
        };
        assert_eq!(vuln.upgrade_advice(), "No fix available.");
    }
}
