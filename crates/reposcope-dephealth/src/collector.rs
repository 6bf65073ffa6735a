//! The dependency-health collector: manifest detection, per-ecosystem
//! registry checks, and OSV vulnerability scanning wired into a
//! [`Collector`].

use std::fs;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use reposcope_core::RawSignal;
use reposcope_core::duration::days_old;
use reposcope_core::github::{Client as GitHubClient, GitHubHost, token_from_env};
use reposcope_core::http::TargetCap;
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::clients::{
    CratesIoClient, GoProxyClient, HttpCratesIoClient, HttpGoProxyClient, HttpMavenClient, HttpNpmClient, HttpNuGetClient,
    HttpPyPiClient, MavenClient, NpmClient, NuGetClient, PyPiClient,
};
#[cfg(test)]
use crate::clients::ClientError;
use crate::manifest::{Dependency, Ecosystem, group_by_ecosystem, scan_manifests};
use crate::osv::{HttpOsvClient, OsvClient, OsvTarget, cvss_confidence};

const CACHE_DIR: &str = ".reposcope-cache";
const PER_ECOSYSTEM_CAP: usize = 50;
const DEFAULT_STALENESS_DAYS: i64 = 180;

pub struct DepHealthCollector;

impl CollectorCore for DepHealthCollector {
    fn name() -> &'static str {
        "dep-health"
    }
}

#[async_trait]
impl Collector for DepHealthCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let scan = scan_manifests(repo_path, |path| fs::read_to_string(path.as_std_path())).map_err(CollectorError::Malformed)?;

        if scan.dependencies.is_empty() {
            return Ok(CollectOutput::empty());
        }

        let cache_dir = Utf8PathBuf::from(CACHE_DIR);
        let mut signals = Vec::new();
        let mut cap_hits = Vec::new();

        let grouped = group_by_ecosystem(&scan.dependencies);

        for (ecosystem, deps) in &grouped {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let cap = TargetCap::new(PER_ECOSYSTEM_CAP);
            let produced = match ecosystem {
                Ecosystem::Go => {
                    let github = token_from_env().and_then(|token| GitHubClient::new(&GitHubHost::default(), Some(token), &cache_dir).ok());
                    let proxy = HttpGoProxyClient::new(&cache_dir);
                    check_go(ctx, deps, &scan.go_replaces, &scan.go_retracted, github.as_ref(), &proxy, opts, &cap).await
                }
                Ecosystem::Npm => check_npm(deps, &HttpNpmClient::new(&cache_dir), &cap).await,
                Ecosystem::Cargo => check_cargo(deps, &HttpCratesIoClient::new(&cache_dir), &cap).await,
                Ecosystem::Maven => check_maven(deps, &HttpMavenClient::new(&cache_dir), opts, &cap).await,
                Ecosystem::NuGet => check_nuget(deps, &HttpNuGetClient::new(&cache_dir), &cap).await,
                Ecosystem::PyPI => check_pypi(deps, &HttpPyPiClient::new(&cache_dir), &cap).await,
            };
            signals.extend(produced.map_err(CollectorError::Other)?);
            if deps.len() > PER_ECOSYSTEM_CAP {
                cap_hits.push(ecosystem.label());
            }
        }

        let osv_client = HttpOsvClient::new(&cache_dir);
        signals.extend(scan_vulnerabilities(ctx, &scan.dependencies, &osv_client).await.map_err(CollectorError::Other)?);

        let metrics = serde_json::json!({
            "manifests_scanned": scan.dependencies.len(),
            "ecosystems": grouped.keys().map(|e| e.label()).collect::<Vec<_>>(),
            "signal_count": signals.len(),
            "ecosystem_caps_hit": cap_hits,
        });

        Ok(CollectOutput::new(reposcope_core::finalize_signals(signals, opts)).with_metrics(metrics))
    }
}

async fn check_go(
    ctx: &RunContext,
    deps: &[&Dependency],
    replaces: &[crate::manifest::GoReplace],
    retracted: &[String],
    github: Option<&GitHubClient>,
    proxy: &dyn GoProxyClient,
    opts: &CollectorOpts,
    cap: &TargetCap,
) -> anyhow::Result<Vec<RawSignal>> {
    let mut signals = Vec::new();

    for replace in replaces {
        if !replace.is_local() {
            continue;
        }
        signals.push(
            RawSignal::builder("dep-health", "local-replace")
                .file_path("go.mod")
                .title(format!("`{}` is replaced by a local path", replace.module))
                .description(format!("`replace {} => {}` points outside the module proxy.", replace.module, replace.target))
                .confidence(0.5)
                .tag(replace.module.clone())
                .build()?,
        );
    }

    for dep in deps {
        if retracted.iter().any(|r| r == &dep.version) {
            signals.push(
                RawSignal::builder("dep-health", "retracted-version")
                    .file_path("go.mod")
                    .title(format!("{} {} has been retracted", dep.name, dep.version))
                    .description(format!("`go.mod` retracts {}.", dep.version))
                    .confidence(0.3)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }

    let staleness_days = opts
        .staleness_threshold
        .map(|d| d.as_secs() as i64 / 86_400)
        .unwrap_or(DEFAULT_STALENESS_DAYS);

    for dep in deps {
        if ctx.cancelled() {
            break;
        }
        if !cap.try_consume() {
            break;
        }

        if let (Some(client), Some((owner, repo))) = (github, dep.name.strip_prefix("github.com/").and_then(split_owner_repo)) {
            if let Ok(info) = client.repo_info(&owner, &repo).await {
                if info.archived {
                    signals.push(
                        RawSignal::builder("dep-health", "archived-dependency")
                            .file_path("go.mod")
                            .title(format!("{} is archived on GitHub", dep.name))
                            .description(format!("{}/{} is marked archived.", owner, repo))
                            .confidence(0.9)
                            .tag(dep.name.clone())
                            .build()?,
                    );
                } else if let Some(pushed_at) = info.pushed_at {
                    let age = days_old(pushed_at, chrono::Utc::now());
                    if age as i64 >= staleness_days {
                        signals.push(
                            RawSignal::builder("dep-health", "stale-dependency")
                                .file_path("go.mod")
                                .title(format!("{} has had no pushes in {:.0} days", dep.name, age))
                                .description(format!("{}/{}'s last push was {:.0} days ago.", owner, repo, age))
                                .confidence(0.6)
                                .tag(dep.name.clone())
                                .build()?,
                        );
                    }
                }
            }
        }

        if let Ok(latest) = proxy.latest(&dep.name).await
            && let Some(message) = latest.deprecated
        {
            signals.push(
                RawSignal::builder("dep-health", "deprecated-dependency")
                    .file_path("go.mod")
                    .title(format!("{} is deprecated", dep.name))
                    .description(format!("Go module proxy reports: {message}"))
                    .confidence(0.8)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }

    Ok(signals)
}

fn split_owner_repo(rest: &str) -> Option<(String, String)> {
    let mut parts = rest.splitn(2, '/');
    let owner = parts.next()?.to_string();
    let repo = parts.next()?.trim_end_matches('/').to_string();
    if owner.is_empty() || repo.is_empty() { None } else { Some((owner, repo)) }
}

async fn check_npm(deps: &[&Dependency], client: &dyn NpmClient, cap: &TargetCap) -> anyhow::Result<Vec<RawSignal>> {
    let mut signals = Vec::new();
    for dep in deps {
        if !cap.try_consume() {
            break;
        }
        if let Ok(Some(message)) = client.deprecation(&dep.name, &dep.version).await {
            signals.push(
                RawSignal::builder("dep-health", "deprecated-dependency")
                    .file_path("package.json")
                    .title(format!("{}@{} is deprecated", dep.name, dep.version))
                    .description(format!("npm registry reports: {message}"))
                    .confidence(0.8)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }
    Ok(signals)
}

async fn check_cargo(deps: &[&Dependency], client: &dyn CratesIoClient, cap: &TargetCap) -> anyhow::Result<Vec<RawSignal>> {
    let mut signals = Vec::new();
    for dep in deps {
        if !cap.try_consume() {
            break;
        }
        let Ok(versions) = client.versions(&dep.name).await else {
            continue;
        };
        if versions.iter().any(|v| v.num == dep.version && v.yanked) {
            signals.push(
                RawSignal::builder("dep-health", "yanked-dependency")
                    .file_path("Cargo.toml")
                    .title(format!("{} {} has been yanked", dep.name, dep.version))
                    .description(format!("crates.io reports {} {} as yanked.", dep.name, dep.version))
                    .confidence(0.9)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }
    Ok(signals)
}

async fn check_maven(deps: &[&Dependency], client: &dyn MavenClient, opts: &CollectorOpts, cap: &TargetCap) -> anyhow::Result<Vec<RawSignal>> {
    let mut signals = Vec::new();
    let staleness_days = opts
        .staleness_threshold
        .map(|d| d.as_secs() as i64 / 86_400)
        .unwrap_or(DEFAULT_STALENESS_DAYS);

    for dep in deps {
        if !cap.try_consume() {
            break;
        }
        let Some((group, artifact)) = dep.name.split_once(':') else {
            continue;
        };
        let Ok(Some(timestamp_ms)) = client.artifact_timestamp(group, artifact, &dep.version).await else {
            continue;
        };
        let Some(published) = chrono::DateTime::from_timestamp(timestamp_ms / 1000, 0) else {
            continue;
        };
        let age = days_old(published, chrono::Utc::now());
        if age as i64 >= staleness_days {
            signals.push(
                RawSignal::builder("dep-health", "stale-dependency")
                    .file_path("pom.xml")
                    .title(format!("{} {} was published {:.0} days ago", dep.name, dep.version, age))
                    .description(format!("Maven Central lists {} {} as {:.0} days old.", dep.name, dep.version, age))
                    .confidence(0.5)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }
    Ok(signals)
}

async fn check_nuget(deps: &[&Dependency], client: &dyn NuGetClient, cap: &TargetCap) -> anyhow::Result<Vec<RawSignal>> {
    let mut signals = Vec::new();
    for dep in deps {
        if !cap.try_consume() {
            break;
        }
        if let Ok(true) = client.is_deprecated(&dep.name, &dep.version).await {
            signals.push(
                RawSignal::builder("dep-health", "deprecated-dependency")
                    .file_path("*.csproj")
                    .title(format!("{} is deprecated on NuGet", dep.name))
                    .description(format!("NuGet's catalog entry for {} carries a deprecation notice.", dep.name))
                    .confidence(0.8)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }
    Ok(signals)
}

async fn check_pypi(deps: &[&Dependency], client: &dyn PyPiClient, cap: &TargetCap) -> anyhow::Result<Vec<RawSignal>> {
    let mut signals = Vec::new();
    for dep in deps {
        if !cap.try_consume() {
            break;
        }
        if let Ok(true) = client.is_inactive(&dep.name).await {
            signals.push(
                RawSignal::builder("dep-health", "inactive-dependency")
                    .file_path("requirements.txt")
                    .title(format!("{} is classified inactive on PyPI", dep.name))
                    .description(format!("{}'s PyPI classifiers include 'Development Status :: 7 - Inactive'.", dep.name))
                    .confidence(0.7)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }
    Ok(signals)
}

async fn scan_vulnerabilities(ctx: &RunContext, deps: &[Dependency], client: &dyn OsvClient) -> anyhow::Result<Vec<RawSignal>> {
    if ctx.cancelled() || deps.is_empty() {
        return Ok(Vec::new());
    }

    let targets: Vec<OsvTarget> = deps
        .iter()
        .map(|d| OsvTarget {
            ecosystem: d.ecosystem,
            name: d.name.clone(),
            version: d.version.clone(),
        })
        .collect();

    let Ok(results) = client.query_batch(&targets).await else {
        return Ok(Vec::new());
    };

    let mut signals = Vec::new();
    for (dep, vuln_ids) in deps.iter().zip(results) {
        for id in vuln_ids {
            if ctx.cancelled() {
                return Ok(signals);
            }
            let Ok(vuln) = client.vulnerability(&id).await else {
                continue;
            };
            let confidence = cvss_confidence(vuln.cvss_vector());
            let display_id = vuln.display_id().to_string();
            let summary = vuln.summary.clone().unwrap_or_else(|| format!("See {display_id}."));
            let description = format!("{summary} {}", vuln.upgrade_advice());
            signals.push(
                RawSignal::builder("dep-health", "vulnerable-dependency")
                    .file_path(dep.manifest_path.clone())
                    .title(format!("{} {} is affected by {display_id}", dep.name, dep.version))
                    .description(description)
                    .confidence(confidence)
                    .tag(dep.name.clone())
                    .build()?,
            );
        }
    }
    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_manifests_yields_no_signals() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        let output = DepHealthCollector.collect(&ctx, root, &opts).await.unwrap();
        assert!(output.signals.is_empty());
    }

    #[test]
    fn splits_owner_repo_from_go_module_path() {
        assert_eq!(split_owner_repo("acme/widgets"), Some(("acme".to_string(), "widgets".to_string())));
        assert_eq!(split_owner_repo("acme/widgets/v2"), Some(("acme".to_string(), "widgets/v2".to_string())));
        assert_eq!(split_owner_repo("acme"), None);
    }

    fn dep(ecosystem: Ecosystem, name: &str, version: &str) -> Dependency {
        Dependency {
            ecosystem,
            name: name.to_string(),
            version: version.to_string(),
            manifest_path: match ecosystem {
                Ecosystem::Npm => "package.json".to_string(),
                Ecosystem::Cargo => "Cargo.toml".to_string(),
                _ => "manifest".to_string(),
            },
        }
    }

    struct MockNpmClient {
        deprecated: Option<&'static str>,
    }

    #[async_trait]
    impl NpmClient for MockNpmClient {
        async fn deprecation(&self, _name: &str, _version: &str) -> Result<Option<String>, ClientError> {
            Ok(self.deprecated.map(str::to_string))
        }
    }

    /// A manifest declares `old-pkg`; the mocked registry reports it
    /// deprecated; exactly one `deprecated-dependency` signal at
    /// confidence 0.8.
    #[tokio::test]
    async fn deprecated_npm_package_emits_one_signal() {
        let d = dep(Ecosystem::Npm, "old-pkg", "2.0.0");
        let deps = vec![&d];
        let client = MockNpmClient {
            deprecated: Some("use new-pkg"),
        };
        let cap = TargetCap::new(PER_ECOSYSTEM_CAP);
        let signals = check_npm(&deps, &client, &cap).await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, "deprecated-dependency");
        assert_eq!(signals[0].confidence, 0.8);
        assert!(signals[0].description.contains("new-pkg"));
    }

    struct MockCratesIoClient {
        yanked_version: &'static str,
    }

    #[async_trait]
    impl CratesIoClient for MockCratesIoClient {
        async fn versions(&self, _name: &str) -> Result<Vec<crate::clients::CratesIoVersion>, ClientError> {
            Ok(vec![crate::clients::CratesIoVersion {
                num: self.yanked_version.to_string(),
                yanked: true,
            }])
        }
    }

    /// Seed scenario 5: `Cargo.toml` declares `serde = "1.0.0"`; the mocked
    /// crates.io response yanks `1.0.0`; one `yanked-dependency` signal at
    /// confidence 0.9, file path `Cargo.toml`.
    #[tokio::test]
    async fn yanked_crate_emits_one_signal() {
        let d = dep(Ecosystem::Cargo, "serde", "1.0.0");
        let deps = vec![&d];
        let client = MockCratesIoClient { yanked_version: "1.0.0" };
        let cap = TargetCap::new(PER_ECOSYSTEM_CAP);
        let signals = check_cargo(&deps, &client, &cap).await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, "yanked-dependency");
        assert_eq!(signals[0].confidence, 0.9);
        assert_eq!(signals[0].file_path, "Cargo.toml");
    }

    struct MockOsvClient {
        vuln: crate::osv::OsvVulnerability,
    }

    #[async_trait]
    impl OsvClient for MockOsvClient {
        async fn query_batch(&self, targets: &[OsvTarget]) -> Result<Vec<Vec<String>>, ClientError> {
            Ok(targets.iter().map(|_| vec![self.vuln.id.clone()]).collect())
        }

        async fn vulnerability(&self, _id: &str) -> Result<crate::osv::OsvVulnerability, ClientError> {
            Ok(self.vuln.clone())
        }
    }

    /// Seed scenario 6: a mocked OSV record with CVSS `C:H/I:H/A:H`, alias
    /// `CVE-2024-12345`, fixed `v1.0.1` emits a signal at confidence 0.95
    /// whose title names the CVE and whose description mentions the
    /// upgrade target.
    #[tokio::test]
    async fn high_severity_osv_vuln_emits_expected_signal() {
        let d = dep(Ecosystem::Npm, "left-pad", "1.0.0");
        let deps = vec![d];
        let vuln = crate::osv::OsvVulnerability {
            id: "GHSA-xxxx-yyyy-zzzz".to_string(),
            summary: Some("Remote code execution via crafted input.".to_string()),
            aliases: vec!["CVE-2024-12345".to_string()],
            severity: vec![crate::osv::OsvSeverity {
                kind: "CVSS_V3".to_string(),
                score: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H".to_string(),
            }],
            affected: vec![crate::osv::OsvAffected {
                ranges: vec![crate::osv::OsvRange {
                    events: vec![crate::osv::OsvEvent {
                        fixed: Some("v1.0.1".to_string()),
                    }],
                }],
            }],
        };
        let client = MockOsvClient { vuln };
        let ctx = RunContext::default();
        let signals = scan_vulnerabilities(&ctx, &deps, &client).await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].confidence, 0.95);
        assert!(signals[0].title.contains("CVE-2024-12345"));
        assert!(signals[0].description.contains("v1.0.1"));
    }
}
