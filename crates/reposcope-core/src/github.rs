//! A shared GitHub REST API client.
//!
//! Client construction follows a `default_middleware` cache/retry shape via
//! [`crate::http::build_client`]. Pagination, repo-metadata lookup, and
//! issue/PR/review listing are all implemented here.
//!
//! This client is intentionally the *only* GitHub client in the workspace:
//! it is shared by the issue/PR collector, the dependency-health
//! collector's archived/push-activity checks, and the review-concentration
//! path of the lottery-risk collector.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use camino::Utf8Path;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use thiserror::Error;

use crate::context::RunContext;
use crate::http::build_client;

/// Represents different types of GitHub hosts.
#[derive(Clone, Debug, PartialEq)]
pub enum GitHubHost {
    Enterprise(String),
    Standard(String),
}

impl GitHubHost {
    pub fn new(hostname: &str) -> Result<Self, String> {
        let normalized = hostname.to_lowercase();
        if normalized.starts_with("https://") || normalized.starts_with("http://") {
            return Err("must be a domain name, not a URL".into());
        }
        if normalized.eq_ignore_ascii_case("github.com") || normalized.ends_with(".ghe.com") {
            Ok(Self::Standard(hostname.into()))
        } else {
            Ok(Self::Enterprise(hostname.into()))
        }
    }

    fn api_host(&self) -> String {
        match self {
            Self::Enterprise(host) => host.clone(),
            Self::Standard(host) => format!("api.{host}"),
        }
    }

    fn api_base(&self) -> String {
        match self {
            Self::Enterprise(_) => format!("https://{host}/api/v3", host = self.api_host()),
            Self::Standard(_) => format!("https://{host}", host = self.api_host()),
        }
    }
}

impl Default for GitHubHost {
    fn default() -> Self {
        Self::Standard("github.com".into())
    }
}

impl Display for GitHubHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enterprise(host) => write!(f, "{host}"),
            Self::Standard(host) => write!(f, "{host}"),
        }
    }
}

impl FromStr for GitHubHost {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A sanitized GitHub access token. Never `Debug`-printed or logged.
#[derive(Clone)]
pub struct GitHubToken(String);

impl GitHubToken {
    pub fn new(token: &str) -> Result<Self, String> {
        let token = token.trim();
        if token.is_empty() {
            return Err("GitHub token cannot be empty".into());
        }
        Ok(Self(token.to_owned()))
    }

    fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.0))
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request error while accessing GitHub API")]
    Request(#[from] reqwest::Error),
    #[error("request error while accessing GitHub API")]
    Middleware(#[from] reqwest_middleware::Error),
    #[error("invalid token header")]
    InvalidTokenHeader(#[from] InvalidHeaderValue),
    #[error("can't access {owner}/{repo}: missing or you have no access")]
    RepoMissingOrPrivate { owner: String, repo: String },
    #[error("malformed pagination Link header: {0}")]
    BadLinkHeader(String),
    #[error("cancelled")]
    Cancelled,
}

/// The subset of GitHub's repository resource this workspace needs.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub archived: bool,
    pub private: bool,
    pub pushed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub default_branch: String,
}

/// One GitHub issue or pull request, as returned by the combined
/// `/issues` endpoint (GitHub returns PRs from that endpoint too, flagged
/// by the presence of `pull_request`).
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: Option<User>,
    pub labels: Vec<Label>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub comments: u64,
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A review left on a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub user: Option<User>,
    pub state: String,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub body: Option<String>,
}

/// A file changed by a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
}

/// A pull request as returned by the dedicated `/pulls` endpoint (unlike
/// [`Issue`], this carries `merged_at`).
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: Option<User>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub merged_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

#[derive(Clone)]
pub struct Client {
    api_base: String,
    token: Option<GitHubToken>,
    inner: ClientWithMiddleware,
}

impl Client {
    pub fn new(host: &GitHubHost, token: Option<GitHubToken>, cache_dir: &Utf8Path) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = &token {
            headers.insert(AUTHORIZATION, token.header_value()?);
        }

        let inner = build_client(&host.api_host(), cache_dir, 3, headers);

        Ok(Self {
            api_base: host.api_base(),
            token,
            inner,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[tracing::instrument(skip(self))]
    pub async fn repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, ClientError> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let resp = self.inner.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::RepoMissingOrPrivate {
                owner: owner.to_string(),
                repo: repo.to_string(),
            });
        }
        Ok(resp.error_for_status()?.json().await?)
    }

    /// Lists every open-or-closed issue (including pull requests) for
    /// `owner/repo`, paginating until either GitHub stops returning a
    /// `next` link, `max_items` is reached, or `ctx` is cancelled.
    ///
    /// Cancellation is checked between pages, matching the collector
    /// contract's "check for cancellation... before issuing a new network
    /// call" rule.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_issues(
        &self,
        ctx: &RunContext,
        owner: &str,
        repo: &str,
        max_items: usize,
    ) -> Result<Vec<Issue>, ClientError> {
        let first = format!(
            "{}/repos/{owner}/{repo}/issues?state=all&per_page=100&sort=created&direction=desc",
            self.api_base
        );
        self.paginate(ctx, first, max_items).await
    }

    /// Lists reviews left on a single pull request.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_reviews(
        &self,
        ctx: &RunContext,
        owner: &str,
        repo: &str,
        pr_number: u64,
        max_items: usize,
    ) -> Result<Vec<Review>, ClientError> {
        let first = format!(
            "{}/repos/{owner}/{repo}/pulls/{pr_number}/reviews?per_page=100",
            self.api_base
        );
        self.paginate(ctx, first, max_items).await
    }

    /// Lists files changed by a single pull request.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_pull_request_files(
        &self,
        ctx: &RunContext,
        owner: &str,
        repo: &str,
        pr_number: u64,
        max_items: usize,
    ) -> Result<Vec<PullRequestFile>, ClientError> {
        let first = format!(
            "{}/repos/{owner}/{repo}/pulls/{pr_number}/files?per_page=100",
            self.api_base
        );
        self.paginate(ctx, first, max_items).await
    }

    /// Lists pull requests via the dedicated `/pulls` endpoint (so
    /// `merged_at` is available, unlike the combined `/issues` listing).
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_pull_requests(
        &self,
        ctx: &RunContext,
        owner: &str,
        repo: &str,
        state: &str,
        max_items: usize,
    ) -> Result<Vec<PullRequest>, ClientError> {
        let first = format!(
            "{}/repos/{owner}/{repo}/pulls?state={state}&per_page=100&sort=updated&direction=desc",
            self.api_base
        );
        self.paginate(ctx, first, max_items).await
    }

    async fn paginate<T>(&self, ctx: &RunContext, first_url: String, max_items: usize) -> Result<Vec<T>, ClientError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut items = Vec::new();
        let mut next_url = Some(first_url);

        while let Some(url) = next_url {
            if ctx.cancelled() {
                return Err(ClientError::Cancelled);
            }
            if items.len() >= max_items {
                break;
            }

            let resp = self.inner.get(&url).send().await?.error_for_status()?;
            next_url = next_link(resp.headers());
            let mut page: Vec<T> = resp.json().await?;
            let remaining = max_items.saturating_sub(items.len());
            page.truncate(remaining);
            items.extend(page);
        }

        Ok(items)
    }
}

/// Parses the `rel="next"` target out of a GitHub `Link` response header.
fn next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let raw = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    raw.split(',').find_map(|part| {
        let mut segments = part.split(';').map(str::trim);
        let url_segment = segments.next()?;
        let is_next = segments.any(|s| s == "rel=\"next\"");
        if !is_next {
            return None;
        }
        url_segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')).map(str::to_string)
    })
}

/// A parsed `git@github.com:owner/repo.git` or
/// `https://github.com/owner/repo` remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    /// Extracts an `owner/repo` slug from a GitHub SSH or HTTPS remote URL.
    /// Returns `None` for remotes that aren't GitHub (or aren't recognized).
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let trimmed = url.trim().trim_end_matches(".git");

        let rest = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("https://github.com/") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("http://github.com/") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("ssh://git@github.com/") {
            rest
        } else {
            return None;
        };

        let mut parts = rest.splitn(2, '/');
        let owner = parts.next()?.to_string();
        let repo = parts.next()?.to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self { owner, repo })
    }
}

/// Wraps a [`ClientError`] for sharing across concurrent collectors that
/// all hold the same cached lookup behind an `Arc`.
pub type SharedClientError = Arc<ClientError>;

/// Reads `GITHUB_TOKEN` from the environment, if set and non-empty.
pub fn token_from_env() -> Option<GitHubToken> {
    std::env::var("GITHUB_TOKEN").ok().and_then(|t| GitHubToken::new(&t).ok())
}

/// The `origin` remote's URL, if the repository has one.
pub fn origin_remote_url(repo: &git2::Repository) -> Option<String> {
    repo.find_remote("origin").ok()?.url().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_detects_enterprise() {
        assert_eq!(GitHubHost::new("github.com").unwrap(), GitHubHost::Standard("github.com".into()));
        assert_eq!(
            GitHubHost::new("github.example.com").unwrap(),
            GitHubHost::Enterprise("github.example.com".into())
        );
        assert!(GitHubHost::new("https://github.com").is_err());
    }

    #[test]
    fn token_rejects_empty() {
        assert!(GitHubToken::new("   ").is_err());
        assert!(GitHubToken::new("ghp_abc").is_ok());
    }

    #[test]
    fn slug_parses_ssh_and_https() {
        assert_eq!(
            RepoSlug::from_remote_url("git@github.com:acme/widgets.git"),
            Some(RepoSlug {
                owner: "acme".into(),
                repo: "widgets".into()
            })
        );
        assert_eq!(
            RepoSlug::from_remote_url("https://github.com/acme/widgets"),
            Some(RepoSlug {
                owner: "acme".into(),
                repo: "widgets".into()
            })
        );
        assert_eq!(RepoSlug::from_remote_url("https://gitlab.com/acme/widgets"), None);
    }

    #[test]
    fn next_link_parses_multi_rel_header() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            "<https://api.github.com/repos/a/b/issues?page=2>; rel=\"next\", <https://api.github.com/repos/a/b/issues?page=5>; rel=\"last\""
                .parse()
                .unwrap(),
        );
        assert_eq!(
            next_link(&headers),
            Some("https://api.github.com/repos/a/b/issues?page=2".to_string())
        );
    }

    #[test]
    fn next_link_absent_on_last_page() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            "<https://api.github.com/repos/a/b/issues?page=1>; rel=\"prev\""
                .parse()
                .unwrap(),
        );
        assert_eq!(next_link(&headers), None);
    }
}
