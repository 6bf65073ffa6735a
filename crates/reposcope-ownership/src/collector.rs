//! The lottery-risk collector: blame + commit-weight ownership, confidence
//! classification, anonymization, demo-path suppression, and (when a
//! GitHub context is available) review-concentration signals.

use std::collections::BTreeSet;

use async_trait::async_trait;
use camino::Utf8Path;
use indexmap::IndexMap;
use reposcope_core::anonymize::Anonymizer;
use reposcope_core::github::{Client, GitHubHost, RepoSlug, origin_remote_url, token_from_env};
use reposcope_core::opts::Anonymize;
use reposcope_core::walk::{PatternMatcher, has_source_extension, is_demo_path, walk_files};
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::blame::blame_tally;
use crate::commits::commit_weight_tally;
use crate::directories::discover_directories;
use crate::ownership::{lottery_risk, ownership_fractions, risk_confidence};
use crate::review::concentrated_reviewers;

pub struct OwnershipCollector;

impl CollectorCore for OwnershipCollector {
    fn name() -> &'static str {
        "lottery-risk"
    }
}

#[async_trait]
impl Collector for OwnershipCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let Some(repo) = reposcope_core::gitutil::open_repo(repo_path, opts).map_err(|e| CollectorError::Other(e.into()))? else {
            tracing::info!("not a git repository, skipping lottery-risk analysis");
            return Ok(CollectOutput::empty());
        };

        let matcher = PatternMatcher::new(opts).map_err(CollectorError::Other)?;
        let dirs = discover_directories(repo_path, &matcher);

        let mut files_by_dir: IndexMap<String, Vec<String>> = IndexMap::new();
        for file in walk_files(repo_path, &matcher) {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            if !has_source_extension(Utf8Path::new(file.as_str())) {
                continue;
            }
            let dir = match file.parent() {
                Some(p) if !p.as_str().is_empty() => p.as_str().to_string(),
                _ => ".".to_string(),
            };
            files_by_dir.entry(dir).or_default().push(file.as_str().to_string());
        }

        let blame = blame_tally(ctx, &repo, &files_by_dir, opts).map_err(|e| match e {
            reposcope_core::gitutil::GitError::Cancelled => CollectorError::Cancelled,
            other => CollectorError::Other(other.into()),
        })?;
        let dir_of_file = build_dir_index(&files_by_dir);
        let commit_weights = commit_weight_tally(&repo, ctx, opts, |f| dir_of_file.get(f).cloned()).map_err(|e| match e {
            reposcope_core::gitutil::GitError::Cancelled => CollectorError::Cancelled,
            other => CollectorError::Other(other.into()),
        })?;

        let mut anonymizer = Anonymizer::new();
        let anonymize = should_anonymize(opts, &repo).await;

        let mut signals = Vec::new();
        for dir in &dirs {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            if !opts.include_demo_paths && is_demo_path(dir) {
                continue;
            }

            let empty_blame = IndexMap::new();
            let empty_commit = IndexMap::new();
            let dir_blame = blame.get(dir).unwrap_or(&empty_blame);
            let dir_commits = commit_weights.get(dir).unwrap_or(&empty_commit);
            let ranked = ownership_fractions(dir_blame, dir_commits);
            let risk = lottery_risk(&ranked);

            if risk == 0 || risk > 1 {
                continue;
            }

            let top_authors: Vec<String> = ranked
                .iter()
                .take(risk)
                .map(|a| if anonymize { anonymizer.anonymize(&a.author) } else { a.author.clone() })
                .collect();

            let signal = reposcope_core::RawSignal::builder("lottery-risk", "low-lottery-risk")
                .file_path(dir.clone())
                .title(format!("{dir}: lottery risk {risk} ({})", top_authors.join(", ")))
                .description(format!(
                    "{dir} would lose majority coverage if {} ({}) stopped contributing.",
                    if risk == 1 { "one author" } else { "these authors" },
                    top_authors.join(", ")
                ))
                .confidence(risk_confidence(risk))
                .tags(top_authors)
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        if let Some((client, owner, repo_name)) = github_review_client(opts, &repo).await {
            for hot in concentrated_reviewers(&client, ctx, &owner, &repo_name, opts.max_issues.max(50)).await {
                let reviewer = if anonymize { anonymizer.anonymize(&hot.reviewer) } else { hot.reviewer.clone() };
                let signal = reposcope_core::RawSignal::builder("lottery-risk", "review-concentration")
                    .file_path(hot.directory.clone())
                    .title(format!("{reviewer} accounts for {:.0}% of reviews in {}", hot.fraction * 100.0, hot.directory))
                    .description(format!(
                        "{reviewer} left {:.0}% of {} reviews recorded for {} since the start of the scanned history.",
                        hot.fraction * 100.0,
                        hot.total_reviews,
                        hot.directory
                    ))
                    .confidence(0.6)
                    .tag(reviewer)
                    .build()
                    .map_err(CollectorError::Other)?;
                signals.push(signal);
            }
        }

        let metrics = serde_json::json!({
            "directories_scanned": dirs.len(),
            "signals_emitted": signals.len(),
        });

        Ok(CollectOutput::new(signals).with_metrics(metrics))
    }
}

fn build_dir_index(files_by_dir: &IndexMap<String, Vec<String>>) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for (dir, files) in files_by_dir {
        for file in files {
            out.insert(file.clone(), dir.clone());
        }
    }
    out
}

/// Decides whether to anonymize authors: `always`/`never` are immediate,
/// `auto` anonymizes only when the GitHub API reports the repo as public.
async fn should_anonymize(opts: &CollectorOpts, repo: &git2::Repository) -> bool {
    match opts.anonymize {
        Anonymize::Always => true,
        Anonymize::Never | Anonymize::Unset => false,
        Anonymize::Auto => is_public_repo(repo).await.unwrap_or(false),
    }
}

async fn is_public_repo(repo: &git2::Repository) -> Option<bool> {
    let url = origin_remote_url(repo)?;
    let slug = RepoSlug::from_remote_url(&url)?;
    let token = token_from_env();
    let client = Client::new(&GitHubHost::default(), token, Utf8Path::new(".reposcope-cache")).ok()?;
    let info = client.repo_info(&slug.owner, &slug.repo).await.ok()?;
    Some(!info.private)
}

async fn github_review_client(opts: &CollectorOpts, repo: &git2::Repository) -> Option<(Client, String, String)> {
    let _ = opts;
    let url = origin_remote_url(repo)?;
    let slug = RepoSlug::from_remote_url(&url)?;
    let token = token_from_env()?;
    let client = Client::new(&GitHubHost::default(), Some(token), Utf8Path::new(".reposcope-cache")).ok()?;
    Some((client, slug.owner, slug.repo))
}
