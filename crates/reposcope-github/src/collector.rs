//! The GitHub issue/PR collector: token/remote detection, issue and PR
//! classification, and review-comment scanning wired into a [`Collector`].

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use reposcope_core::RawSignal;
use reposcope_core::duration::days_old;
use reposcope_core::github::{Client, GitHubHost, RepoSlug, origin_remote_url, token_from_env};
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::classify::{
    CLOSED_ISSUE_CONFIDENCE, CLOSED_ISSUE_KIND, ReviewState, classify_closed_pr, classify_open_issue, classify_open_pr,
    is_actionable_review_comment, review_todo_confidence,
};
use crate::modules::modules_affected_summary;

const CACHE_DIR: &str = ".reposcope-cache";

pub struct GitHubCollector;

impl CollectorCore for GitHubCollector {
    fn name() -> &'static str {
        "github"
    }
}

#[async_trait]
impl Collector for GitHubCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let Some(token) = token_from_env() else {
            tracing::info!("no GITHUB_TOKEN in environment, skipping github collector");
            return Ok(CollectOutput::empty());
        };

        let Some(repo) = git2::Repository::discover(repo_path.as_std_path()).ok() else {
            return Ok(CollectOutput::empty());
        };
        let Some(origin) = origin_remote_url(&repo) else {
            return Ok(CollectOutput::empty());
        };
        let Some(slug) = RepoSlug::from_remote_url(&origin) else {
            tracing::info!("origin remote is not a GitHub URL, skipping github collector");
            return Ok(CollectOutput::empty());
        };

        let client = Client::new(&GitHubHost::default(), Some(token), &Utf8PathBuf::from(CACHE_DIR)).map_err(|e| CollectorError::Other(e.into()))?;

        let now = chrono::Utc::now();
        let history_cutoff = opts.history_depth.map(|d| now - chrono::Duration::from_std(d).unwrap_or_default());

        let mut signals = Vec::new();

        let issues = client
            .list_issues(ctx, &slug.owner, &slug.repo, opts.max_issues)
            .await
            .map_err(to_collector_error)?;

        for issue in issues.iter().filter(|i| !i.is_pull_request()) {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let age_days = days_old(issue.created_at, now);
            let labels: Vec<String> = issue.labels.iter().map(|l| l.name.clone()).collect();
            let path = format!("github/issues/{}", issue.number);

            if issue.state == "closed" {
                if !opts.include_closed {
                    continue;
                }
                if let Some(cutoff) = history_cutoff
                    && issue.closed_at.is_some_and(|closed| closed < cutoff)
                {
                    continue;
                }
                let signal = RawSignal::builder("github", CLOSED_ISSUE_KIND)
                    .file_path(path)
                    .title(format!("#{}: {}", issue.number, issue.title))
                    .description(format!("Closed issue opened by {}.", author_name(&issue.user)))
                    .confidence(CLOSED_ISSUE_CONFIDENCE)
                    .tag("pre-closed")
                    .build()
                    .map_err(CollectorError::Other)?;
                signals.push(signal);
                continue;
            }

            let (kind, confidence) = classify_open_issue(&labels, age_days);
            let signal = RawSignal::builder("github", kind)
                .file_path(path)
                .title(format!("#{}: {}", issue.number, issue.title))
                .description(format!("Opened by {}, {:.0} days ago.", author_name(&issue.user), age_days))
                .confidence(confidence)
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let pr_state = if opts.include_closed { "all" } else { "open" };
        let prs = client
            .list_pull_requests(ctx, &slug.owner, &slug.repo, pr_state, opts.max_issues)
            .await
            .map_err(to_collector_error)?;

        for pr in &prs {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let age_days = days_old(pr.created_at, now);
            let path = format!("github/pulls/{}", pr.number);

            if pr.state == "closed" {
                if let Some(cutoff) = history_cutoff
                    && pr.closed_at.is_some_and(|closed| closed < cutoff)
                {
                    continue;
                }
                let files = client
                    .list_pull_request_files(ctx, &slug.owner, &slug.repo, pr.number, 100)
                    .await
                    .unwrap_or_default();
                let file_paths: Vec<String> = files.into_iter().map(|f| f.filename).collect();
                let (kind, confidence) = classify_closed_pr(pr.is_merged());
                let signal = RawSignal::builder("github", kind)
                    .file_path(path)
                    .title(format!("#{}: {}", pr.number, pr.title))
                    .description(format!("{}\n{}", author_name(&pr.user), modules_affected_summary(&file_paths)))
                    .confidence(confidence)
                    .build()
                    .map_err(CollectorError::Other)?;
                signals.push(signal);
                continue;
            }

            let reviews = client
                .list_reviews(ctx, &slug.owner, &slug.repo, pr.number, 100)
                .await
                .unwrap_or_default();
            let review_state = ReviewState {
                any_changes_requested: reviews.iter().any(|r| r.state == "CHANGES_REQUESTED"),
                any_approved: reviews.iter().any(|r| r.state == "APPROVED"),
            };
            let (kind, confidence) = classify_open_pr(review_state);
            let signal = RawSignal::builder("github", kind)
                .file_path(path.clone())
                .title(format!("#{}: {}", pr.number, pr.title))
                .description(format!("Opened by {}, {:.0} days ago.", author_name(&pr.user), age_days))
                .confidence(confidence)
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);

            for review in &reviews {
                let Some(body) = review.body.as_deref() else { continue };
                if !is_actionable_review_comment(body) {
                    continue;
                }
                let review_age_days = review.submitted_at.map_or(age_days, |submitted| days_old(submitted, now));
                let signal = RawSignal::builder("github", "github-review-todo")
                    .file_path(path.clone())
                    .title(format!("#{}: actionable review comment from {}", pr.number, author_name(&review.user)))
                    .description(body.to_string())
                    .confidence(review_todo_confidence(review_age_days))
                    .build()
                    .map_err(CollectorError::Other)?;
                signals.push(signal);
            }
        }

        let metrics = serde_json::json!({
            "issues_scanned": issues.len(),
            "prs_scanned": prs.len(),
            "signal_count": signals.len(),
            "authenticated": client.is_authenticated(),
        });

        Ok(CollectOutput::new(reposcope_core::finalize_signals(signals, opts)).with_metrics(metrics))
    }
}

fn author_name(user: &Option<reposcope_core::github::User>) -> &str {
    user.as_ref().map(|u| u.login.as_str()).unwrap_or("unknown")
}

fn to_collector_error(err: reposcope_core::github::ClientError) -> CollectorError {
    match err {
        reposcope_core::github::ClientError::Cancelled => CollectorError::Cancelled,
        other => CollectorError::Other(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_git_directory_yields_no_signals() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        // SAFETY: single-threaded test, no concurrent env access.
        unsafe { std::env::remove_var("GITHUB_TOKEN") };
        let output = GitHubCollector.collect(&ctx, root, &opts).await.unwrap();
        assert!(output.signals.is_empty());
    }
}
