//! A single commit walk producing revert, churn, and stale-branch signals.

use std::collections::HashMap;

use async_trait::async_trait;
use camino::Utf8Path;
use reposcope_core::duration::days_old;
use reposcope_core::gitutil::{self, changed_files, commit_timestamp};
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::branches::{is_candidate_branch, stale_confidence};
use crate::churn::{CHURN_WINDOW_DAYS, churn_confidence};
use crate::reverts::{is_revert, reverted_subject};

pub struct GitLogCollector;

impl CollectorCore for GitLogCollector {
    fn name() -> &'static str {
        "git-log"
    }
}

#[async_trait]
impl Collector for GitLogCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let Some(repo) = gitutil::open_repo(repo_path, opts).map_err(|e| CollectorError::Other(e.into()))? else {
            tracing::info!("not a git repository, skipping git-log analysis");
            return Ok(CollectOutput::empty());
        };

        let now = chrono::Utc::now();
        let mut revert_signals = Vec::new();
        let mut churn_counts: HashMap<String, u32> = HashMap::new();
        let mut commits_walked = 0usize;

        gitutil::walk_commits(&repo, ctx, opts, |walked| {
            commits_walked += 1;
            let commit = &walked.commit;
            let message = commit.message().unwrap_or("");

            if is_revert(message) {
                let subject = message.lines().next().unwrap_or("").to_string();
                let author = commit.author().name().unwrap_or("unknown").to_string();
                revert_signals.push((subject, reverted_subject(message), author, commit_timestamp(commit)));
            }

            let age_days = days_old(commit_timestamp(commit), now);
            if age_days <= CHURN_WINDOW_DAYS as f64
                && let Ok(files) = changed_files(&repo, commit)
            {
                for file in files {
                    *churn_counts.entry(file).or_insert(0) += 1;
                }
            }
        })
        .map_err(|e| match e {
            gitutil::GitError::Cancelled => CollectorError::Cancelled,
            other => CollectorError::Other(other.into()),
        })?;

        if ctx.cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let mut signals = Vec::new();

        for (subject, original, author, timestamp) in revert_signals {
            let title = match &original {
                Some(orig) => format!("revert of \"{orig}\""),
                None => format!("revert commit: {subject}"),
            };
            let signal = reposcope_core::RawSignal::builder("git-log", "revert")
                .file_path(".".to_string())
                .title(title)
                .description(format!("Commit subject: {subject}"))
                .author(author)
                .timestamp(timestamp)
                .confidence(0.7)
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let mut churn_files: Vec<(String, u32)> = churn_counts.into_iter().collect();
        churn_files.sort_by(|a, b| a.0.cmp(&b.0));
        for (file, count) in churn_files {
            let confidence = churn_confidence(count);
            if confidence <= 0.0 {
                continue;
            }
            let signal = reposcope_core::RawSignal::builder("git-log", "churn")
                .file_path(file.clone())
                .title(format!("{file} modified {count} times in the last {CHURN_WINDOW_DAYS} days"))
                .description(format!("{count} commits touched {file} within the churn window, above the threshold of 10."))
                .confidence(confidence)
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        if ctx.cancelled() {
            return Err(CollectorError::Cancelled);
        }

        for stale in stale_branch_signals(&repo, now)? {
            signals.push(stale);
        }

        let metrics = serde_json::json!({
            "commits_walked": commits_walked,
            "revert_count": signals.iter().filter(|s| s.kind == "revert").count(),
            "churn_signal_count": signals.iter().filter(|s| s.kind == "churn").count(),
            "stale_branch_count": signals.iter().filter(|s| s.kind == "stale-branch").count(),
        });

        Ok(CollectOutput::new(signals).with_metrics(metrics))
    }
}

fn stale_branch_signals(
    repo: &git2::Repository,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<reposcope_core::RawSignal>, CollectorError> {
    let mut signals = Vec::new();
    let branches = repo.branches(Some(git2::BranchType::Local)).map_err(|e| CollectorError::Other(e.into()))?;

    for branch in branches.flatten() {
        let (branch, _) = branch;
        let Some(name) = branch.name().ok().flatten().map(str::to_string) else {
            continue;
        };
        if !is_candidate_branch(&name) {
            continue;
        }
        let Ok(commit) = branch.get().peel_to_commit() else {
            continue;
        };
        let age = days_old(commit_timestamp(&commit), now);
        let confidence = stale_confidence(age);
        if confidence <= 0.0 {
            continue;
        }

        let signal = reposcope_core::RawSignal::builder("git-log", "stale-branch")
            .file_path(format!("refs/heads/{name}"))
            .title(format!("branch `{name}` has had no commits in {:.0} days", age))
            .description(format!("`{name}`'s tip commit is {:.0} days old, above the 30-day staleness threshold.", age))
            .confidence(confidence)
            .tag(name)
            .build()
            .map_err(CollectorError::Other)?;
        signals.push(signal);
    }

    signals.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = Command::new("git").current_dir(dir).args(args).status().unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[tokio::test]
    async fn detects_revert_commit() {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["config", "user.email", "a@example.com"]);
        git(dir.path(), &["config", "user.name", "Test Author"]);
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "add feature"]);
        std::fs::write(dir.path().join("a.txt"), "two\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "Revert \"add feature\""]);

        let root = camino::Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        let output = GitLogCollector.collect(&ctx, &root, &opts).await.unwrap();

        assert!(output.signals.iter().any(|s| s.kind == "revert"));
    }

    #[tokio::test]
    async fn non_git_directory_yields_no_signals() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        let output = GitLogCollector.collect(&ctx, &root, &opts).await.unwrap();
        assert!(output.signals.is_empty());
    }
}
