//! Per-directory commit-weight aggregation with recency decay.

use git2::Repository;
use indexmap::IndexMap;

use reposcope_core::context::RunContext;
use reposcope_core::duration::days_old;
use reposcope_core::gitutil::{self, GitError};
use reposcope_core::opts::CollectorOpts;

/// `directory -> author -> decayed commit weight`.
pub type CommitWeight = IndexMap<String, IndexMap<String, f64>>;

/// Recency decay: `2^(-daysOld/180)`, floored at 0 days (commits in the
/// future or today contribute weight 1).
pub fn recency_decay(days_old: f64) -> f64 {
    2f64.powf(-days_old.max(0.0) / 180.0)
}

/// Walks commits (bounded by `opts.git_depth`/`opts.git_since`) and, for
/// each touched file, adds `recency_decay(daysOld)` to the committing
/// author's weight for the file's owning directory.
pub fn commit_weight_tally(
    repo: &Repository,
    ctx: &RunContext,
    opts: &CollectorOpts,
    dir_of: impl Fn(&str) -> Option<String>,
) -> Result<CommitWeight, GitError> {
    let now = chrono::Utc::now();
    let mut tally: CommitWeight = IndexMap::new();
    let mut commits_seen = 0usize;

    gitutil::walk_commits(repo, ctx, opts, |walked| {
        commits_seen += 1;
        if commits_seen % 100 == 0 {
            opts.report(&format!("walked {commits_seen} commits"));
        }

        let commit = &walked.commit;
        let author = commit.author().name().unwrap_or("unknown").to_string();
        let commit_time = gitutil::commit_timestamp(commit);
        let decay = recency_decay(days_old(commit_time, now));

        let Ok(files) = gitutil::changed_files(repo, commit) else {
            return;
        };
        for file in files {
            let Some(dir) = dir_of(&file) else { continue };
            *tally.entry(dir).or_default().entry(author.clone()).or_insert(0.0) += decay;
        }
    })?;

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_is_one_at_zero_days() {
        assert_eq!(recency_decay(0.0), 1.0);
    }

    #[test]
    fn decay_is_monotonically_non_increasing_in_days() {
        let mut prev = recency_decay(0.0);
        for days in [1.0, 10.0, 90.0, 180.0, 360.0] {
            let current = recency_decay(days);
            assert!(current <= prev);
            prev = current;
        }
    }

    #[test]
    fn decay_halves_at_180_days() {
        assert!((recency_decay(180.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn future_commits_floor_to_full_weight() {
        assert_eq!(recency_decay(-5.0), 1.0);
    }
}
