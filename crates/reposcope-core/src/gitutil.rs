//! A shared, stateless commit-walk helper.
//!
//! Both `reposcope-ownership` (commit-weight accumulation) and
//! `reposcope-gitlog` (reverts, churn, stale branches) walk
//! committer-time-ordered first-parent history bounded by the same
//! `GitSince`/`GitDepth` knobs; sharing this helper keeps both collectors'
//! shallow-clone degradation behavior identical. Collectors otherwise share
//! no state with each other except a documented shared-metrics map;
//! sharing a stateless walk function is not state-sharing.

use camino::Utf8Path;
use git2::{Repository, Sort};

use crate::context::RunContext;
use crate::opts::CollectorOpts;

/// One commit visited by [`walk_commits`].
pub struct WalkedCommit<'repo> {
    pub commit: git2::Commit<'repo>,
}

/// Errors from opening or walking a repository.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("not a git repository")]
    NotARepo,
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("walk cancelled")]
    Cancelled,
}

/// Opens the repository at `repo_path` (or `opts.git_root` if set),
/// returning `Ok(None)` when the path isn't a git repository at all — per
/// the collector contract, that's an absent-input condition, not an error.
pub fn open_repo(repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<Option<Repository>, GitError> {
    let root = opts.git_root.as_deref().unwrap_or(repo_path);
    match Repository::discover(root.as_std_path()) {
        Ok(repo) => Ok(Some(repo)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Walks first-parent history from `HEAD` in committer-time order (newest
/// first), bounded by `opts.git_depth` (default 1000) and `opts.git_since`,
/// invoking `visit` for each commit.
///
/// Checks `ctx.cancelled()` before visiting every commit. Shallow-clone
/// parent-object-not-found errors during the walk degrade gracefully: the
/// walk simply stops, returning the commits visited so far.
pub fn walk_commits(
    repo: &Repository,
    ctx: &RunContext,
    opts: &CollectorOpts,
    mut visit: impl FnMut(WalkedCommit),
) -> Result<usize, GitError> {
    const DEFAULT_DEPTH: usize = 1000;
    let depth = opts.git_depth.unwrap_or(DEFAULT_DEPTH).min(DEFAULT_DEPTH);
    let since_cutoff = opts.git_since.map(|d| chrono::Utc::now() - chrono::Duration::from_std(d).unwrap_or_default());

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    if revwalk.push_head().is_err() {
        // No HEAD (empty repo): nothing to walk.
        return Ok(0);
    }

    let mut visited = 0usize;
    for oid in revwalk {
        if visited >= depth {
            break;
        }
        if ctx.cancelled() {
            return Err(GitError::Cancelled);
        }
        let oid = match oid {
            Ok(oid) => oid,
            // Shallow-clone parent lookups can fail mid-walk; stop here
            // rather than erroring the whole collector.
            Err(_) => break,
        };
        let commit = match repo.find_commit(oid) {
            Ok(c) => c,
            Err(_) => break,
        };

        if let Some(cutoff) = since_cutoff {
            let commit_time = commit_timestamp(&commit);
            if commit_time < cutoff {
                break;
            }
        }

        visited += 1;
        visit(WalkedCommit { commit });
    }

    Ok(visited)
}

/// The commit's committer timestamp, as a UTC `DateTime`.
pub fn commit_timestamp(commit: &git2::Commit) -> chrono::DateTime<chrono::Utc> {
    let time = commit.committer().when();
    chrono::DateTime::from_timestamp(time.seconds(), 0).unwrap_or_else(chrono::Utc::now)
}

/// Files touched by `commit` relative to its first parent (or, for a root
/// commit, every file in its tree).
pub fn changed_files(repo: &Repository, commit: &git2::Commit) -> Result<Vec<String>, GitError> {
    let tree = commit.tree()?;
    let parent_tree = commit.parents().next().map(|p| p.tree()).transpose()?;

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
    let mut files = Vec::new();
    diff.foreach(
        &mut |delta, _| {
            if let Some(path) = delta.new_file().path().and_then(|p| p.to_str()) {
                files.push(path.to_string());
            }
            true
        },
        None,
        None,
        None,
    )?;
    Ok(files)
}
