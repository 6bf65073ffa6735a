//! Per-directory blame-line aggregation.

use camino::Utf8Path;
use git2::Repository;
use indexmap::IndexMap;

use reposcope_core::context::RunContext;
use reposcope_core::gitutil::GitError;

/// `directory -> author -> surviving blame line count`.
pub type BlameTally = IndexMap<String, IndexMap<String, u32>>;

/// Runs `git blame` over every file in `files_by_dir` (directory -> list of
/// repo-relative file paths) and tallies surviving lines per author per
/// directory. Checks `ctx` for cancellation before every file's blame call
/// and reports progress every 50 blamed files.
pub fn blame_tally(ctx: &RunContext, repo: &Repository, files_by_dir: &IndexMap<String, Vec<String>>, opts: &reposcope_core::opts::CollectorOpts) -> Result<BlameTally, GitError> {
    let mut tally: BlameTally = IndexMap::new();
    let mut blamed_files = 0u64;

    for (dir, files) in files_by_dir {
        let dir_entry = tally.entry(dir.clone()).or_default();
        for file in files {
            if ctx.cancelled() {
                return Err(GitError::Cancelled);
            }
            let Ok(blame) = repo.blame_file(Utf8Path::new(file).as_std_path(), None) else {
                continue;
            };
            for hunk in blame.iter() {
                let author = hunk.final_signature().name().unwrap_or("unknown").to_string();
                *dir_entry.entry(author).or_insert(0) += hunk.lines_in_hunk() as u32;
            }
            blamed_files += 1;
            if blamed_files % 50 == 0 {
                opts.report(&format!("blamed {blamed_files} files"));
            }
        }
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = Command::new("git").current_dir(dir).args(args).status().unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn single_author_file_blames_entirely_to_them() {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["config", "user.email", "a@example.com"]);
        git(dir.path(), &["config", "user.name", "Test Author"]);
        std::fs::write(dir.path().join("a.go"), "package main\n\nfunc main() {}\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", "init"]);

        let repo = Repository::open(dir.path()).unwrap();
        let mut files_by_dir = IndexMap::new();
        files_by_dir.insert(".".to_string(), vec!["a.go".to_string()]);

        let ctx = RunContext::default();
        let opts = reposcope_core::opts::CollectorOpts::default();
        let tally = blame_tally(&ctx, &repo, &files_by_dir, &opts).unwrap();
        let root = &tally["."];
        assert_eq!(root.len(), 1);
        assert!(root.contains_key("Test Author"));
        assert_eq!(root["Test Author"], 3);
    }
}
