//! Review-concentration: attributing merged-PR reviews to the directories
//! their changed files touch, and flagging directories where one reviewer
//! dominates.

use indexmap::IndexMap;
use reposcope_core::context::RunContext;
use reposcope_core::github::Client;

/// One reviewer's tally of approvals/change-requests for a directory.
#[derive(Debug, Clone, Default)]
struct ReviewTally {
    by_reviewer: IndexMap<String, u32>,
    total: u32,
}

/// A directory where a single reviewer accounts for more than 70% of
/// approvals/change-requests, among directories with at least 3 total
/// reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentratedReviewer {
    pub directory: String,
    pub reviewer: String,
    pub fraction: f64,
    pub total_reviews: u32,
}

/// Fetches merged PRs, their reviews, and their changed files, and
/// attributes each review to the directory its PR's files touch. Directory
/// attribution here is coarse (each approving/requesting review counts
/// once per distinct directory the PR touched) since a single review
/// covers the whole PR, not individual files.
pub async fn concentrated_reviewers(
    client: &Client,
    ctx: &RunContext,
    owner: &str,
    repo: &str,
    max_prs: usize,
) -> Vec<ConcentratedReviewer> {
    let Ok(prs) = client.list_pull_requests(ctx, owner, repo, "closed", max_prs).await else {
        return Vec::new();
    };

    let mut tallies: IndexMap<String, ReviewTally> = IndexMap::new();

    for pr in prs.iter().filter(|p| p.is_merged()) {
        if ctx.cancelled() {
            break;
        }
        let Ok(files) = client.list_pull_request_files(ctx, owner, repo, pr.number, 200).await else {
            continue;
        };
        let Ok(reviews) = client.list_reviews(ctx, owner, repo, pr.number, 100).await else {
            continue;
        };

        let mut directories: Vec<String> = files.iter().map(|f| directory_of(&f.filename)).collect();
        directories.sort();
        directories.dedup();

        for review in reviews.iter().filter(|r| r.state == "APPROVED" || r.state == "CHANGES_REQUESTED") {
            let Some(reviewer) = review.user.as_ref().map(|u| u.login.clone()) else {
                continue;
            };
            for dir in &directories {
                let tally = tallies.entry(dir.clone()).or_default();
                *tally.by_reviewer.entry(reviewer.clone()).or_insert(0) += 1;
                tally.total += 1;
            }
        }
    }

    let mut out = Vec::new();
    for (dir, tally) in tallies {
        if tally.total < 3 {
            continue;
        }
        if let Some((reviewer, count)) = tally.by_reviewer.iter().max_by_key(|(_, c)| **c) {
            let fraction = f64::from(*count) / f64::from(tally.total);
            if fraction > 0.7 {
                out.push(ConcentratedReviewer {
                    directory: dir,
                    reviewer: reviewer.clone(),
                    fraction,
                    total_reviews: tally.total,
                });
            }
        }
    }
    out.sort_by(|a, b| a.directory.cmp(&b.directory));
    out
}

fn directory_of(file_path: &str) -> String {
    match file_path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_of_handles_root_files() {
        assert_eq!(directory_of("README.md"), ".");
        assert_eq!(directory_of("pkg/sub/a.go"), "pkg/sub");
    }
}
