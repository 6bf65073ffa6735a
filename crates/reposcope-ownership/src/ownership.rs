//! Combining blame lines and commit weight into an ownership fraction per
//! author, and deriving the lottery-risk number from it.

use indexmap::IndexMap;

/// The blame-share and commit-weight fractions are weighted so they sum to 1.
/// Their relative weight isn't pinned elsewhere; an even split is used here
/// (see DESIGN.md).
const BLAME_WEIGHT: f64 = 0.5;
const COMMIT_WEIGHT: f64 = 0.5;

/// One author's computed share of a directory's ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorOwnership {
    pub author: String,
    pub fraction: f64,
}

/// Computes `ownership(author, dir)` for every author touching `dir`,
/// combining their share of blame lines and their share of commit weight.
/// Authors present in only one of the two inputs still get a fraction
/// (their missing half contributes 0).
pub fn ownership_fractions(blame: &IndexMap<String, u32>, commit_weight: &IndexMap<String, f64>) -> Vec<AuthorOwnership> {
    let total_blame: u32 = blame.values().sum();
    let total_commit_weight: f64 = commit_weight.values().sum();

    let mut authors: Vec<String> = blame.keys().chain(commit_weight.keys()).cloned().collect();
    authors.sort();
    authors.dedup();

    let mut out: Vec<AuthorOwnership> = authors
        .into_iter()
        .map(|author| {
            let blame_frac = if total_blame == 0 {
                0.0
            } else {
                f64::from(*blame.get(&author).unwrap_or(&0)) / f64::from(total_blame)
            };
            let commit_frac = if total_commit_weight == 0.0 {
                0.0
            } else {
                commit_weight.get(&author).copied().unwrap_or(0.0) / total_commit_weight
            };
            let fraction = BLAME_WEIGHT * blame_frac + COMMIT_WEIGHT * commit_frac;
            AuthorOwnership { author, fraction }
        })
        .collect();

    // Descending by fraction, ties broken by name ascending.
    out.sort_by(|a, b| b.fraction.partial_cmp(&a.fraction).unwrap().then(a.author.cmp(&b.author)));
    out
}

/// The lottery-risk number: the smallest prefix of authors (sorted
/// descending by ownership) whose cumulative ownership strictly exceeds
/// 0.5. An empty author set has risk 0.
pub fn lottery_risk(ranked: &[AuthorOwnership]) -> usize {
    let mut cumulative = 0.0;
    for (i, author) in ranked.iter().enumerate() {
        cumulative += author.fraction;
        if cumulative > 0.5 {
            return i + 1;
        }
    }
    0
}

/// Confidence for a directory's lottery-risk signal.
pub fn risk_confidence(risk: usize) -> f64 {
    match risk {
        0 => 0.0,
        1 => 0.80,
        2 => 0.50,
        _ => 0.30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn blame_map(pairs: &[(&str, u32)]) -> IndexMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn single_author_has_risk_one() {
        let ranked = ownership_fractions(&blame_map(&[("Alice", 100)]), &map(&[("Alice", 10.0)]));
        assert_eq!(lottery_risk(&ranked), 1);
        assert_eq!(risk_confidence(1), 0.80);
    }

    #[test]
    fn two_equal_authors_have_risk_two() {
        let ranked = ownership_fractions(&blame_map(&[("Alice", 50), ("Bob", 50)]), &map(&[("Alice", 5.0), ("Bob", 5.0)]));
        assert_eq!(lottery_risk(&ranked), 2);
    }

    #[test]
    fn empty_author_set_has_risk_zero() {
        let ranked = ownership_fractions(&IndexMap::new(), &IndexMap::new());
        assert_eq!(lottery_risk(&ranked), 0);
    }

    #[test]
    fn ties_break_by_name() {
        let ranked = ownership_fractions(&blame_map(&[("Zed", 50), ("Amy", 50)]), &IndexMap::new());
        assert_eq!(ranked[0].author, "Amy");
    }
}
