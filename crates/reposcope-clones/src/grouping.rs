//! Bucketing hashed windows into clone groups, merging adjacent windows of
//! the same clone into a single larger block, and subtracting Type-2
//! groups that a Type-1 pass already reported.

use indexmap::IndexMap;

use crate::unionfind::UnionFind;
use crate::window::{WINDOW_SIZE, WindowHash};

/// One participating location in a clone group, with the line range the
/// group spans in that file after adjacent-window merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneLocation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// A set of >= 2 locations whose normalized contents produced identical
/// hash windows.
#[derive(Debug, Clone)]
pub struct CloneGroup {
    pub locations: Vec<CloneLocation>,
}

impl CloneGroup {
    /// Number of normalized lines the group's block spans (from the first
    /// location; all locations span the same length by construction).
    pub fn block_lines(&self) -> u32 {
        self.locations.first().map(|l| l.end_line - l.start_line + 1).unwrap_or(0)
    }

    fn path_key(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.locations.iter().map(|l| l.path.clone()).collect();
        paths.sort();
        paths
    }

    fn sorted_by_path(&self) -> Vec<CloneLocation> {
        let mut locs = self.locations.clone();
        locs.sort_by(|a, b| a.path.cmp(&b.path));
        locs
    }
}

/// Buckets hashed windows by hash, deduplicates locations within a bucket,
/// and keeps buckets with >= 2 distinct `(path, start_line)` locations.
pub fn bucket_into_groups(windows: &[WindowHash]) -> Vec<CloneGroup> {
    let mut buckets: IndexMap<u64, Vec<(String, u32)>> = IndexMap::new();
    for w in windows {
        let entry = buckets.entry(w.hash).or_default();
        let key = (w.path.clone(), w.start_line);
        if !entry.contains(&key) {
            entry.push(key);
        }
    }

    buckets
        .into_values()
        .filter(|locs| locs.len() >= 2)
        .map(|locs| CloneGroup {
            locations: locs
                .into_iter()
                .map(|(path, start_line)| CloneLocation {
                    path,
                    start_line,
                    end_line: start_line + WINDOW_SIZE as u32 - 1,
                })
                .collect(),
        })
        .collect()
}

/// Merges groups that represent consecutive windows of the same clone:
/// same participating file set, with every location's start line shifted
/// by the same constant offset in `1..=WINDOW_SIZE`.
pub fn merge_adjacent(groups: Vec<CloneGroup>) -> Vec<CloneGroup> {
    let mut by_key: IndexMap<Vec<String>, Vec<usize>> = IndexMap::new();
    for (i, g) in groups.iter().enumerate() {
        by_key.entry(g.path_key()).or_default().push(i);
    }

    let mut uf = UnionFind::new(groups.len());
    for indices in by_key.values() {
        for &i in indices {
            for &j in indices {
                if i >= j {
                    continue;
                }
                if let Some(shift) = consistent_shift(&groups[i], &groups[j])
                    && (1..=WINDOW_SIZE as i64).contains(&shift.abs())
                {
                    uf.union(i, j);
                }
            }
        }
    }

    let mut components: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for i in 0..groups.len() {
        components.entry(uf.find(i)).or_default().push(i);
    }

    components
        .into_values()
        .map(|members| merge_members(&groups, &members))
        .collect()
}

/// Returns the constant per-file line-number shift between `a` and `b` if
/// one exists (same file set, same offset applied to every location).
fn consistent_shift(a: &CloneGroup, b: &CloneGroup) -> Option<i64> {
    let a_sorted = a.sorted_by_path();
    let b_sorted = b.sorted_by_path();
    if a_sorted.len() != b_sorted.len() {
        return None;
    }
    let mut shift: Option<i64> = None;
    for (la, lb) in a_sorted.iter().zip(b_sorted.iter()) {
        if la.path != lb.path {
            return None;
        }
        let delta = i64::from(lb.start_line) - i64::from(la.start_line);
        match shift {
            None => shift = Some(delta),
            Some(s) if s == delta => {}
            Some(_) => return None,
        }
    }
    shift.filter(|s| *s != 0)
}

fn merge_members(groups: &[CloneGroup], members: &[usize]) -> CloneGroup {
    if members.len() == 1 {
        return groups[members[0]].clone();
    }

    let mut by_path: IndexMap<String, (u32, u32)> = IndexMap::new();
    for &idx in members {
        for loc in &groups[idx].locations {
            by_path
                .entry(loc.path.clone())
                .and_modify(|(start, end)| {
                    *start = (*start).min(loc.start_line);
                    *end = (*end).max(loc.end_line);
                })
                .or_insert((loc.start_line, loc.end_line));
        }
    }

    CloneGroup {
        locations: by_path
            .into_iter()
            .map(|(path, (start_line, end_line))| CloneLocation { path, start_line, end_line })
            .collect(),
    }
}

/// Removes groups from `candidates` (a Type-2-only pass) that are fully
/// contained — same or subset file set, line range inside — within some
/// group already reported by `baseline` (a Type-1 pass).
pub fn subtract_contained(baseline: &[CloneGroup], candidates: Vec<CloneGroup>) -> Vec<CloneGroup> {
    candidates.into_iter().filter(|c| !is_contained_in_any(c, baseline)).collect()
}

fn is_contained_in_any(candidate: &CloneGroup, baseline: &[CloneGroup]) -> bool {
    baseline.iter().any(|base| is_contained(candidate, base))
}

fn is_contained(candidate: &CloneGroup, base: &CloneGroup) -> bool {
    candidate.locations.iter().all(|cl| {
        base.locations
            .iter()
            .any(|bl| bl.path == cl.path && bl.start_line <= cl.start_line && bl.end_line >= cl.end_line)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::hash_windows;

    fn loc(path: &str, start: u32, end: u32) -> CloneLocation {
        CloneLocation {
            path: path.to_string(),
            start_line: start,
            end_line: end,
        }
    }

    #[test]
    fn buckets_require_two_distinct_locations() {
        let a = (1..=6).map(|i| (i, format!("l{i}"))).collect::<Vec<_>>();
        let windows = hash_windows("a.go", &a);
        let groups = bucket_into_groups(&windows);
        assert!(groups.is_empty(), "a single file's windows shouldn't self-group");
    }

    #[test]
    fn duplicated_file_forms_one_group() {
        let lines = (1..=6).map(|i| (i, format!("l{i}"))).collect::<Vec<_>>();
        let mut windows = hash_windows("a.go", &lines);
        windows.extend(hash_windows("b.go", &lines));
        let groups = bucket_into_groups(&windows);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].locations.len(), 2);
    }

    #[test]
    fn adjacent_windows_merge_into_larger_block() {
        let groups = vec![
            CloneGroup {
                locations: vec![loc("a.go", 1, 6), loc("b.go", 10, 15)],
            },
            CloneGroup {
                locations: vec![loc("a.go", 2, 7), loc("b.go", 11, 16)],
            },
        ];
        let merged = merge_adjacent(groups);
        assert_eq!(merged.len(), 1);
        let a_loc = merged[0].locations.iter().find(|l| l.path == "a.go").unwrap();
        assert_eq!((a_loc.start_line, a_loc.end_line), (1, 7));
    }

    #[test]
    fn non_adjacent_groups_stay_separate() {
        let groups = vec![
            CloneGroup {
                locations: vec![loc("a.go", 1, 6), loc("b.go", 10, 15)],
            },
            CloneGroup {
                locations: vec![loc("a.go", 50, 55), loc("b.go", 60, 65)],
            },
        ];
        let merged = merge_adjacent(groups);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn contained_type2_group_is_subtracted() {
        let baseline = vec![CloneGroup {
            locations: vec![loc("a.go", 1, 20), loc("b.go", 1, 20)],
        }];
        let candidates = vec![CloneGroup {
            locations: vec![loc("a.go", 5, 10), loc("b.go", 5, 10)],
        }];
        assert!(subtract_contained(&baseline, candidates).is_empty());
    }

    #[test]
    fn non_contained_type2_group_survives() {
        let baseline = vec![CloneGroup {
            locations: vec![loc("a.go", 1, 6), loc("b.go", 1, 6)],
        }];
        let candidates = vec![CloneGroup {
            locations: vec![loc("a.go", 100, 106), loc("c.go", 1, 6)],
        }];
        assert_eq!(subtract_contained(&baseline, candidates).len(), 1);
    }
}
