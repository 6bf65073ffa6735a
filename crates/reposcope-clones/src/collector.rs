//! The clone-detection collector: Type-1 and Type-2 passes, windowed
//! hashing, grouping, and per-location signal emission.

use std::fs;

use async_trait::async_trait;
use camino::Utf8Path;
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::grouping::{self, CloneGroup};
use crate::normalize::{normalize_type1, normalize_type2};
use crate::window::hash_windows;

pub struct CloneCollector;

impl CollectorCore for CloneCollector {
    fn name() -> &'static str {
        "clones"
    }
}

#[async_trait]
impl Collector for CloneCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let matcher = reposcope_core::walk::PatternMatcher::new(opts).map_err(CollectorError::Other)?;
        let files = reposcope_core::walk::walk_files(repo_path, &matcher);

        let mut type1_windows = Vec::new();
        let mut type2_windows = Vec::new();
        let mut files_scanned = 0usize;

        for relative in &files {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            if !reposcope_core::walk::has_source_extension(Utf8Path::new(relative.as_str())) {
                continue;
            }
            let Ok(contents) = fs::read_to_string(repo_path.join(relative.as_str())) else {
                continue;
            };
            files_scanned += 1;

            type1_windows.extend(hash_windows(relative.as_str(), &normalize_type1(&contents)));
            type2_windows.extend(hash_windows(relative.as_str(), &normalize_type2(&contents)));
        }

        if ctx.cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let type1_groups = grouping::merge_adjacent(grouping::bucket_into_groups(&type1_windows));
        let type2_groups_raw = grouping::merge_adjacent(grouping::bucket_into_groups(&type2_windows));
        let type2_groups = grouping::subtract_contained(&type1_groups, type2_groups_raw);

        let mut signals = Vec::new();
        for group in type1_groups.iter().chain(type2_groups.iter()) {
            for location in &group.locations {
                let confidence = clone_confidence(group);
                let participants: Vec<String> = group.locations.iter().map(|l| format!("{}:{}", l.path, l.start_line)).collect();
                let signal = reposcope_core::RawSignal::builder("clones", "duplicate-code")
                    .file_path(location.path.clone())
                    .line(location.start_line)
                    .title(format!(
                        "duplicated block ({} lines, {} locations)",
                        location.end_line - location.start_line + 1,
                        group.locations.len()
                    ))
                    .description(format!(
                        "Lines {}-{} of {} match normalized content also found at: {}.",
                        location.start_line,
                        location.end_line,
                        location.path,
                        participants.iter().filter(|p| !p.starts_with(&format!("{}:{}", location.path, location.start_line))).cloned().collect::<Vec<_>>().join(", ")
                    ))
                    .confidence(confidence)
                    .tags(participants)
                    .build()
                    .map_err(CollectorError::Other)?;
                signals.push(signal);
            }
        }

        let metrics = serde_json::json!({
            "files_scanned": files_scanned,
            "type1_groups": type1_groups.len(),
            "type2_groups": type2_groups.len(),
        });

        Ok(CollectOutput::new(signals).with_metrics(metrics))
    }
}

/// Confidence grows with block size and participant count, clamped to a
/// `[0.3, 0.9]` band; exact coefficients are a design decision recorded
/// in DESIGN.md.
fn clone_confidence(group: &CloneGroup) -> f64 {
    let participants = group.locations.len() as f64;
    let lines = f64::from(group.block_lines());
    let base = 0.3 + 0.05 * (participants - 2.0).max(0.0) + 0.01 * (lines - 6.0).max(0.0);
    base.clamp(0.3, 0.9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_grows_with_participants_and_size() {
        let two_small = CloneGroup {
            locations: vec![
                crate::grouping::CloneLocation {
                    path: "a.go".into(),
                    start_line: 1,
                    end_line: 6,
                },
                crate::grouping::CloneLocation {
                    path: "b.go".into(),
                    start_line: 1,
                    end_line: 6,
                },
            ],
        };
        let three_large = CloneGroup {
            locations: vec![
                crate::grouping::CloneLocation {
                    path: "a.go".into(),
                    start_line: 1,
                    end_line: 30,
                },
                crate::grouping::CloneLocation {
                    path: "b.go".into(),
                    start_line: 1,
                    end_line: 30,
                },
                crate::grouping::CloneLocation {
                    path: "c.go".into(),
                    start_line: 1,
                    end_line: 30,
                },
            ],
        };
        assert!(clone_confidence(&three_large) > clone_confidence(&two_small));
    }
}
