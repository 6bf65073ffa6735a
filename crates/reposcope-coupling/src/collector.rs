//! The coupling collector: wires the file walker, module identity table,
//! import resolution, and SCC analysis together into a [`Collector`].

use std::fs;

use async_trait::async_trait;
use camino::Utf8Path;
use indexmap::IndexSet;
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::graph::ImportGraph;
use crate::identity::module_identity;
use crate::imports::{go_module_prefix, resolve_file_imports};

const FAN_OUT_THRESHOLD: usize = 10;

pub struct CouplingCollector;

impl CollectorCore for CouplingCollector {
    fn name() -> &'static str {
        "coupling"
    }
}

#[async_trait]
impl Collector for CouplingCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let matcher = reposcope_core::walk::PatternMatcher::new(opts).map_err(CollectorError::Other)?;
        let files = reposcope_core::walk::walk_files(repo_path, &matcher);

        if ctx.cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let go_prefix = fs::read_to_string(repo_path.join("go.mod")).ok().and_then(|s| go_module_prefix(&s));

        let mut modules: IndexSet<String> = IndexSet::new();
        let mut file_for_module: Vec<(String, String)> = Vec::new();
        for relative in &files {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            if let Some(module) = module_identity(relative.as_str()) {
                modules.insert(module.clone());
                file_for_module.push((module, relative.as_str().to_string()));
            }
        }

        let mut edges = Vec::new();
        let mut files_scanned = 0usize;
        for relative in &files {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let Some(from_module) = module_identity(relative.as_str()) else {
                continue;
            };
            let Ok(contents) = fs::read_to_string(repo_path.join(relative.as_str())) else {
                continue;
            };
            files_scanned += 1;

            let targets = resolve_file_imports(relative.as_str(), &contents, &modules, go_prefix.as_deref());
            for target in targets {
                edges.push((from_module.clone(), target));
            }
        }

        let graph = ImportGraph::build(modules.iter().cloned(), edges);

        let mut signals = Vec::new();
        for component in graph.non_trivial_sccs() {
            let names: Vec<&str> = component.iter().map(|&id| graph.module_name(id)).collect();
            let confidence = cycle_confidence(names.len());
            let title = format!("import cycle among {}", names.join(", "));
            let description = format!(
                "Modules {} form a strongly-connected import cycle; none can be built or tested independently of the others.",
                names.join(" -> ")
            );
            let example_file = first_file_for_module(&file_for_module, names[0]).unwrap_or_else(|| names[0].to_string());
            let signal = reposcope_core::RawSignal::builder("coupling", "circular-dependency")
                .file_path(example_file)
                .title(title)
                .description(description)
                .confidence(confidence)
                .tags(names.iter().map(|n| n.to_string()))
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        for id in graph.iter_ids() {
            let fan_out = graph.fan_out(id);
            if fan_out < FAN_OUT_THRESHOLD {
                continue;
            }
            let module = graph.module_name(id);
            let confidence = fan_out_confidence(fan_out);
            let example_file = first_file_for_module(&file_for_module, module).unwrap_or_else(|| module.to_string());
            let signal = reposcope_core::RawSignal::builder("coupling", "high-coupling")
                .file_path(example_file)
                .title(format!("module {module} imports {fan_out} other in-repo modules"))
                .description(format!(
                    "{module} has {fan_out} distinct intra-repository import targets, well above the coupling threshold of {FAN_OUT_THRESHOLD}."
                ))
                .confidence(confidence)
                .tag(module.to_string())
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let metrics = serde_json::json!({
            "files_scanned": files_scanned,
            "modules_found": graph.node_count(),
            "cycle_count": signals.iter().filter(|s| s.kind == "circular-dependency").count(),
        });

        Ok(CollectOutput::new(signals).with_metrics(metrics))
    }
}

fn first_file_for_module(file_for_module: &[(String, String)], module: &str) -> Option<String> {
    file_for_module
        .iter()
        .filter(|(m, _)| m == module)
        .map(|(_, f)| f.clone())
        .min()
}

/// Cycle length -> confidence.
fn cycle_confidence(length: usize) -> f64 {
    match length {
        0 | 1 => 0.0,
        2 => 0.80,
        3 => 0.75,
        _ => 0.70,
    }
}

/// Fan-out count -> confidence: 0.40 at the threshold, +0.075 per
/// additional import, clamped to 0.70 at count >= 19.
fn fan_out_confidence(count: usize) -> f64 {
    if count < FAN_OUT_THRESHOLD {
        return 0.0;
    }
    let extra = (count - FAN_OUT_THRESHOLD) as f64;
    (0.40 + extra * 0.075).min(0.70)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_confidence_scale() {
        assert_eq!(cycle_confidence(2), 0.80);
        assert_eq!(cycle_confidence(3), 0.75);
        assert_eq!(cycle_confidence(4), 0.70);
        assert_eq!(cycle_confidence(10), 0.70);
    }

    #[test]
    fn fan_out_confidence_scale() {
        assert_eq!(fan_out_confidence(9), 0.0);
        assert_eq!(fan_out_confidence(10), 0.40);
        assert!((fan_out_confidence(11) - 0.475).abs() < 1e-9);
        assert_eq!(fan_out_confidence(19), 0.70);
        assert_eq!(fan_out_confidence(30), 0.70);
    }
}
