//! The config-drift collector: env-template discovery, reference
//! extraction, and drift/dead-key/inconsistency classification wired into
//! a [`Collector`].

use std::fs;

use async_trait::async_trait;
use camino::Utf8Path;
use indexmap::IndexSet;
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::placeholder::is_placeholder;
use crate::references::{contains_literal_key, extract_references, is_well_known};
use crate::templates::{declared_key_index, discover_templates};

pub struct ConfDriftCollector;

impl CollectorCore for ConfDriftCollector {
    fn name() -> &'static str {
        "config-drift"
    }
}

#[async_trait]
impl Collector for ConfDriftCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let matcher = reposcope_core::walk::PatternMatcher::new(opts).map_err(CollectorError::Other)?;
        let files = reposcope_core::walk::walk_files(repo_path, &matcher);

        if ctx.cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let templates = discover_templates(&files, repo_path, |path| fs::read_to_string(path.as_std_path()));

        let mut referenced_keys: IndexSet<String> = IndexSet::new();
        let mut source_contents: Vec<(String, String)> = Vec::new();

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
            for key in extract_references(Utf8Path::new(relative.as_str()), &contents) {
                referenced_keys.insert(key);
            }
            source_contents.push((relative.as_str().to_string(), contents));
        }

        let declared = declared_key_index(&templates);

        let mut signals = Vec::new();

        let mut drift_keys: Vec<&String> = referenced_keys
            .iter()
            .filter(|key| !declared.contains_key(key.as_str()) && !is_well_known(key))
            .collect();
        drift_keys.sort();
        for key in drift_keys {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let signal = reposcope_core::RawSignal::builder("config-drift", "env-var-drift")
                .file_path(".env.example".to_string())
                .title(format!("`{key}` is referenced in code but not declared in any env template"))
                .description(format!("No `.env.example`/`.env.template`/`.env.sample` file declares `{key}`."))
                .confidence(0.5)
                .tag(key.clone())
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let mut dead_keys: Vec<&String> = declared
            .keys()
            .filter(|key| !source_contents.iter().any(|(_, contents)| contains_literal_key(contents, key)))
            .collect();
        dead_keys.sort();
        for key in dead_keys {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let declaring_paths: Vec<String> = declared[key.as_str()].iter().map(|(path, _)| path.as_str().to_string()).collect();
            let signal = reposcope_core::RawSignal::builder("config-drift", "dead-config-key")
                .file_path(declaring_paths.first().cloned().unwrap_or_default())
                .title(format!("`{key}` is declared but never referenced in source"))
                .description(format!(
                    "`{key}` is declared in {} but no source file contains the literal string.",
                    declaring_paths.join(", ")
                ))
                .confidence(0.4)
                .tag(key.clone())
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let mut inconsistent_keys: Vec<(&String, Vec<&(camino::Utf8PathBuf, String)>)> = declared
            .iter()
            .filter_map(|(key, occurrences)| {
                let non_placeholder: Vec<_> = occurrences.iter().filter(|(_, value)| !is_placeholder(value)).collect();
                let distinct_values: IndexSet<&str> = non_placeholder.iter().map(|(_, value)| value.as_str()).collect();
                if distinct_values.len() >= 2 { Some((key, non_placeholder)) } else { None }
            })
            .collect();
        inconsistent_keys.sort_by(|a, b| a.0.cmp(b.0));
        for (key, occurrences) in inconsistent_keys {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }
            let mut paths: Vec<String> = occurrences.iter().map(|(path, _)| path.as_str().to_string()).collect();
            paths.sort();
            let signal = reposcope_core::RawSignal::builder("config-drift", "inconsistent-defaults")
                .file_path(paths.first().cloned().unwrap_or_default())
                .title(format!("`{key}` has differing default values across env templates"))
                .description(format!("`{key}` differs across: {}.", paths.join(", ")))
                .confidence(0.3)
                .tag(key.clone())
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let metrics = serde_json::json!({
            "templates_found": templates.len(),
            "declared_keys": declared.len(),
            "referenced_keys": referenced_keys.len(),
            "drift_signals": signals.iter().filter(|s| s.kind == "env-var-drift").count(),
            "dead_key_signals": signals.iter().filter(|s| s.kind == "dead-config-key").count(),
            "inconsistent_default_signals": signals.iter().filter(|s| s.kind == "inconsistent-defaults").count(),
        });

        Ok(CollectOutput::new(reposcope_core::finalize_signals(signals, opts)).with_metrics(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flags_drift_dead_and_inconsistent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();

        fs::write(root.join(".env.example"), "API_KEY=changeme\nOBSOLETE_FLAG=1\nREGION=us-east-1\n").unwrap();
        fs::write(root.join(".env.sample"), "REGION=eu-west-1\n").unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.go"), "k := os.Getenv(\"API_KEY\")\nd := os.Getenv(\"DATABASE_URL\")\n").unwrap();

        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        let output = ConfDriftCollector.collect(&ctx, root, &opts).await.unwrap();

        assert!(output.signals.iter().any(|s| s.kind == "env-var-drift" && s.tags.contains(&"DATABASE_URL".to_string())));
        assert!(output.signals.iter().any(|s| s.kind == "dead-config-key" && s.tags.contains(&"OBSOLETE_FLAG".to_string())));
        assert!(output.signals.iter().any(|s| s.kind == "inconsistent-defaults" && s.tags.contains(&"REGION".to_string())));
        assert!(!output.signals.iter().any(|s| s.tags.contains(&"API_KEY".to_string()) && s.kind == "env-var-drift"));
    }

    #[tokio::test]
    async fn no_templates_still_flags_drift() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.go"), "k := os.Getenv(\"API_KEY\")\n").unwrap();

        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        let output = ConfDriftCollector.collect(&ctx, root, &opts).await.unwrap();
        assert!(output.signals.iter().all(|s| s.kind == "env-var-drift"));
        assert!(output.signals.iter().any(|s| s.tags.contains(&"API_KEY".to_string())));
    }

    #[tokio::test]
    async fn well_known_keys_never_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.go"), "k := os.Getenv(\"GITHUB_TOKEN\")\n").unwrap();

        let ctx = RunContext::default();
        let opts = CollectorOpts::default();
        let output = ConfDriftCollector.collect(&ctx, root, &opts).await.unwrap();
        assert!(output.signals.is_empty());
    }
}
