//! The dead-code collector: definition extraction, reference search, and
//! confidence classification wired into a [`Collector`].

use std::fs;

use async_trait::async_trait;
use camino::Utf8Path;
use reposcope_core::{CollectOutput, Collector, CollectorCore, CollectorError, CollectorOpts, RunContext};
use tracing::instrument;

use crate::references::{is_test_file, references_symbol};
use crate::symbols::{Language, SymbolDef, SymbolKind, extract_definitions, should_skip_symbol};

pub struct DeadCodeCollector;

impl CollectorCore for DeadCodeCollector {
    fn name() -> &'static str {
        "dead-code"
    }
}

#[async_trait]
impl Collector for DeadCodeCollector {
    #[instrument(skip(self, ctx, opts))]
    async fn collect(&self, ctx: &RunContext, repo_path: &Utf8Path, opts: &CollectorOpts) -> Result<CollectOutput, CollectorError> {
        let matcher = reposcope_core::walk::PatternMatcher::new(opts).map_err(CollectorError::Other)?;
        let files = reposcope_core::walk::walk_files(repo_path, &matcher);

        if ctx.cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let mut non_test_sources: Vec<(String, String)> = Vec::new();
        let mut test_sources: Vec<(String, String)> = Vec::new();
        let mut all_defs: Vec<SymbolDef> = Vec::new();

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

            let path_str = relative.as_str().to_string();
            if is_test_file(&path_str) {
                test_sources.push((path_str.clone(), contents.clone()));
            } else {
                non_test_sources.push((path_str.clone(), contents.clone()));
                all_defs.extend(
                    extract_definitions(&path_str, &contents)
                        .into_iter()
                        .filter(|d| !should_skip_symbol(&d.name)),
                );
            }
        }

        let mut signals = Vec::new();
        for def in &all_defs {
            if ctx.cancelled() {
                return Err(CollectorError::Cancelled);
            }

            let referenced_outside_own_file = non_test_sources
                .iter()
                .filter(|(path, _)| path != &def.file_path)
                .any(|(_, contents)| references_symbol(&def.name, contents));

            if referenced_outside_own_file {
                continue;
            }

            let referenced_in_tests = test_sources.iter().any(|(_, contents)| references_symbol(&def.name, contents));

            let (kind, confidence, tags): (&str, f64, Vec<String>) = if referenced_in_tests {
                ("unused-function", 0.3, vec!["test-only-reference".to_string()])
            } else {
                let kind_tag = match def.kind {
                    SymbolKind::Function => "unused-function",
                    SymbolKind::Type => "unused-type",
                };
                (kind_tag, definition_confidence(def), Vec::new())
            };

            let signal = reposcope_core::RawSignal::builder("dead-code", kind)
                .file_path(def.file_path.clone())
                .line(def.line)
                .title(format!("{} `{}` appears unused", symbol_noun(def.kind), def.name))
                .description(format!(
                    "No reference to `{}` was found outside {}{}.",
                    def.name,
                    def.file_path,
                    if referenced_in_tests { " (other than in test files)" } else { "" }
                ))
                .confidence(confidence)
                .tags(tags)
                .build()
                .map_err(CollectorError::Other)?;
            signals.push(signal);
        }

        let metrics = serde_json::json!({
            "files_scanned": non_test_sources.len() + test_sources.len(),
            "definitions_found": all_defs.len(),
            "dead_symbols": signals.len(),
        });

        Ok(CollectOutput::new(signals).with_metrics(metrics))
    }
}

fn symbol_noun(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Function => "function",
        SymbolKind::Type => "type",
    }
}

/// Confidence for a dead, non-test-referenced symbol, per the
/// per-language/visibility table.
fn definition_confidence(def: &SymbolDef) -> f64 {
    match def.language {
        Language::Go => {
            if !def.exported {
                0.7
            } else if def.file_path.contains("internal/") {
                0.6
            } else {
                0.3
            }
        }
        Language::Rust => {
            if def.exported {
                0.4
            } else {
                0.6
            }
        }
        _ => {
            if def.exported {
                0.4
            } else {
                0.6
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolDef;

    fn def(language: Language, exported: bool, file_path: &str) -> SymbolDef {
        SymbolDef {
            name: "x".to_string(),
            file_path: file_path.to_string(),
            line: 1,
            exported,
            kind: SymbolKind::Function,
            language,
        }
    }

    #[test]
    fn go_confidence_scale() {
        assert_eq!(definition_confidence(&def(Language::Go, false, "pkg/a.go")), 0.7);
        assert_eq!(definition_confidence(&def(Language::Go, true, "internal/pkg/a.go")), 0.6);
        assert_eq!(definition_confidence(&def(Language::Go, true, "pkg/a.go")), 0.3);
    }

    #[test]
    fn rust_confidence_scale() {
        assert_eq!(definition_confidence(&def(Language::Rust, true, "src/lib.rs")), 0.4);
        assert_eq!(definition_confidence(&def(Language::Rust, false, "src/lib.rs")), 0.6);
    }
}
