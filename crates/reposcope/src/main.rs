use std::io::stdout;
use std::process::ExitCode;

use anstream::{eprintln, stream::IsTerminal};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::InfoLevel;
use reposcope_core::collector::CollectorCore;
use reposcope_core::context::RunContext;
use reposcope_core::duration::parse_duration;
use reposcope_core::opts::{Anonymize, CollectorOpts};
use reposcope_core::pipeline::Pipeline;
use reposcope_core::registry::CollectorRegistry;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

mod config;
mod sink;

use config::Config;
use sink::{JsonLinesSink, PlainSink, Sink};

/// Scans a repository for architectural, ownership, and dependency-health
/// signals across several independent collectors.
#[derive(Parser)]
#[command(about, version)]
struct App {
    /// The repository root to scan. Defaults to the current directory.
    #[arg(default_value = ".")]
    repo_path: Utf8PathBuf,

    /// The output format to emit.
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Signals below this confidence are omitted.
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Glob patterns (repeatable) restricting which paths are scanned.
    #[arg(long = "include")]
    include_patterns: Vec<String>,

    /// Glob patterns (repeatable) excluding paths from scanning.
    #[arg(long = "exclude")]
    exclude_patterns: Vec<String>,

    /// How far back a commit walk may look, e.g. `"90d"`.
    #[arg(long)]
    git_since: Option<String>,

    /// The maximum number of commits a commit walk may visit.
    #[arg(long)]
    git_depth: Option<usize>,

    /// Include closed issues and merged/closed pull requests.
    #[arg(long)]
    include_closed: bool,

    /// How far back closed issues/PRs are still considered, e.g. `"180d"`.
    #[arg(long)]
    history_depth: Option<String>,

    /// The staleness cutoff for dependency push-activity checks, e.g. `"180d"`.
    #[arg(long)]
    staleness_threshold: Option<String>,

    /// The maximum number of issues/PRs a GitHub collector will return.
    #[arg(long, default_value_t = 100)]
    max_issues: usize,

    /// Author-anonymization policy.
    #[arg(long, value_enum, default_value_t)]
    anonymize: CliAnonymize,

    /// Include `examples/`, `example/`, `demo/`, `samples/` paths in
    /// lottery-risk output.
    #[arg(long)]
    include_demo_paths: bool,

    /// The configuration file to load.
    #[arg(short, long, default_value = ".reposcope.yml")]
    config: Utf8PathBuf,

    /// Don't show progress bars, even if the terminal supports them.
    #[arg(long)]
    no_progress: bool,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<InfoLevel>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum CliAnonymize {
    Always,
    Never,
    #[default]
    Auto,
}

impl From<CliAnonymize> for Anonymize {
    fn from(value: CliAnonymize) -> Self {
        match value {
            CliAnonymize::Always => Anonymize::Always,
            CliAnonymize::Never => Anonymize::Never,
            CliAnonymize::Auto => Anonymize::Auto,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();

    let indicatif_layer = IndicatifLayer::new();
    let filter = EnvFilter::builder()
        .with_default_directive(app.verbose.tracing_level_filter().into())
        .from_env()
        .expect("failed to parse RUST_LOG");

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(indicatif_layer.get_stderr_writer()),
        )
        .with(indicatif_layer)
        .init();

    match run(app).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("reposcope: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(app: App) -> anyhow::Result<ExitCode> {
    let config = Config::load(&app.config)?;
    let opts = build_opts(&app, config)?;

    let ctx = RunContext::default();
    let ctx_for_signal = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctx_for_signal.cancel();
        }
    });

    let mut registry = CollectorRegistry::new();
    registry.register(
        reposcope_coupling::CouplingCollector::name(),
        Box::new(reposcope_coupling::CouplingCollector),
    );
    registry.register(
        reposcope_deadcode::DeadCodeCollector::name(),
        Box::new(reposcope_deadcode::DeadCodeCollector),
    );
    registry.register(reposcope_clones::CloneCollector::name(), Box::new(reposcope_clones::CloneCollector));
    registry.register(
        reposcope_ownership::OwnershipCollector::name(),
        Box::new(reposcope_ownership::OwnershipCollector),
    );
    registry.register(reposcope_gitlog::GitLogCollector::name(), Box::new(reposcope_gitlog::GitLogCollector));
    registry.register(
        reposcope_confdrift::ConfDriftCollector::name(),
        Box::new(reposcope_confdrift::ConfDriftCollector),
    );
    registry.register(
        reposcope_dephealth::DepHealthCollector::name(),
        Box::new(reposcope_dephealth::DepHealthCollector),
    );
    registry.register(reposcope_github::GitHubCollector::name(), Box::new(reposcope_github::GitHubCollector));

    let pipeline = Pipeline::new(&registry);
    let report = pipeline.run(&ctx, &app.repo_path, &opts).await?;

    for (name, err) in report.failed() {
        tracing::warn!(collector = name, error = %err, "collector did not complete");
    }

    let stdout = stdout();
    let mut handle = stdout.lock();
    match app.format {
        OutputFormat::Json => JsonLinesSink.emit(&report.signals, &mut handle)?,
        OutputFormat::Plain => {
            let color = !app.no_progress && std::io::stdout().is_terminal();
            PlainSink { color }.emit(&report.signals, &mut handle)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_opts(app: &App, config: Option<Config>) -> anyhow::Result<CollectorOpts> {
    let config = config.unwrap_or_default();

    let min_confidence = app.min_confidence.or(config.min_confidence).unwrap_or(0.0);
    let include_patterns = if app.include_patterns.is_empty() {
        config.include_patterns
    } else {
        app.include_patterns.clone()
    };
    let exclude_patterns = if app.exclude_patterns.is_empty() {
        config.exclude_patterns
    } else {
        app.exclude_patterns.clone()
    };
    let git_since = app
        .git_since
        .as_deref()
        .or(config.git_since.as_deref())
        .map(parse_duration)
        .transpose()?;
    let git_depth = app.git_depth.or(config.git_depth);
    let include_closed = app.include_closed || config.include_closed.unwrap_or(false);
    let history_depth = app
        .history_depth
        .as_deref()
        .or(config.history_depth.as_deref())
        .map(parse_duration)
        .transpose()?;
    let staleness_threshold = app
        .staleness_threshold
        .as_deref()
        .or(config.staleness_threshold.as_deref())
        .map(parse_duration)
        .transpose()?;
    let max_issues = if app.max_issues != 100 { app.max_issues } else { config.max_issues.unwrap_or(100) };
    let anonymize = config
        .anonymize
        .as_deref()
        .map(Anonymize::from_str_loose)
        .unwrap_or_else(|| app.anonymize.into());
    let include_demo_paths = app.include_demo_paths || config.include_demo_paths.unwrap_or(false);

    Ok(CollectorOpts {
        min_confidence,
        include_patterns,
        exclude_patterns,
        git_root: None,
        git_since,
        git_depth,
        include_closed,
        history_depth,
        staleness_threshold,
        max_issues,
        anonymize,
        include_demo_paths,
        progress: None,
        ..CollectorOpts::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let app = App::parse_from(["reposcope", "--min-confidence", "0.7"]);
        let config = Config {
            min_confidence: Some(0.2),
            ..Default::default()
        };
        let opts = build_opts(&app, Some(config)).unwrap();
        assert_eq!(opts.min_confidence, 0.7);
    }

    #[test]
    fn config_fills_in_absent_cli_flags() {
        let app = App::parse_from(["reposcope"]);
        let config = Config {
            min_confidence: Some(0.35),
            ..Default::default()
        };
        let opts = build_opts(&app, Some(config)).unwrap();
        assert_eq!(opts.min_confidence, 0.35);
    }
}
