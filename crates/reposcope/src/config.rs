//! The `.reposcope.yml` configuration file: every field optional, each one
//! overridable by the corresponding CLI flag.

use camino::Utf8Path;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("couldn't parse config file {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
    #[error("invalid duration in config: {0}")]
    Duration(#[from] anyhow::Error),
}

/// The on-disk shape of `.reposcope.yml`. Every field mirrors one of
/// [`reposcope_core::opts::CollectorOpts`]'s knobs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    pub git_since: Option<String>,
    pub git_depth: Option<usize>,
    pub include_closed: Option<bool>,
    pub history_depth: Option<String>,
    pub staleness_threshold: Option<String>,
    pub max_issues: Option<usize>,
    pub anonymize: Option<String>,
    pub include_demo_paths: Option<bool>,
}

impl Config {
    /// Loads `path` if it exists; returns `Ok(None)` when it doesn't,
    /// matching the "absent input, not an error" contract used elsewhere
    /// in this workspace.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>, ConfigError> {
        let contents = match std::fs::read_to_string(path.as_std_path()) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_string(),
                    source,
                });
            }
        };
        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_not_an_error() {
        let path = Utf8Path::new("/nonexistent/.reposcope.yml");
        assert!(Config::load(path).unwrap().is_none());
    }

    #[test]
    fn parses_a_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::try_from(dir.path().join(".reposcope.yml")).unwrap();
        std::fs::write(&path, "min-confidence: 0.5\ninclude-closed: true\n").unwrap();
        let config = Config::load(&path).unwrap().unwrap();
        assert_eq!(config.min_confidence, Some(0.5));
        assert_eq!(config.include_closed, Some(true));
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::try_from(dir.path().join(".reposcope.yml")).unwrap();
        std::fs::write(&path, "nonsense-key: true\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
