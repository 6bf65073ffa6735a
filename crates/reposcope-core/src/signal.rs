//! The [`RawSignal`] data model and its builder.

use serde::{Deserialize, Serialize};

/// A single observation emitted by a collector.
///
/// See the collector contract in [`crate::collector`] for the invariants a
/// collector must uphold before returning a list of these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawSignal {
    /// The collector that produced this signal (e.g. `"coupling"`).
    pub source: String,
    /// The signal category, drawn from an open vocabulary (e.g.
    /// `"circular-dependency"`, `"unused-function"`).
    pub kind: String,
    /// Repo-relative path, or a synthetic path such as `github/issues/42`.
    pub file_path: String,
    /// 1-based line number; `0` when a line isn't meaningful.
    pub line: u32,
    /// One-line human summary.
    pub title: String,
    /// Multi-line detail.
    pub description: String,
    /// The person or account responsible for the observation, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// When the underlying event occurred, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    /// When the underlying event was closed, if it's a pre-closed historical
    /// event (e.g. a closed issue).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Ordered, free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RawSignal {
    /// Begin building a signal for `source`/`kind`.
    pub fn builder(source: impl Into<String>, kind: impl Into<String>) -> SignalBuilder {
        SignalBuilder::new(source, kind)
    }

    /// Whether this signal represents a pre-closed historical event.
    pub fn is_pre_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

/// Builder for [`RawSignal`]: required fields are supplied up front, optional
/// ones default,
/// and `.build()` validates the non-empty/finite invariants before handing
/// back a signal a collector can return.
pub struct SignalBuilder {
    source: String,
    kind: String,
    file_path: String,
    line: u32,
    title: String,
    description: String,
    author: Option<String>,
    timestamp: Option<chrono::DateTime<chrono::Utc>>,
    closed_at: Option<chrono::DateTime<chrono::Utc>>,
    confidence: f64,
    tags: Vec<String>,
}

impl SignalBuilder {
    pub fn new(source: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: kind.into(),
            file_path: String::new(),
            line: 0,
            title: String::new(),
            description: String::new(),
            author: None,
            timestamp: None,
            closed_at: None,
            confidence: 0.0,
            tags: Vec::new(),
        }
    }

    pub fn file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    pub fn line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn timestamp(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn closed_at(mut self, closed_at: chrono::DateTime<chrono::Utc>) -> Self {
        self.closed_at = Some(closed_at);
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Validate and construct the [`RawSignal`].
    ///
    /// # Errors
    ///
    /// Returns an error if `source`, `kind`, or `title` is empty, or if
    /// `confidence` is not finite. These are API-misuse errors: a well-formed
    /// collector should never trigger them.
    pub fn build(self) -> anyhow::Result<RawSignal> {
        if self.source.is_empty() {
            anyhow::bail!("signal is missing a non-empty `source`");
        }
        if self.kind.is_empty() {
            anyhow::bail!("signal is missing a non-empty `kind`");
        }
        if self.title.is_empty() {
            anyhow::bail!("signal is missing a non-empty `title`");
        }
        if !self.confidence.is_finite() {
            anyhow::bail!("signal confidence must be finite, got {}", self.confidence);
        }

        Ok(RawSignal {
            source: self.source,
            kind: self.kind,
            file_path: self.file_path,
            line: self.line,
            title: self.title,
            description: self.description,
            author: self.author,
            timestamp: self.timestamp,
            closed_at: self.closed_at,
            confidence: self.confidence,
            tags: self.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_title() {
        let err = RawSignal::builder("coupling", "circular-dependency")
            .file_path("pkga")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn build_rejects_nan_confidence() {
        let err = RawSignal::builder("coupling", "circular-dependency")
            .title("cycle")
            .confidence(f64::NAN)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn build_succeeds_with_required_fields() {
        let signal = RawSignal::builder("coupling", "circular-dependency")
            .file_path("pkga")
            .title("import cycle between pkga and pkgb")
            .confidence(0.8)
            .tag("cycle")
            .build()
            .unwrap();

        assert_eq!(signal.source, "coupling");
        assert_eq!(signal.confidence, 0.8);
        assert_eq!(signal.tags, vec!["cycle".to_string()]);
        assert!(!signal.is_pre_closed());
    }
}
