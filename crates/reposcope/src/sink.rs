//! Output sinks: one JSON-lines record per signal, or a colorized
//! human-readable listing.

use std::io::Write;

use owo_colors::OwoColorize;
use reposcope_core::RawSignal;

/// Where a run's signals end up.
pub trait Sink {
    fn emit(&self, signals: &[RawSignal], out: &mut dyn Write) -> anyhow::Result<()>;
}

/// One JSON object per line, machine-readable.
pub struct JsonLinesSink;

impl Sink for JsonLinesSink {
    fn emit(&self, signals: &[RawSignal], out: &mut dyn Write) -> anyhow::Result<()> {
        for signal in signals {
            serde_json::to_writer(&mut *out, signal)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

/// A short colorized summary line per signal, grouped by confidence.
pub struct PlainSink {
    pub color: bool,
}

impl Sink for PlainSink {
    fn emit(&self, signals: &[RawSignal], out: &mut dyn Write) -> anyhow::Result<()> {
        for signal in signals {
            let location = if signal.line > 0 {
                format!("{}:{}", signal.file_path, signal.line)
            } else {
                signal.file_path.clone()
            };

            if self.color {
                writeln!(
                    out,
                    "{} {} {} {}",
                    confidence_badge(signal.confidence).bold(),
                    signal.kind.cyan(),
                    location.dimmed(),
                    signal.title
                )?;
            } else {
                writeln!(out, "{} {} {} {}", confidence_label(signal.confidence), signal.kind, location, signal.title)?;
            }
        }
        if signals.is_empty() {
            writeln!(out, "no signals found")?;
        }
        Ok(())
    }
}

fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "high"
    } else if confidence >= 0.5 {
        "medium"
    } else {
        "low"
    }
}

fn confidence_badge(confidence: f64) -> String {
    format!("[{}]", confidence_label(confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(kind: &str, confidence: f64) -> RawSignal {
        RawSignal::builder("test", kind)
            .file_path("a.rs")
            .line(3)
            .title("something")
            .confidence(confidence)
            .build()
            .unwrap()
    }

    #[test]
    fn plain_sink_renders_without_color() {
        let sink = PlainSink { color: false };
        let mut buf = Vec::new();
        sink.emit(&[signal("circular-dependency", 0.9)], &mut buf).unwrap();
        let rendered = String::from_utf8(buf).unwrap();
        assert!(rendered.contains("high"));
        assert!(rendered.contains("a.rs:3"));
    }

    #[test]
    fn json_lines_sink_emits_one_line_per_signal() {
        let sink = JsonLinesSink;
        let mut buf = Vec::new();
        sink.emit(&[signal("a", 0.1), signal("b", 0.2)], &mut buf).unwrap();
        let rendered = String::from_utf8(buf).unwrap();
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn empty_signals_says_so() {
        let sink = PlainSink { color: false };
        let mut buf = Vec::new();
        sink.emit(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), "no signals found");
    }
}
