//! Scan-scoped author anonymization.
//!
//! The anonymizer is constructed fresh for each run, never shared across
//! runs, and maps a given real name to the same label for the lifetime of
//! one scan.

use std::collections::HashMap;

/// Assigns stable `Contributor A`, `Contributor B`, ... labels to author
/// names within a single scan.
#[derive(Default)]
pub struct Anonymizer {
    labels: HashMap<String, String>,
}

impl Anonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stable label for `name`, minting a new one on first use.
    pub fn anonymize(&mut self, name: &str) -> String {
        if let Some(label) = self.labels.get(name) {
            return label.clone();
        }
        let label = Self::label_for_index(self.labels.len());
        self.labels.insert(name.to_string(), label.clone());
        label
    }

    /// `0 -> A`, `25 -> Z`, `26 -> AA`, `27 -> AB`, ...
    fn label_for_index(mut index: usize) -> String {
        let mut letters = Vec::new();
        loop {
            let rem = index % 26;
            letters.push((b'A' + rem as u8) as char);
            if index < 26 {
                break;
            }
            index = index / 26 - 1;
        }
        letters.reverse();
        format!("Contributor {}", letters.into_iter().collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_within_scan() {
        let mut anon = Anonymizer::new();
        let a1 = anon.anonymize("Alice");
        let a2 = anon.anonymize("Alice");
        assert_eq!(a1, a2);
    }

    #[test]
    fn distinct_inputs_map_distinctly() {
        let mut anon = Anonymizer::new();
        let a = anon.anonymize("Alice");
        let b = anon.anonymize("Bob");
        assert_ne!(a, b);
    }

    #[test]
    fn wraps_past_26_contributors() {
        let mut anon = Anonymizer::new();
        for i in 0..26 {
            anon.anonymize(&format!("user-{i}"));
        }
        let label = anon.anonymize("user-26");
        assert_eq!(label, "Contributor AA");
    }
}
