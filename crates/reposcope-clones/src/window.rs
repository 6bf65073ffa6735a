//! Sliding-window hashing over normalized lines.

use crate::fnv::fnv64a;

/// Window size: 6 consecutive normalized lines per hashed window.
pub const WINDOW_SIZE: usize = 6;

/// One hashed window: the content hash, the file it came from, and the
/// 1-based line the window starts at in the *original* (pre-normalization)
/// file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHash {
    pub hash: u64,
    pub path: String,
    pub start_line: u32,
}

/// Slides a `WINDOW_SIZE`-line window over `normalized` (the output of
/// [`crate::normalize::normalize_type1`] or `_type2`), hashing each
/// window's joined text with FNV-64a.
pub fn hash_windows(path: &str, normalized: &[(u32, String)]) -> Vec<WindowHash> {
    if normalized.len() < WINDOW_SIZE {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(normalized.len() - WINDOW_SIZE + 1);
    for window in normalized.windows(WINDOW_SIZE) {
        let joined = window.iter().map(|(_, text)| text.as_str()).collect::<Vec<_>>().join("\n");
        out.push(WindowHash {
            hash: fnv64a(joined.as_bytes()),
            path: path.to_string(),
            start_line: window[0].0,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: u32) -> Vec<(u32, String)> {
        (1..=n).map(|i| (i, format!("line {i}"))).collect()
    }

    #[test]
    fn short_file_produces_no_windows() {
        assert!(hash_windows("a.go", &lines(3)).is_empty());
    }

    #[test]
    fn exact_window_size_produces_one_window() {
        let windows = hash_windows("a.go", &lines(6));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_line, 1);
    }

    #[test]
    fn longer_file_slides_by_one() {
        let windows = hash_windows("a.go", &lines(8));
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start_line, 1);
        assert_eq!(windows[2].start_line, 3);
    }

    #[test]
    fn identical_content_hashes_identically() {
        let a = hash_windows("a.go", &lines(6));
        let b = hash_windows("b.go", &lines(6));
        assert_eq!(a[0].hash, b[0].hash);
    }
}
