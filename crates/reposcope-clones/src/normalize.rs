//! Type-1 and Type-2 line normalization.
//!
//! Type 1 strips blank lines, leading/trailing whitespace, single-line
//! comments, and import-like statements, retaining other content verbatim.
//! Type 2 additionally replaces every non-keyword identifier token with
//! `$`, so that renamed-but-otherwise-identical blocks still hash equal.

use std::sync::LazyLock;

use regex::Regex;

/// Language-agnostic union of control-flow, declaration, modifier, and
/// literal keywords across the languages this workspace scans. Deliberately
/// over-inclusive: a keyword wrongly preserved just means a clone group
/// requires slightly more token overlap to match, never a false positive
/// from token collapse.
const KEYWORDS: &[&str] = &[
    // control flow
    "if", "else", "elif", "for", "while", "do", "switch", "case", "default", "break", "continue", "return", "yield",
    "throw", "throws", "try", "catch", "finally", "match", "when", "unless", "until", "loop", "goto",
    // declarations
    "func", "fn", "function", "def", "class", "struct", "enum", "interface", "trait", "impl", "module", "namespace",
    "package", "import", "use", "require", "include", "from", "export", "extends", "implements", "type", "var", "let",
    "const", "val",
    // modifiers
    "public", "private", "protected", "internal", "static", "final", "abstract", "virtual", "override", "async",
    "await", "pub", "mut", "ref", "readonly", "sealed", "open", "unsafe",
    // literals / misc keywords
    "true", "false", "null", "nil", "none", "self", "this", "super", "new", "delete", "void", "int", "string", "bool",
    "float", "double", "long", "char", "byte", "and", "or", "not", "in", "is", "as", "with", "lambda", "where",
];

static SINGLE_LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(//|#).*$").unwrap());
static IMPORT_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(import|from\s+\S+\s+import|require|use|include|package|namespace|#include)\b").unwrap()
});
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Type-1 normalization: strip comments and import-like lines, drop blank
/// lines, trim whitespace. Returns one normalized line per retained source
/// line, paired with its 1-based original line number.
pub fn normalize_type1(contents: &str) -> Vec<(u32, String)> {
    let mut out = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        if IMPORT_LIKE.is_match(raw_line) {
            continue;
        }
        let stripped = strip_line_comment(raw_line);
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push((idx as u32 + 1, collapse_whitespace(trimmed)));
    }
    out
}

/// Type-2 normalization: Type 1, then every non-keyword identifier token
/// becomes `$`.
pub fn normalize_type2(contents: &str) -> Vec<(u32, String)> {
    normalize_type1(contents)
        .into_iter()
        .map(|(line, text)| (line, mask_identifiers(&text)))
        .collect()
}

fn strip_line_comment(line: &str) -> &str {
    // A conservative strip: only trims from the first comment marker that
    // isn't inside a string literal. This is a best-effort textual pass,
    // not a real parser, so the occasional false strip inside a string
    // literal is accepted.
    match SINGLE_LINE_COMMENT.find(line) {
        Some(m) => &line[..m.start()],
        None => line,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn mask_identifiers(line: &str) -> String {
    IDENTIFIER
        .replace_all(line, |caps: &regex::Captures| {
            let word = &caps[0];
            if KEYWORDS.contains(&word) { word.to_string() } else { "$".to_string() }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type1_drops_blank_lines_and_comments() {
        let lines = normalize_type1("a = 1\n\n// a comment\nb = 2\n");
        assert_eq!(lines, vec![(1, "a = 1".to_string()), (4, "b = 2".to_string())]);
    }

    #[test]
    fn type1_drops_import_lines() {
        let lines = normalize_type1("import foo\nx = 1\n");
        assert_eq!(lines, vec![(2, "x = 1".to_string())]);
    }

    #[test]
    fn type2_masks_non_keyword_identifiers() {
        let lines = normalize_type2("func doThing(value int) {\n\treturn value\n}\n");
        assert_eq!(lines[0].1, "func $($ int) {");
        assert_eq!(lines[1].1, "return $");
    }

    #[test]
    fn type2_preserves_keywords_across_renames() {
        let a = normalize_type2("func alpha(x int) {\n\treturn x\n}\n");
        let b = normalize_type2("func beta(y int) {\n\treturn y\n}\n");
        let a_text: Vec<&str> = a.iter().map(|(_, t)| t.as_str()).collect();
        let b_text: Vec<&str> = b.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(a_text, b_text);
    }
}
