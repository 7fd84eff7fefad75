//! Case-insensitive wildcard patterns for textual filters.
//!
//! `*` matches any run of characters (including the empty run); a pattern
//! without `*` requires an exact, case-insensitive match. This is the
//! matcher behind the `pi`, `ship`, `region`, `cruise`, and variable
//! `append` parameters.

use serde::{Deserialize, Serialize};

/// A compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    lowered: String,
    wildcard: bool,
}

impl Pattern {
    /// Compiles a pattern; the text is lowercased once up front.
    pub fn compile(text: &str) -> Pattern {
        let lowered = text.trim().to_lowercase();
        let wildcard = lowered.contains('*');
        Pattern { lowered, wildcard }
    }

    /// True if the pattern contains a `*`.
    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    /// The lowercased pattern text.
    pub fn as_str(&self) -> &str {
        &self.lowered
    }

    /// Full match: the whole value must correspond to the pattern.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        if self.wildcard {
            glob_match(self.lowered.as_bytes(), value.as_bytes())
        } else {
            self.lowered == value
        }
    }

    /// Substring match: a non-wildcard pattern matches anywhere inside the
    /// value. Used for the free-text `measurement` filter.
    pub fn matches_within(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        if self.wildcard {
            glob_match(self.lowered.as_bytes(), value.as_bytes())
        } else {
            value.contains(&self.lowered)
        }
    }
}

/// An OR-list of patterns: a value matches if any member matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternList(Vec<Pattern>);

impl PatternList {
    /// Parses a comma-separated pattern list, skipping empty entries and
    /// duplicates.
    pub fn parse(text: &str) -> PatternList {
        let mut patterns: Vec<Pattern> = Vec::new();
        for part in text.split(',') {
            let pattern = Pattern::compile(part);
            if !pattern.as_str().is_empty() && !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
        PatternList(patterns)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.0
    }

    pub fn matches_any(&self, value: &str) -> bool {
        self.0.iter().any(|p| p.matches(value))
    }
}

/// Iterative glob match with single-star backtracking. Both inputs are
/// already lowercased.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == text[t] && pattern[p] != b'*' {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(s) = star {
            // Retry the segment after the last star one character later.
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
