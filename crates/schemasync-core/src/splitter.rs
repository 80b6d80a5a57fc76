//! Statement splitting for whole dump files.
//!
//! A dump is a sequence of statements separated by an active delimiter
//! token, which a `DELIMITER` directive can redefine mid-file (typically
//! around procedure and trigger bodies that contain internal semicolons).
//! The splitter walks the input once and yields each complete statement
//! with its terminator stripped.

use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::DdlNormalizer;

static DELIMITER_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*DELIMITER\s+(\S+)").unwrap());

// Word-boundary matched so identifiers containing the substrings
// (begin_date, weekend) do not move the nesting depth.
static BEGIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bBEGIN\b").unwrap());
static END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bEND\b").unwrap());

const DEFAULT_DELIMITER: &str = ";";

/// Single forward pass over dump text, yielding one statement at a time.
///
/// An unterminated trailing buffer at end of input is silently discarded:
/// dump files may be truncated, and an incomplete tail is treated as
/// garbage rather than an error.
pub struct StatementSplitter {
    lines: std::vec::IntoIter<String>,
    delimiter: String,
    depth: i32,
    buffer: String,
}

impl StatementSplitter {
    /// Creates a splitter over `dump`. Ordinary comments are removed and
    /// version-guarded comments unwrapped up front, so conditionally
    /// executed statements are still discovered.
    #[must_use]
    pub fn new(dump: &str, normalizer: &dyn DdlNormalizer) -> Self {
        let cleaned = normalizer.strip_comments(dump);
        Self {
            lines: cleaned
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
                .into_iter(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            depth: 0,
            buffer: String::new(),
        }
    }

    /// A statement is complete when the buffer ends with the active
    /// delimiter and, for the default `;`, no `BEGIN...END` block is open.
    /// A custom delimiter always terminates; marking boundaries around
    /// internal semicolons is exactly what it exists for.
    fn take_complete(&mut self) -> Option<String> {
        let trimmed = self.buffer.trim_end();
        if !trimmed.ends_with(&self.delimiter) {
            return None;
        }
        if self.delimiter == DEFAULT_DELIMITER && self.depth > 0 {
            return None;
        }

        let statement = trimmed[..trimmed.len() - self.delimiter.len()]
            .trim()
            .to_string();
        self.buffer.clear();
        // Reset depth too: malformed input must not desynchronize the
        // splitter for every statement that follows.
        self.depth = 0;
        Some(statement)
    }
}

impl Iterator for StatementSplitter {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.lines.next() {
            if let Some(directive) = DELIMITER_DIRECTIVE_RE.captures(&line) {
                self.delimiter = directive[1].to_string();
                continue;
            }

            if !self.buffer.is_empty() {
                self.buffer.push('\n');
            }
            self.buffer.push_str(&line);

            for _ in BEGIN_RE.find_iter(&line) {
                self.depth += 1;
            }
            for _ in END_RE.find_iter(&line) {
                self.depth -= 1;
            }

            if let Some(statement) = self.take_complete() {
                if statement.is_empty() {
                    continue;
                }
                return Some(statement);
            }
        }
        None
    }
}
