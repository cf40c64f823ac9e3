//! The four marker tokens and the per-file marker scan.
//!
//! Tokens are literal, case-sensitive strings matched by plain substring
//! search over a line's bytes. Nothing here is a regex, and lines need not
//! be UTF-8.

use serde::{Deserialize, Serialize};

use crate::content::{contains, find};
use crate::errors::MarkerError;

/// Default plain "in" marker.
pub const DEFAULT_IN: &str = "##edit-in##";
/// Default sentinel line.
pub const DEFAULT_OUT: &str = "##edit-out##";
/// Default selection start.
pub const DEFAULT_SEL_START: &str = "##edit-start##";
/// Default selection end.
pub const DEFAULT_SEL_END: &str = "##edit-end##";

// ---------------------------------------------------------------------------
// MarkerSet
// ---------------------------------------------------------------------------

/// The literal tokens recognised in edit-tree files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    /// Marks a single line as an intentional edit.
    #[serde(rename = "in")]
    pub edit_in: String,
    /// Sentinel: the whole line defers to the baseline.
    #[serde(rename = "out")]
    pub edit_out: String,
    /// First line of a multi-line edited block.
    pub sel_start: String,
    /// Last line of a multi-line edited block.
    pub sel_end: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            edit_in: DEFAULT_IN.into(),
            edit_out: DEFAULT_OUT.into(),
            sel_start: DEFAULT_SEL_START.into(),
            sel_end: DEFAULT_SEL_END.into(),
        }
    }
}

impl MarkerSet {
    /// Check that every token is non-empty and no token contains another.
    pub fn check(&self) -> Result<(), MarkerError> {
        let named = self.named();
        for (name, token) in named {
            if token.is_empty() {
                return Err(MarkerError::EmptyToken { name });
            }
        }
        for (i, (_, outer)) in named.iter().enumerate() {
            for (j, (_, inner)) in named.iter().enumerate() {
                if i != j && outer.contains(*inner) {
                    return Err(MarkerError::OverlappingTokens {
                        inner: inner.to_string(),
                        outer: outer.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// `true` if `line`, trimmed of spaces and tabs, is exactly the sentinel.
    pub fn is_sentinel_line<L: AsRef<[u8]>>(&self, line: L) -> bool {
        is_sentinel_line(line, &self.edit_out)
    }

    fn named(&self) -> [(&'static str, &str); 4] {
        [
            ("in", self.edit_in.as_str()),
            ("out", self.edit_out.as_str()),
            ("sel_start", self.sel_start.as_str()),
            ("sel_end", self.sel_end.as_str()),
        ]
    }
}

/// Trim horizontal whitespace only; line terminators are handled by the caller.
pub fn trim_horizontal(line: &[u8]) -> &[u8] {
    let is_blank = |b: &u8| *b == b' ' || *b == b'\t';
    let start = line.iter().position(|b| !is_blank(b)).unwrap_or(line.len());
    let end = line.iter().rposition(|b| !is_blank(b)).map_or(start, |i| i + 1);
    &line[start..end]
}

/// Literal sentinel predicate.
pub fn is_sentinel_line<L: AsRef<[u8]>>(line: L, sentinel: &str) -> bool {
    trim_horizontal(line.as_ref()) == sentinel.as_bytes()
}

/// Remove the first occurrence of `token` from `line`.
pub fn strip_token(line: &[u8], token: &str) -> Vec<u8> {
    match find(line, token.as_bytes()) {
        Some(at) => [&line[..at], &line[at + token.len()..]].concat(),
        None => line.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Marker counts for one file, taken before any rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerScan {
    pub in_count: usize,
    pub out_count: usize,
    pub start_count: usize,
    pub end_count: usize,
}

impl MarkerScan {
    /// Lines carrying `IN` or a selection token.
    pub fn has_edits(&self) -> bool {
        self.in_count > 0 || self.has_selection()
    }

    pub fn has_selection(&self) -> bool {
        self.start_count > 0 || self.end_count > 0
    }

    pub fn has_sentinel(&self) -> bool {
        self.out_count > 0
    }

    /// `OUT` together with any edit token. Such a file is always retained.
    pub fn had_both(&self) -> bool {
        self.has_sentinel() && self.has_edits()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_sentinel() && !self.has_edits()
    }
}

/// Count the lines containing each token.
pub fn scan<S: AsRef<[u8]>>(lines: &[S], markers: &MarkerSet) -> MarkerScan {
    let mut scan = MarkerScan::default();
    for line in lines {
        let line = line.as_ref();
        if contains(line, markers.edit_in.as_bytes()) {
            scan.in_count += 1;
        }
        if contains(line, markers.edit_out.as_bytes()) {
            scan.out_count += 1;
        }
        if contains(line, markers.sel_start.as_bytes()) {
            scan.start_count += 1;
        }
        if contains(line, markers.sel_end.as_bytes()) {
            scan.end_count += 1;
        }
    }
    scan
}
