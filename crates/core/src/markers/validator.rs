//! Placement validation for selection markers.
//!
//! Runs over a file's lines before any mutation. The scanning state mirrors
//! the rewrite pass exactly, so a file that validates cleanly is rewritten
//! without surprises.

use std::fmt;

use super::grammar::MarkerSet;
use crate::content::contains;

/// Why a file's marker structure was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// A selection start while a selection is already open.
    NestedSelection,
    /// A selection end with no open selection.
    UnmatchedEnd,
    /// A plain `IN` marker inside an open selection.
    PlainMarkerInSelection,
    /// Different numbers of selection starts and ends.
    Unbalanced { starts: usize, ends: usize },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NestedSelection => write!(f, "selection start inside an open selection"),
            Self::UnmatchedEnd => write!(f, "selection end without a matching start"),
            Self::PlainMarkerInSelection => write!(f, "edit-in marker inside a selection"),
            Self::Unbalanced { starts, ends } => {
                write!(f, "{} selection start(s) but {} selection end(s)", starts, ends)
            }
        }
    }
}

/// Result of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// `line` is 1-indexed.
    Invalid { reason: InvalidReason, line: usize },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Validate selection and plain-marker placement.
///
/// A line holding both selection tokens is a one-line selection and must
/// start outside any open selection. Lines that open or close a selection
/// count as inside it, so an `IN` marker on them is rejected too.
pub fn validate<S: AsRef<[u8]>>(lines: &[S], markers: &MarkerSet) -> Validation {
    let mut in_selection = false;
    let mut open_line = 0;
    let mut starts = 0;
    let mut ends = 0;

    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let line_no = idx + 1;
        let has_start = contains(line, markers.sel_start.as_bytes());
        let has_end = contains(line, markers.sel_end.as_bytes());
        let has_in = contains(line, markers.edit_in.as_bytes());

        if has_start {
            starts += 1;
            if in_selection {
                return invalid(InvalidReason::NestedSelection, line_no);
            }
            in_selection = true;
            open_line = line_no;
        }
        if in_selection && has_in {
            return invalid(InvalidReason::PlainMarkerInSelection, line_no);
        }
        if has_end {
            ends += 1;
            if !in_selection {
                return invalid(InvalidReason::UnmatchedEnd, line_no);
            }
            in_selection = false;
        }
    }

    if starts != ends {
        let line = if in_selection { open_line } else { lines.len() };
        return invalid(InvalidReason::Unbalanced { starts, ends }, line);
    }
    Validation::Valid
}

fn invalid(reason: InvalidReason, line: usize) -> Validation {
    Validation::Invalid { reason, line }
}
