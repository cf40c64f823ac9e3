//! Effective-sequence construction.
//!
//! Baseline and edit lines are paired by index over the longer of the two
//! sequences. A sentinel edit line takes the baseline line at the same index;
//! any other edit line is taken verbatim. An index past the end of the edit
//! file contributes nothing (an empty edit line is never the sentinel), and a
//! sentinel past the end of the baseline has nothing to defer to, so it
//! contributes nothing either.

use crate::content::{join_lines, split_lines};
use crate::markers::MarkerSet;

/// Build the effective line sequence.
pub fn effective_sequence<'a>(
    baseline: &[&'a [u8]],
    edit: &[&'a [u8]],
    markers: &MarkerSet,
) -> Vec<&'a [u8]> {
    let len = baseline.len().max(edit.len());
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        match edit.get(i) {
            Some(line) if markers.is_sentinel_line(line) => {
                if let Some(base) = baseline.get(i) {
                    out.push(*base);
                }
            }
            Some(line) => out.push(*line),
            None => {}
        }
    }
    out
}

/// Baseline and effective content, normalized to `\n` line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub baseline: Vec<u8>,
    pub effective: Vec<u8>,
}

impl Reconciled {
    pub fn is_unchanged(&self) -> bool {
        self.baseline == self.effective
    }
}

/// Reconcile whole file contents.
///
/// Both sides end in a newline when the baseline does (or, for an empty
/// baseline, when the edit file does), so a trailing-newline difference
/// never produces a patch by itself.
pub fn reconcile_text(baseline: &[u8], edit: &[u8], markers: &MarkerSet) -> Reconciled {
    let base_lines = split_lines(baseline);
    let edit_lines = split_lines(edit);
    let effective = effective_sequence(&base_lines, &edit_lines, markers);

    let trailing = if baseline.is_empty() {
        edit.ends_with(b"\n")
    } else {
        baseline.ends_with(b"\n")
    };
    Reconciled {
        baseline: join_lines(&base_lines, trailing),
        effective: join_lines(&effective, trailing),
    }
}
