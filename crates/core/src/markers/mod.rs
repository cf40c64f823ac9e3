//! Marker grammar and placement validation.
//!
//! The grammar defines the four literal tokens; the validator checks that
//! selection markers are well formed before a file is rewritten.

pub mod grammar;
pub mod validator;

pub use grammar::{is_sentinel_line, scan, MarkerScan, MarkerSet};
pub use validator::{validate, InvalidReason, Validation};
