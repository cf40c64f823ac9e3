//! Line splitting and the text/binary heuristic shared by every workflow.
//!
//! Everything here works on raw bytes. Text files are not assumed to be
//! UTF-8: a Latin-1 source file is text like any other, and its bytes must
//! survive a rewrite unchanged.

use std::path::Path;

/// Bytes sampled from the head of a file by [`is_binary`].
const SAMPLE_SIZE: usize = 8192;

/// Share of control bytes in the sample above which a file counts as binary.
const CONTROL_RATIO: f64 = 0.30;

/// One line split from its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine<'a> {
    pub body: &'a [u8],
    /// `\n`, `\r\n`, or empty on an unterminated last line.
    pub ending: &'a [u8],
}

/// Split bytes into lines, keeping each line's terminator.
///
/// A final newline does not produce an extra empty line, and empty input has
/// no lines at all.
pub fn split_raw_lines(bytes: &[u8]) -> Vec<RawLine<'_>> {
    let mut out = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let split = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        let (line, tail) = rest.split_at(split);
        let ending_len = if line.ends_with(b"\r\n") {
            2
        } else if line.ends_with(b"\n") || line.ends_with(b"\r") {
            1
        } else {
            0
        };
        let (body, ending) = line.split_at(line.len() - ending_len);
        out.push(RawLine { body, ending });
        rest = tail;
    }
    out
}

/// Split bytes into line bodies, dropping `\n` and `\r\n` terminators.
pub fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    split_raw_lines(bytes).into_iter().map(|l| l.body).collect()
}

/// Join lines with `\n`, optionally terminating the last one.
pub fn join_lines<S: AsRef<[u8]>>(lines: &[S], trailing_newline: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(line.as_ref());
    }
    if trailing_newline && !lines.is_empty() {
        out.push(b'\n');
    }
    out
}

/// Byte offset of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Literal substring test on bytes.
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

/// Heuristic binary check over the first [`SAMPLE_SIZE`] bytes.
///
/// A NUL byte means binary, as does a sample where more than 30% of the
/// bytes are control characters. Bytes at or above 0x80 never count against
/// a file: they are UTF-8 or a legacy 8-bit encoding.
pub fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let control = sample.iter().filter(|&&b| is_control(b)).count();
    control as f64 / sample.len() as f64 > CONTROL_RATIO
}

fn is_control(b: u8) -> bool {
    match b {
        b'\n' | b'\r' | b'\t' | 0x0c | 0x1b => false,
        0..=0x1f | 0x7f => true,
        _ => false,
    }
}

/// Content of a file, or `None` when the heuristic calls it binary.
pub fn read_text(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    let bytes = std::fs::read(path)?;
    if is_binary(&bytes) {
        return Ok(None);
    }
    Ok(Some(bytes))
}
