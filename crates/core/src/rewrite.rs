//! Rewrite engine: strip markers from edited lines and turn every other line
//! into the sentinel.
//!
//! The per-line rule carries one bit of state (inside a selection or not):
//!
//! | Line | Output |
//! |------|--------|
//! | contains selection start (and end) | token(s) stripped, selection opened (or stays closed) |
//! | contains selection start | token stripped, selection opened |
//! | contains selection end | token stripped, selection closed |
//! | inside a selection | unchanged |
//! | contains `IN` | token stripped |
//! | anything else | the sentinel |
//!
//! Files are replaced atomically: the new content is written to a temporary
//! file in the same directory, given the original's mode and ownership, then
//! renamed over the original.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::content::{contains, split_raw_lines, RawLine};
use crate::errors::RewriteError;
use crate::markers::grammar::{strip_token, trim_horizontal};
use crate::markers::{scan, validate, MarkerScan, MarkerSet, Validation};

// ---------------------------------------------------------------------------
// Pure rewrite
// ---------------------------------------------------------------------------

/// Apply the rewrite rule to every line body. One output line per input line.
///
/// The input is expected to have passed [`validate`] when it contains any
/// selection token.
pub fn rewrite_lines<S: AsRef<[u8]>>(lines: &[S], markers: &MarkerSet) -> Vec<Vec<u8>> {
    let mut in_selection = false;
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let line = line.as_ref();
        let has_start = contains(line, markers.sel_start.as_bytes());
        let has_end = contains(line, markers.sel_end.as_bytes());

        let emitted = if has_start && has_end {
            let stripped = strip_token(line, &markers.sel_start);
            strip_token(&stripped, &markers.sel_end)
        } else if has_start {
            in_selection = true;
            strip_token(line, &markers.sel_start)
        } else if has_end {
            in_selection = false;
            strip_token(line, &markers.sel_end)
        } else if in_selection {
            line.to_vec()
        } else if contains(line, markers.edit_in.as_bytes()) {
            strip_token(line, &markers.edit_in)
        } else {
            markers.edit_out.as_bytes().to_vec()
        };
        out.push(emitted);
    }
    out
}

/// `true` if at least one line is neither blank nor the sentinel.
pub fn has_real_content<S: AsRef<[u8]>>(lines: &[S], markers: &MarkerSet) -> bool {
    lines.iter().any(|l| {
        let t = trim_horizontal(l.as_ref());
        !t.is_empty() && t != markers.edit_out.as_bytes()
    })
}

/// Reattach each original terminator to its rewritten line body.
fn reassemble(bodies: &[Vec<u8>], raw: &[RawLine<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (body, line) in bodies.iter().zip(raw) {
        out.extend_from_slice(body);
        out.extend_from_slice(line.ending);
    }
    out
}

// ---------------------------------------------------------------------------
// File rewrite
// ---------------------------------------------------------------------------

/// A file read from disk, scanned and validated, ready to be rewritten.
///
/// The raw bytes are kept as read: line bodies are rewritten, terminators
/// (`\n` or `\r\n`) and any non-UTF-8 bytes pass through unchanged.
#[derive(Debug, Clone)]
pub struct MarkedFile {
    path: PathBuf,
    bytes: Vec<u8>,
    scan: MarkerScan,
}

/// What happened to a file passed through [`MarkedFile::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Marker counts taken before the rewrite.
    pub scan: MarkerScan,
    /// `false` when the file had no edit tokens and was left alone.
    pub rewritten: bool,
    /// Whether the resulting file still holds real (non-sentinel) content.
    pub has_content: bool,
}

impl MarkedFile {
    /// Read and scan `path`, validating selections if it has any.
    pub fn load(path: &Path, markers: &MarkerSet) -> Result<Self, RewriteError> {
        let bytes = std::fs::read(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, bytes, markers)
    }

    /// Build from already-read content. Validation happens here, never later.
    pub fn from_bytes(
        path: &Path,
        bytes: Vec<u8>,
        markers: &MarkerSet,
    ) -> Result<Self, RewriteError> {
        let lines: Vec<&[u8]> = split_raw_lines(&bytes).iter().map(|l| l.body).collect();
        let scan = scan(&lines, markers);

        if scan.has_selection() {
            if let Validation::Invalid { reason, line } = validate(&lines, markers) {
                return Err(RewriteError::Invalid {
                    path: path.to_path_buf(),
                    line,
                    reason: reason.to_string(),
                });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            scan,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scan(&self) -> MarkerScan {
        self.scan
    }

    /// Rewrite the file in place if it carries any edit token.
    pub fn rewrite(&self, markers: &MarkerSet) -> Result<RewriteOutcome, RewriteError> {
        let raw = split_raw_lines(&self.bytes);
        let bodies: Vec<&[u8]> = raw.iter().map(|l| l.body).collect();

        if !self.scan.has_edits() {
            debug!(path = %self.path.display(), "no edit markers, leaving file untouched");
            return Ok(RewriteOutcome {
                scan: self.scan,
                rewritten: false,
                has_content: has_real_content(&bodies, markers),
            });
        }

        let new_lines = rewrite_lines(&bodies, markers);
        let body = reassemble(&new_lines, &raw);
        write_atomic(&self.path, &body).map_err(|source| RewriteError::Write {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            lines = new_lines.len(),
            had_both = self.scan.had_both(),
            "rewrote marked file"
        );
        Ok(RewriteOutcome {
            scan: self.scan,
            rewritten: true,
            has_content: has_real_content(&new_lines, markers),
        })
    }
}

/// Validate and rewrite one file. The "mark a file as being edited" step.
pub fn rewrite_file(path: &Path, markers: &MarkerSet) -> Result<RewriteOutcome, RewriteError> {
    MarkedFile::load(path, markers)?.rewrite(markers)
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
///
/// Mode bits are copied to the temp file before the rename. Owner and group
/// are copied on a best-effort basis: failing to `chown` (as an unprivileged
/// user) only logs.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let original = std::fs::metadata(path).ok();

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    if let Some(meta) = &original {
        std::fs::set_permissions(tmp.path(), meta.permissions())?;
        copy_ownership(tmp.path(), meta);
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn copy_ownership(path: &Path, meta: &std::fs::Metadata) {
    use std::os::unix::fs::MetadataExt;

    if let Err(e) = std::os::unix::fs::chown(path, Some(meta.uid()), Some(meta.gid())) {
        warn!(path = %path.display(), error = %e, "could not restore owner/group");
    }
}

#[cfg(not(unix))]
fn copy_ownership(_path: &Path, _meta: &std::fs::Metadata) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn m() -> MarkerSet {
        MarkerSet::default()
    }

    fn text(lines: Vec<Vec<u8>>) -> Vec<String> {
        lines.into_iter().map(|l| String::from_utf8(l).unwrap()).collect()
    }

    #[test]
    fn test_selection_contract() {
        let input = ["a", "##edit-start##b", "c##edit-end##", "d"];
        let out = text(rewrite_lines(&input, &m()));
        assert_eq!(out, vec!["##edit-out##", "b", "c", "##edit-out##"]);
    }

    #[test]
    fn test_in_marker_stripped_and_others_sentinel() {
        let input = ["one", "two ##edit-in##", "three"];
        let out = text(rewrite_lines(&input, &m()));
        assert_eq!(out, vec!["##edit-out##", "two ", "##edit-out##"]);
    }

    #[test]
    fn test_selection_body_kept_verbatim() {
        let input = [
            "##edit-start##",
            "  keep ##edit-out## as is",
            "",
            "##edit-end##",
            "gone",
        ];
        let out = text(rewrite_lines(&input, &m()));
        assert_eq!(
            out,
            vec!["", "  keep ##edit-out## as is", "", "", "##edit-out##"]
        );
    }

    #[test]
    fn test_one_line_selection_does_not_stay_open() {
        let input = ["##edit-start##x##edit-end##", "after"];
        let out = text(rewrite_lines(&input, &m()));
        assert_eq!(out, vec!["x", "##edit-out##"]);
    }

    #[test]
    fn test_existing_sentinels_are_preserved() {
        let input = ["##edit-out##", "b ##edit-in##"];
        let out = text(rewrite_lines(&input, &m()));
        assert_eq!(out, vec!["##edit-out##", "b "]);
    }

    #[test]
    fn test_has_real_content() {
        assert!(!has_real_content(&["##edit-out##", "  ", " ##edit-out## "], &m()));
        assert!(has_real_content(&["##edit-out##", "x"], &m()));
        assert!(!has_real_content::<&str>(&[], &m()));
    }

    #[test]
    fn test_rewrite_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.c");
        std::fs::write(&path, "L1\nL2 ##edit-in##\nL3\n").unwrap();

        let outcome = rewrite_file(&path, &m()).unwrap();
        assert!(outcome.rewritten);
        assert!(outcome.has_content);
        assert!(!outcome.scan.had_both());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "##edit-out##\nL2 \n##edit-out##\n"
        );
    }

    #[test]
    fn test_invalid_file_is_not_touched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.c");
        let original = "##edit-start##\n##edit-start##\n##edit-end##\n";
        std::fs::write(&path, original).unwrap();

        let err = rewrite_file(&path, &m()).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, RewriteError::Invalid { line: 2, .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_file_without_edit_tokens_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flagged.c");
        std::fs::write(&path, "##edit-out##\nreal\n").unwrap();

        let outcome = rewrite_file(&path, &m()).unwrap();
        assert!(!outcome.rewritten);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "##edit-out##\nreal\n");
    }

    #[test]
    fn test_no_trailing_newline_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, "a\nb ##edit-in##").unwrap();
        rewrite_file(&path, &m()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "##edit-out##\nb ");
    }

    #[test]
    fn test_crlf_terminators_survive_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("win.c");
        std::fs::write(&path, "one\r\nTWO ##edit-in##\r\nthree\r\n").unwrap();

        rewrite_file(&path, &m()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "##edit-out##\r\nTWO \r\n##edit-out##\r\n"
        );
    }

    #[test]
    fn test_mixed_terminators_kept_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        std::fs::write(&path, "a\r\nb ##edit-in##\nc").unwrap();

        rewrite_file(&path, &m()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "##edit-out##\r\nb \n##edit-out##"
        );
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.c");
        let mut original = b"/* caf\xe9 */\nint x = 2; ##edit-in##\n".to_vec();
        original.extend(std::iter::repeat(b'a').take(9000));
        original.extend_from_slice(b"\n##edit-start##/* na\xefve */##edit-end##\n");
        std::fs::write(&path, &original).unwrap();

        let outcome = rewrite_file(&path, &m()).unwrap();
        assert!(outcome.rewritten);
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"##edit-out##\nint x = 2; \n##edit-out##\n/* na\xefve */\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_bits_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.sh");
        std::fs::write(&path, "#!/bin/sh\necho hi ##edit-in##\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o750)).unwrap();

        rewrite_file(&path, &m()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
