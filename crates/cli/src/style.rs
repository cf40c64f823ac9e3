//! Glyphs and colours for operator-facing output.

use console::Style;

use markpatch_core::reconcile::PatchKind;

fn with_glyph(style: Style, glyph: &str, msg: &str) -> String {
    format!("{} {}", style.apply_to(glyph), msg)
}

/// Green check mark.
pub fn success(msg: &str) -> String {
    with_glyph(Style::new().green(), "✓", msg)
}

/// Red cross.
pub fn error(msg: &str) -> String {
    with_glyph(Style::new().red(), "✗", msg)
}

/// Yellow warning sign.
pub fn warn(msg: &str) -> String {
    with_glyph(Style::new().yellow(), "⚠", msg)
}

/// Bold title for a project or run summary.
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// Patch kind label: add in green, delete in red, change in cyan.
pub fn patch_kind(kind: PatchKind) -> String {
    let style = match kind {
        PatchKind::Add => Style::new().green(),
        PatchKind::Delete => Style::new().red(),
        PatchKind::Change => Style::new().cyan(),
    };
    style.bold().apply_to(kind).to_string()
}
