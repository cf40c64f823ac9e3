//! Text-diff collaborator.
//!
//! [`DiffyDiffer`] renders unified diffs with the `diffy` crate, labelling
//! the `---` / `+++` headers through its filename options. Content is
//! diffed as bytes, so non-UTF-8 text reaches the patch unchanged.

use diffy::DiffOptions;
use tracing::trace;

/// Label used for the missing side of an add or delete patch.
pub const DEV_NULL: &str = "/dev/null";

/// Renders two texts as a unified diff.
pub trait Differ {
    fn unified_diff(&self, old: &[u8], new: &[u8], old_label: &str, new_label: &str) -> Vec<u8>;
}

/// [`Differ`] backed by `diffy::DiffOptions::create_patch_bytes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffyDiffer;

impl Differ for DiffyDiffer {
    fn unified_diff(&self, old: &[u8], new: &[u8], old_label: &str, new_label: &str) -> Vec<u8> {
        let mut options = DiffOptions::new();
        options
            .set_original_filename(old_label.to_owned())
            .set_modified_filename(new_label.to_owned());
        let rendered = options.create_patch_bytes(old, new).to_bytes();
        trace!(bytes = rendered.len(), "rendered diff");
        rendered
    }
}
