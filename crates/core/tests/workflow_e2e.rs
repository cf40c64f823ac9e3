//! End-to-end tests for the mark -> prune -> export workflow.
//!
//! These tests exercise the real filesystem store and the `diffy`-backed
//! differ on temporary workspaces:
//! - a working tree annotated with markers
//! - a baseline tree standing in for a fetched repository
//! - the output root the patches land in
//!
//! No network I/O and no external tools.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use markpatch_core::config::{AppConfig, WorkspaceLayout};
use markpatch_core::errors::PruneError;
use markpatch_core::prune::{mark_files, prune_workspace};
use markpatch_core::reconcile::{DiffyDiffer, ExportReport, PatchGenerator, PatchKind};
use markpatch_core::store::LocalFileStore;

// ===========================================================================
// Helpers
// ===========================================================================

struct Workspace {
    _dir: TempDir,
    config: AppConfig,
    layout: WorkspaceLayout,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::default();
        let layout = config.resolve_paths(dir.path());
        std::fs::create_dir_all(&layout.edit_root).unwrap();
        std::fs::create_dir_all(&layout.git_root).unwrap();
        Self {
            _dir: dir,
            config,
            layout,
        }
    }

    fn edit(&self, rel: &str) -> PathBuf {
        self.layout.edit_root.join(rel)
    }

    fn baseline(&self, rel: &str) -> PathBuf {
        self.layout.git_root.join(rel)
    }

    fn prune(&self) -> Result<markpatch_core::prune::PruneReport, PruneError> {
        prune_workspace(
            &self.layout.edit_root,
            &self.config.markers,
            &self.config.path_policy(),
            &LocalFileStore,
        )
    }

    fn export(&self) -> ExportReport {
        let policy = self.config.path_policy();
        PatchGenerator::new(
            &self.layout,
            &self.config.markers,
            &policy,
            &self.config.backup.suffix,
            DiffyDiffer,
        )
        .run()
        .expect("export failed")
    }
}

fn write(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Upstream project plus an operator copy with one edited line, one new file
/// and two untouched files.
fn seed(ws: &Workspace) {
    let upstream = [
        ("proj/src/main.c", "int a;\nint b;\nint c;\n"),
        ("proj/src/util.c", "void util(void);\n"),
        ("proj/docs/notes.txt", "notes\n"),
        ("proj/README.md", "upstream readme\n"),
    ];
    for (rel, body) in upstream {
        write(&ws.baseline(rel), body);
        write(&ws.edit(rel), body);
    }

    write(&ws.edit("proj/src/main.c"), "int a;\n##edit-in##int B;\nint c;\n");
    write(
        &ws.edit("proj/new.c"),
        "##edit-start##int f(void) {\n  return 1;\n}##edit-end##\n",
    );
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_prune_then_export_produces_minimal_patches() {
    let ws = Workspace::new();
    seed(&ws);

    let report = ws.prune().expect("prune failed");
    assert!(!report.wiped);
    assert_eq!(report.rewritten.len(), 2);

    assert_eq!(
        read(&ws.edit("proj/src/main.c")),
        "##edit-out##\nint B;\n##edit-out##\n"
    );
    assert_eq!(
        read(&ws.edit("proj/new.c")),
        "int f(void) {\n  return 1;\n}\n"
    );
    assert!(ws.edit("proj/README.md").exists());
    assert!(!ws.edit("proj/src/util.c").exists());
    assert!(!ws.edit("proj/docs").exists());

    let export = ws.export();
    assert!(!export.no_sentinels);
    let project = &export.projects[0];
    assert_eq!(project.name, "proj");

    let kinds: Vec<_> = project
        .patches
        .iter()
        .map(|p| (p.rel_path.clone(), p.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (PathBuf::from("new.c"), PatchKind::Add),
            (PathBuf::from("src/main.c"), PatchKind::Change),
        ]
    );

    let change = read(&ws.layout.output_root.join("proj/src_main.c.patch"));
    assert!(change.starts_with("--- a/src/main.c\n+++ b/src/main.c\n"));
    assert!(change.contains("-int b;\n+int B;\n"));
    assert!(!change.contains("-int a;"));
    assert!(!change.contains("-int c;"));

    // Baseline-only files without the sentinel never produce delete patches.
    assert!(!ws.layout.output_root.join("proj/src_util.c.patch").exists());
    assert!(!ws.layout.output_root.join("proj/README.md.patch").exists());
}

#[test]
fn test_change_patch_applies_to_baseline() {
    let ws = Workspace::new();
    seed(&ws);
    ws.prune().unwrap();
    ws.export();

    let body = read(&ws.layout.output_root.join("proj/src_main.c.patch"));
    let patch = diffy::Patch::from_str(&body).expect("patch should parse");
    let applied = diffy::apply(&read(&ws.baseline("proj/src/main.c")), &patch).unwrap();
    assert_eq!(applied, "int a;\nint B;\nint c;\n");

    let body = read(&ws.layout.output_root.join("proj/new.c.patch"));
    let patch = diffy::Patch::from_str(&body).expect("patch should parse");
    let applied = diffy::apply("", &patch).unwrap();
    assert_eq!(applied, read(&ws.edit("proj/new.c")));
}

#[test]
fn test_rerunning_prune_and_export_is_stable() {
    let ws = Workspace::new();
    seed(&ws);
    ws.prune().unwrap();
    ws.export();

    let main_before = read(&ws.edit("proj/src/main.c"));
    let patch_before = read(&ws.layout.output_root.join("proj/src_main.c.patch"));

    let second = ws.prune().unwrap();
    assert!(second.rewritten.is_empty());
    assert_eq!(read(&ws.edit("proj/src/main.c")), main_before);

    ws.export();
    assert_eq!(
        read(&ws.layout.output_root.join("proj/src_main.c.patch")),
        patch_before
    );
}

#[test]
fn test_invalid_file_aborts_prune_without_changes() {
    let ws = Workspace::new();
    seed(&ws);
    write(
        &ws.edit("proj/broken.c"),
        "##edit-start##\n##edit-start##\n##edit-end##\n",
    );
    let main_before = read(&ws.edit("proj/src/main.c"));

    let err = ws.prune().unwrap_err();
    match err {
        PruneError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].to_string().contains("broken.c"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(read(&ws.edit("proj/src/main.c")), main_before);
    assert!(ws.edit("proj/src/util.c").exists());
    assert!(ws.edit("proj/docs/notes.txt").exists());
}

#[test]
fn test_mark_then_flag_more_lines_by_hand() {
    let ws = Workspace::new();
    seed(&ws);

    let report = mark_files(&[ws.edit("proj/src/main.c")], &ws.config.markers).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].1.rewritten);

    // A later edit of a sentinel line, then export without another prune.
    write(
        &ws.edit("proj/src/main.c"),
        "##edit-out##\nint B;\nint C;\n",
    );
    ws.export();
    let body = read(&ws.layout.output_root.join("proj/src_main.c.patch"));
    let patch = diffy::Patch::from_str(&body).unwrap();
    let applied = diffy::apply(&read(&ws.baseline("proj/src/main.c")), &patch).unwrap();
    assert_eq!(applied, "int a;\nint B;\nint C;\n");
}

#[test]
fn test_manual_baseline_preferred_over_fetched() {
    let ws = Workspace::new();
    seed(&ws);
    write(
        &ws.layout.local_root.join("proj/src/main.c"),
        "int a;\nint B;\nint c;\n",
    );
    ws.prune().unwrap();

    let export = ws.export();
    let patches = &export.projects[0].patches;
    // main.c matches the manual baseline; every other edit file is new to it.
    assert!(patches
        .iter()
        .all(|p| p.rel_path != Path::new("src/main.c")));
    assert!(patches
        .iter()
        .any(|p| p.rel_path == Path::new("new.c") && p.kind == PatchKind::Add));
}

#[test]
fn test_latin1_only_workspace_is_pruned_and_exported() {
    let ws = Workspace::new();
    let upstream = b"/* caf\xe9 */\nint x = 1;\nint y;\n";
    std::fs::create_dir_all(ws.baseline("p")).unwrap();
    std::fs::create_dir_all(ws.edit("p")).unwrap();
    std::fs::write(ws.baseline("p/a.c"), upstream).unwrap();
    std::fs::write(
        ws.edit("p/a.c"),
        b"/* caf\xe9 */\nint x = 2; /* d\xe9j\xe0 */ ##edit-in##\nint y;\n",
    )
    .unwrap();

    let report = ws.prune().unwrap();
    assert!(!report.wiped);
    assert!(ws.edit("p/a.c").exists());

    let export = ws.export();
    assert_eq!(export.patch_count(), 1);
    let body = std::fs::read(ws.layout.output_root.join("p/a.c.patch")).unwrap();
    let patch = diffy::Patch::from_bytes(&body).unwrap();
    let applied = diffy::apply_bytes(upstream, &patch).unwrap();
    assert_eq!(
        applied,
        b"/* caf\xe9 */\nint x = 2; /* d\xe9j\xe0 */ \nint y;\n"
    );
}

#[test]
fn test_untouched_workspace_exports_nothing() {
    let ws = Workspace::new();
    write(&ws.baseline("proj/a.c"), "a\n");
    write(&ws.edit("proj/a.c"), "a changed but never marked\n");

    let export = ws.export();
    assert!(export.no_sentinels);
    assert!(!ws.layout.output_root.exists());
}
