//! markpatch command-line tool.
//!
//! Provides subcommands for marking files, pruning the working tree down to
//! the marked files, exporting patches against fetched or manual baselines,
//! and the fetch / backup plumbing around that workflow.

mod commands;
mod guard;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use markpatch_core::errors::{BackupError, PruneError, ReconcileError};

use commands::backup::Direction;
use commands::Workspace;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Mark the lines you change, prune the rest, export patches.
#[derive(Parser, Debug)]
#[command(
    name = "markpatch",
    version,
    about = "Turn marker-annotated working trees into patches against upstream baselines"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./markpatch.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and rewrite individual files.
    Mark {
        /// Files to rewrite in place.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Rewrite every marked file and delete everything not worth keeping.
    Prune,

    /// Reconcile all projects against their baselines and write patches.
    Export,

    /// List projects and the baseline each one would use.
    Projects,

    /// Clone or refresh a baseline repository (or every remembered one).
    Fetch {
        /// Repository URL. Remembered for later runs.
        url: Option<String>,
    },

    /// List remembered repository URLs.
    Repos,

    /// Copy each top-level working-root entry to its backup name.
    Backup {
        /// Offer to overwrite existing backups.
        #[arg(long)]
        force: bool,
    },

    /// Copy backups back over their originals.
    Restore {
        /// Offer to overwrite existing originals.
        #[arg(long)]
        force: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./markpatch.toml")]
        output: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_GENERIC: u8 = 1;
const EXIT_VALIDATION: u8 = 2;
const EXIT_ROOT_MISSING: u8 = 3;
const EXIT_BASELINE_MISSING: u8 = 4;
const EXIT_PRIVILEGED: u8 = 5;

/// Map an error chain to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.is::<guard::PrivilegedRun>() {
            return EXIT_PRIVILEGED;
        }
        if let Some(e) = cause.downcast_ref::<PruneError>() {
            match e {
                PruneError::Validation(_) => return EXIT_VALIDATION,
                PruneError::RootMissing(_) => return EXIT_ROOT_MISSING,
                _ => {}
            }
        }
        if let Some(e) = cause.downcast_ref::<ReconcileError>() {
            match e {
                ReconcileError::EditRootMissing(_) => return EXIT_ROOT_MISSING,
                ReconcileError::BaselineRootMissing { .. } => return EXIT_BASELINE_MISSING,
                _ => {}
            }
        }
        if let Some(BackupError::RootMissing(_)) = cause.downcast_ref::<BackupError>() {
            return EXIT_ROOT_MISSING;
        }
    }
    EXIT_GENERIC
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    guard::check_privileges()?;

    if let Commands::Init { output } = &cli.command {
        return commands::init::run_init(output);
    }

    let ws = Workspace::load(&cli.config)?;
    match cli.command {
        Commands::Mark { files } => commands::mark::run_mark(&ws, &files),
        Commands::Prune => commands::prune::run_prune(&ws),
        Commands::Export => commands::export::run_export(&ws),
        Commands::Projects => commands::projects::run_projects(&ws),
        Commands::Fetch { url } => commands::fetch::run_fetch(&ws, url.as_deref()),
        Commands::Repos => commands::fetch::run_repos(&ws),
        Commands::Backup { force } => commands::backup::run(&ws, Direction::Backup, force),
        Commands::Restore { force } => commands::backup::run(&ws, Direction::Restore, force),
        Commands::Init { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::parse_from(["markpatch", "-vv", "--config", "ws/m.toml", "export"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("ws/m.toml"));
        assert!(matches!(cli.command, Commands::Export));
    }

    #[test]
    fn test_mark_requires_files() {
        assert!(Cli::try_parse_from(["markpatch", "mark"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let err: anyhow::Error = PruneError::Validation(Vec::new()).into();
        assert_eq!(exit_code(&err), EXIT_VALIDATION);

        let err: anyhow::Error = PruneError::RootMissing(PathBuf::from("edit")).into();
        assert_eq!(exit_code(&err), EXIT_ROOT_MISSING);

        let err: anyhow::Error = ReconcileError::BaselineRootMissing {
            git: PathBuf::from("git"),
            local: PathBuf::from("local"),
        }
        .into();
        assert_eq!(exit_code(&err), EXIT_BASELINE_MISSING);

        let err: anyhow::Error = guard::PrivilegedRun {
            reason: "SUDO_USER is set".into(),
        }
        .into();
        assert_eq!(exit_code(&err), EXIT_PRIVILEGED);

        let err = anyhow::Error::from(ReconcileError::EditRootMissing(PathBuf::from("edit")))
            .context("export failed");
        assert_eq!(exit_code(&err), EXIT_ROOT_MISSING);

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_GENERIC);
    }
}
