//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mirror_core::ConflictPolicy;

/// tree-mirror - Diff files and mirror project trees into host directories
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show a line diff between two files
    ///
    /// Lines are compared after normalizing line endings and trailing
    /// whitespace. Binary or oversized files are reported, not diffed.
    Diff {
        /// Original file
        before: PathBuf,

        /// Changed file
        after: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Mirror a project directory into a host directory
    ///
    /// Files go into a subfolder of the host directory named after the
    /// project. Files changed on both sides since the last sync are
    /// conflicts, handled according to the conflict policy.
    ///
    /// Examples:
    ///   mirror sync ./site /mnt/backup
    ///   mirror sync ./site /mnt/backup --policy force -e '*.tmp'
    Sync {
        /// Project directory
        project: PathBuf,

        /// Host directory to mirror into
        host: PathBuf,

        /// Project name (defaults to the project directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Conflict policy: ask, force or skip
        #[arg(short, long)]
        policy: Option<ConflictPolicy>,

        /// Additional gitignore-style exclude pattern (repeatable)
        #[arg(short, long = "exclude")]
        excludes: Vec<String>,

        /// Settings file (.toml, .json or .yaml)
        #[arg(long, env = "MIRROR_SETTINGS")]
        settings: Option<PathBuf>,

        /// Known-state file (defaults to the user data directory)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Forget known states before syncing
        #[arg(long)]
        reset: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
