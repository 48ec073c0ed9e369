use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trackline::commands::common::workspace_target;
use trackline::commands::{check, migrate, sync, workspace, worktree_cmd};

#[derive(Parser)]
#[command(name = "trackline")]
#[command(about = "Peer-replicated issue tracker sync", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository root (defaults to the repository containing the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); TRACKLINE_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the sync worktree
    Worktree {
        #[command(subcommand)]
        command: WorktreeCommands,
    },

    /// Check that the worktree and the sync branch agree
    Check,

    /// Move records stored outside the worktree into it
    Migrate {
        /// Delete the legacy files after copying (a backup is always taken)
        #[arg(long)]
        remove_source: bool,
    },

    /// Save the worktree's records into a workspace
    Save {
        #[command(flatten)]
        target: TargetArgs,

        /// Only records that differ from the remote sync branch
        #[arg(long)]
        updates_only: bool,
    },

    /// Merge a workspace's records into the worktree
    Import {
        #[command(flatten)]
        target: TargetArgs,

        /// Empty the workspace afterwards (always done for --outbox)
        #[arg(long)]
        clear: bool,
    },

    /// Fetch, merge, and push records
    Sync {
        /// Report what would be pushed without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show conflicts recorded in a workspace's attic
    Attic {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Subcommand)]
enum WorktreeCommands {
    /// Show worktree health
    Status,

    /// Create the worktree on the sync branch
    Init,

    /// Repair a prunable, corrupted, or detached worktree
    Repair {
        /// Report what would be repaired without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Named workspace
    #[arg(long, conflicts_with_all = ["outbox", "dir"])]
    name: Option<String>,

    /// The pending-sync outbox
    #[arg(long, conflicts_with = "dir")]
    outbox: bool,

    /// Workspace at an arbitrary directory
    #[arg(long)]
    dir: Option<PathBuf>,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("TRACKLINE_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let root = cli.root;

    match cli.command {
        Commands::Worktree { command } => match command {
            WorktreeCommands::Status => worktree_cmd::status(root),
            WorktreeCommands::Init => worktree_cmd::init(root),
            WorktreeCommands::Repair { dry_run } => worktree_cmd::repair(root, dry_run),
        },
        Commands::Check => check::execute(root),
        Commands::Migrate { remove_source } => migrate::execute(root, remove_source),
        Commands::Save {
            target,
            updates_only,
        } => {
            let target = workspace_target(target.name, target.outbox, target.dir)?;
            workspace::save(root, target, updates_only)
        }
        Commands::Import { target, clear } => {
            let target = workspace_target(target.name, target.outbox, target.dir)?;
            workspace::import(root, target, clear)
        }
        Commands::Sync { dry_run } => sync::execute(root, dry_run),
        Commands::Attic { target } => {
            let target = workspace_target(target.name, target.outbox, target.dir)?;
            workspace::attic(root, target)
        }
    }
}
