use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::task::TaskStatus;

#[derive(Parser)]
#[command(name = "taskit", about = concat!("[*] taskit v", env!("CARGO_PKG_VERSION"), " - checkbox tasks in plain text"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: .taskit.toml next to the document)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks in a document
    List(ListArgs),
    /// Add a task after the last task line
    Add(AddArgs),
    /// Change a task's text
    Rename(RenameArgs),
    /// Remove a task's line
    Delete(DeleteArgs),
    /// Set a task's status, or cycle it (todo → doing → done) if none is given
    Status(StatusArgs),
    /// Keep a document open: follow external edits and read commands from stdin
    Watch(WatchArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Task document
    pub file: PathBuf,
    /// Filter by status (todo, doing, done)
    #[arg(long)]
    pub status: Option<TaskStatus>,
    /// Print canonical checkbox lines instead of a table
    #[arg(long)]
    pub plain: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task document
    pub file: PathBuf,
    /// Task text
    pub text: String,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Task document
    pub file: PathBuf,
    /// Task ID
    pub id: String,
    /// New task text
    pub text: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task document
    pub file: PathBuf,
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task document
    pub file: PathBuf,
    /// Task ID
    pub id: String,
    /// New status (todo, doing, done); omit to cycle
    pub status: Option<TaskStatus>,
}

// ---------------------------------------------------------------------------
// Session args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct WatchArgs {
    /// Task document
    pub file: PathBuf,
    /// Override the debounce delay from the config
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_argument_is_optional() {
        let cli = Cli::try_parse_from(["taskit", "status", "todo.txt", "task-0-a"]).unwrap();
        match cli.command {
            Commands::Status(args) => assert_eq!(args.status, None),
            _ => panic!("expected status command"),
        }

        let cli = Cli::try_parse_from(["taskit", "status", "todo.txt", "task-0-a", "doing"]).unwrap();
        match cli.command {
            Commands::Status(args) => assert_eq!(args.status, Some(TaskStatus::Doing)),
            _ => panic!("expected status command"),
        }
    }

    #[test]
    fn bad_status_is_rejected() {
        assert!(Cli::try_parse_from(["taskit", "status", "todo.txt", "task-0-a", "blocked"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["taskit", "list", "todo.txt", "--json"]).unwrap();
        assert!(cli.json);
        assert!(cli.config.is_none());
    }
}
