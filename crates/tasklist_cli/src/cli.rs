//! Command-line surface.
//!
//! # Responsibility
//! - Declare flags and subcommands. Environment fallbacks are resolved by
//!   `CoreConfig::from_env` in `main.rs`.
//! - Keep parsing separate from execution in `main.rs`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tasklist_core::TaskId;

#[derive(Debug, Parser)]
#[command(name = "tasklist")]
#[command(version)]
#[command(about = "Local task list with a one-time remote seed import")]
pub struct Cli {
    #[arg(long, help = "Directory holding the task database and logs [env: TASKLIST_DATA_DIR].")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Log level: trace|debug|info|warn|error [env: TASKLIST_LOG_LEVEL].")]
    pub log_level: Option<String>,

    #[arg(long, help = "Endpoint for the one-time seed import [env: TASKLIST_SEED_URL].")]
    pub seed_url: Option<String>,

    #[arg(long, value_enum, default_value_t = LabelLocale::English)]
    pub labels: LabelLocale,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LabelLocale {
    English,
    Russian,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "List tasks, optionally filtered by a search term.")]
    List(ListArgs),
    #[command(about = "Create a task. An empty title is derived from the description.")]
    Add(AddArgs),
    #[command(about = "Edit a task. Clearing both fields deletes it.")]
    Edit(EditArgs),
    #[command(about = "Flip a task's completion state.")]
    Toggle(IdArgs),
    #[command(about = "Delete a task.")]
    Delete(IdArgs),
    #[command(about = "Run the one-time seed import and report its outcome.")]
    Import,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(short, long, help = "Case-insensitive match on title or description.")]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub title: String,
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: TaskId,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    pub id: TaskId,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, LabelLocale};
    use clap::Parser;

    #[test]
    fn parses_edit_with_partial_fields() {
        let cli = Cli::try_parse_from([
            "tasklist",
            "edit",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "--title",
            "Renamed",
        ])
        .unwrap();

        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.title.as_deref(), Some("Renamed"));
                assert!(args.description.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.labels, LabelLocale::English);
    }

    #[test]
    fn rejects_malformed_task_id() {
        assert!(Cli::try_parse_from(["tasklist", "toggle", "not-a-uuid"]).is_err());
    }

    #[test]
    fn list_search_is_optional() {
        let cli = Cli::try_parse_from(["tasklist", "--labels", "russian", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List(ref args) if args.search.is_none()));
        assert_eq!(cli.labels, LabelLocale::Russian);
    }
}
