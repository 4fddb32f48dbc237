//! Todo
//!
//! Command-line todo manager. The storage backend is chosen with
//! `TODO_BACKEND` (`relational` or `document`).

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_todos::{RepositoryConfig, TodoService, create_repositories};
use eyre::Result;
use tracing::{info, warn};

mod commands;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Manage todos and tags")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a todo
    Add {
        /// What needs doing
        description: String,
    },

    /// List todos
    List {
        /// Only completed todos
        #[arg(long, conflicts_with = "open")]
        done: bool,

        /// Only open todos
        #[arg(long)]
        open: bool,
    },

    /// Search todos by description (case-insensitive)
    Search { keyword: Option<String> },

    /// Show one todo
    Show { id: i32 },

    /// Mark a todo as done
    Done { id: i32 },

    /// Mark a todo as not done
    Undone { id: i32 },

    /// Flip a todo's done flag
    Toggle { id: i32 },

    /// Change a todo's description
    Edit { id: i32, description: String },

    /// Delete a todo
    Delete { id: i32 },

    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Show backend connection status
    Status,
}

#[derive(Subcommand)]
enum TagCommands {
    /// Create a tag
    Add { name: String },

    /// List tags
    List,

    /// Search tags by name (case-insensitive)
    Search { keyword: Option<String> },

    /// Rename a tag
    Rename { id: i32, name: String },

    /// Delete a tag; tagged todos are kept
    Delete { id: i32 },

    /// Attach a tag to a todo
    Attach { todo_id: i32, tag_id: i32 },

    /// Detach a tag from a todo
    Detach { todo_id: i32, tag_id: i32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let config = RepositoryConfig::from_env()?;

    info!(backend = %config.backend, "Opening repositories");
    let repositories = create_repositories(&config).await?;
    if !repositories.is_connected() {
        warn!("Backend unreachable, changes will not be persisted");
    }

    let service = TodoService::from_repositories(&repositories);

    commands::run(&repositories, &service, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from(["todo", "list", "--done"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                done: true,
                open: false
            }
        ));

        assert!(Cli::try_parse_from(["todo", "list", "--done", "--open"]).is_err());
    }

    #[test]
    fn test_parse_tag_attach() {
        let cli = Cli::try_parse_from(["todo", "tag", "attach", "3", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Tag {
                command: TagCommands::Attach {
                    todo_id: 3,
                    tag_id: 7
                }
            }
        ));
    }

    #[test]
    fn test_parse_search_without_keyword() {
        let cli = Cli::try_parse_from(["todo", "search"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { keyword: None }));
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["todo", "done", "first"]).is_err());
    }
}
