use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::handlers::{BookFields, SettingsUpdate};

#[derive(Parser)]
#[command(name = "boeklog")]
#[command(about = "Keep a log of the books you read, synced through GitHub")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a book
    Add(BookArgs),
    /// List books, most recently read first
    List {
        /// Include deleted books awaiting sync
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one book
    Show {
        /// Book ID
        id: String,
    },
    /// Change fields of a book
    Edit {
        /// Book ID
        id: String,
        #[command(flatten)]
        fields: BookArgs,
    },
    /// Delete a book
    Delete {
        /// Book ID
        id: String,
    },
    /// Export books as a JSON backup
    Export {
        /// Output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import books from a JSON backup
    Import {
        /// Backup file
        file: PathBuf,
    },
    /// Sync with the GitHub repository now
    Sync,
    /// Show sync state
    Status,
    /// Show or change sync settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct BookArgs {
    /// Title
    #[arg(short, long)]
    pub title: Option<String>,
    /// Author (empty clears it)
    #[arg(short, long)]
    pub author: Option<String>,
    /// Date you finished the book (YYYY-MM-DD)
    #[arg(short = 'd', long, value_name = "DATE")]
    pub read_date: Option<NaiveDate>,
    /// Your rating, 1 to 10
    #[arg(short, long)]
    pub rating: Option<u8>,
    /// Your review (empty clears it)
    #[arg(long)]
    pub review: Option<String>,
    /// Year of first publication
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i32>,
    /// Number of pages
    #[arg(long)]
    pub pages: Option<u32>,
}

impl From<BookArgs> for BookFields {
    fn from(args: BookArgs) -> Self {
        Self {
            title: args.title,
            author: args.author,
            read_date: args.read_date,
            rating: args.rating,
            review: args.review,
            publish_year: args.year,
            pages: args.pages,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,
    /// Change sync settings
    Set {
        /// GitHub token with contents access (empty disables sync)
        #[arg(long)]
        token: Option<String>,
        /// Repository as owner/name
        #[arg(long)]
        repo: Option<String>,
        /// Path of the sync file in the repository
        #[arg(long)]
        path: Option<String>,
    },
}

impl ConfigCommands {
    pub fn into_update(self) -> Option<SettingsUpdate> {
        match self {
            ConfigCommands::Show => None,
            ConfigCommands::Set { token, repo, path } => Some(SettingsUpdate { token, repo, path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_add() {
        let cli = Cli::try_parse_from([
            "boeklog", "add", "--title", "Het diner", "-d", "2024-02-03", "--rating", "7",
        ])
        .unwrap();

        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let fields = BookFields::from(args);
        assert_eq!(fields.title.as_deref(), Some("Het diner"));
        assert_eq!(fields.read_date, NaiveDate::from_ymd_opt(2024, 2, 3));
        assert_eq!(fields.rating, Some(7));
    }

    #[test]
    fn parse_config_set() {
        let cli = Cli::try_parse_from(["boeklog", "config", "set", "--token", ""]).unwrap();
        let Commands::Config { command } = cli.command else {
            panic!("expected config");
        };
        let update = command.into_update().unwrap();
        assert_eq!(update.token.as_deref(), Some(""));
        assert!(update.repo.is_none());
    }
}
