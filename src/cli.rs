use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tome_catalog::SearchField;

#[derive(Parser)]
#[command(name = "tome", version, about = "Find books and keep their metadata close at hand")]
pub(crate) struct Cli {
    /// Configuration file (TOML, YAML or JSON); defaults to tome.* in the user config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More logging; repeat for more detail (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search the catalog
    Search {
        /// Search terms
        #[arg(required_unless_present_any = ["recent", "clear_recent"], num_args = 1..)]
        query: Vec<String>,

        /// Field to match the terms against
        #[arg(short, long, value_enum, default_value_t = By::Any)]
        by: By,

        /// Also list derivative works (summaries, study guides, workbooks...)
        #[arg(short, long)]
        all: bool,

        /// List the most recent searches instead of searching
        #[arg(long, conflicts_with_all = ["query", "clear_recent"])]
        recent: bool,

        /// Forget the recent searches
        #[arg(long, conflicts_with = "query")]
        clear_recent: bool,
    },
    /// Show a single book by identifier (OL45804W), key (/works/OL45804W) or book URL
    Details {
        book: String,
    },
    /// Show favorite books from cached metadata, in the given order
    Favorites {
        #[arg(required = true, num_args = 1..)]
        books: Vec<String>,
    },
    /// Manage the metadata cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Delete entries older than the configured TTL
    Sweep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum By {
    Any,
    Title,
    Author,
}
impl From<By> for SearchField {
    fn from(by: By) -> Self {
        match by {
            By::Any => SearchField::Any,
            By::Title => SearchField::Title,
            By::Author => SearchField::Author,
        }
    }
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub(crate) fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
