//! CLI command definitions using clap.
//!
//! - query: run a listing query from flags or a raw query string
//! - show: resolve a single item by id or slug

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// postloop - run template queries against a content fixture
#[derive(Parser, Debug)]
#[command(name = "postloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Where content comes from
#[derive(Args, Debug, Clone)]
pub struct Source {
    /// Content fixture (YAML or JSON); overrides content.fixture in config
    #[arg(short, long)]
    pub fixture: Option<PathBuf>,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a listing query and walk its loop
    Query {
        /// Content type(s), comma separated, or "any"
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,

        /// Status filter (published, draft, any)
        #[arg(short, long)]
        status: Option<String>,

        /// Author login name
        #[arg(short, long)]
        author: Option<String>,

        /// Search terms; quote phrases, prefix '-' to exclude
        #[arg(long)]
        search: Option<String>,

        /// Order by (date, modified, title, author, id)
        #[arg(long)]
        orderby: Option<String>,

        /// Order direction (asc, desc)
        #[arg(long)]
        order: Option<String>,

        /// Items per page; -1 for all
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        per_page: Option<i64>,

        /// Page number
        #[arg(short, long)]
        page: Option<u32>,

        /// Raw query string (e.g. "post_type=article&posts_per_page=5"); replaces the flags above
        #[arg(long, conflicts_with_all = ["item_type", "status", "author", "search", "orderby", "order", "per_page", "page"])]
        args: Option<String>,

        /// Print each item's body
        #[arg(short, long)]
        full: bool,

        #[command(flatten)]
        source: Source,
    },

    /// Resolve one item by numeric id or slug
    Show {
        /// Item id or slug
        target: String,

        /// Page of a multi-page body to print
        #[arg(short, long)]
        page: Option<u32>,

        #[command(flatten)]
        source: Source,
    },
}
