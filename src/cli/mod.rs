//! CLI module for Newsdesk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Newsdesk - Korean news Q&A
///
/// Ask about the day's news by section, follow up with concept questions,
/// and keep the article store fresh with the built-in crawler.
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NEWSDESK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Ask {
        /// The question to ask, e.g. "오늘 경제 뉴스 알려줘"
        question: String,

        /// Session id; a later `ask` with the same id reuses this run's news context
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive Q&A session
    Chat,

    /// Crawl the latest headlines into the article store
    Crawl {
        /// Sections to crawl, e.g. 경제 (default: all)
        #[arg(short, long)]
        sections: Vec<String>,

        /// Headlines taken per section (defaults to scraper.per_section)
        #[arg(long)]
        per_section: Option<usize>,

        /// Print what would be stored without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Import articles from a JSON array file
    Import {
        /// Path to the JSON file
        file: String,
    },

    /// Show article counts per section
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
