//! CLI command definitions and dispatch for the `librarian` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod books;
pub mod ingest;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Conversational book recommendations grounded in your catalog.
#[derive(Parser)]
#[command(name = "librarian", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log warnings and errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// More log output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(
        long,
        global = true,
        env = "LIBRARIAN_OTEL",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Host to bind to (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Ingest once at startup but do not watch the catalog for changes.
        #[arg(long)]
        no_reconcile: bool,
    },

    /// Ingest the catalog file into the similarity index.
    Ingest {
        /// Catalog JSON file (overrides `catalog.path`).
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Drop the index first and embed the whole catalog again.
        #[arg(long)]
        rebuild: bool,
    },

    /// Ask the librarian a single question.
    Ask {
        /// User id the conversation belongs to.
        #[arg(long)]
        user: String,

        /// Print the answer as it is generated.
        #[arg(long)]
        stream: bool,

        /// The message to send.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// List the titles in the catalog.
    Books,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
