// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: crawl from one or more seed URLs and print a summary
// - inspect: show how the admission rules see individual URLs
//   (policy verdict, canonical identity, pattern key) without fetching
//
// Rust concepts:
// - Derive macros: clap generates the parser from these types
// - Option<T>: flags the user may leave out (the config file decides then)
// =============================================================================

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "trap-guard",
    version,
    about = "A polite web crawler that stays out of crawler traps",
    long_about = "trap-guard crawls a fixed set of hosts, skipping duplicate pages, thin pages \
                  and endless URL spaces (calendars, paginated listings, session links) by \
                  rate-limiting each URL template."
)]
pub struct Cli {
    /// More log output on stderr (-v = debug, -vv = trace)
    ///
    /// RUST_LOG, when set, takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl starting from one or more seed URLs
    ///
    /// Example: trap-guard crawl https://www.ics.uci.edu --workers 8
    Crawl {
        /// Seed URLs (at least one)
        #[arg(required = true)]
        seeds: Vec<String>,

        /// JSON config file (fields not given keep their defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Pause after each page, per worker, in milliseconds
        #[arg(long)]
        politeness_ms: Option<u64>,

        /// Also crawl subdomains of the allowed hosts
        #[arg(long)]
        include_subdomains: bool,

        /// Print the crawl report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also write the crawl report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show how the admission rules see each URL, without fetching anything
    ///
    /// Example: trap-guard inspect "https://ics.uci.edu/events/2024-01-15?utm_source=x"
    Inspect {
        /// URLs to inspect
        #[arg(required = true)]
        urls: Vec<String>,

        /// JSON config file (fields not given keep their defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also accept subdomains of the allowed hosts
        #[arg(long)]
        include_subdomains: bool,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}
