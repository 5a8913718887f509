//! Relink: storefront URL migration from the command line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use relink::cli::output::OutputSettings;
use relink::cli::{self, Workspace};
use relink::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relink")]
#[command(about = "Match legacy storefront URLs to a new sitemap and export redirects")]
#[command(version)]
struct Cli {
    /// Output JSON on stdout instead of human text
    #[arg(long, global = true)]
    json: bool,

    /// Suppress human output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging and extra detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the database and session file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Session id to use instead of the stored one
    #[arg(long, global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue legacy URLs, one per line, from a file or `-` for stdin
    Add {
        /// Input file
        input: String,
    },

    /// Load the new sitemap(s) and match every queued URL
    Match {
        /// Sitemap or sitemap index URL (repeatable)
        #[arg(short, long = "sitemap", required = true)]
        sitemaps: Vec<String>,

        /// Sample at most this many entries per sitemap document
        #[arg(long)]
        fast_mode: Option<usize>,
    },

    /// Show catalog and locale statistics without matching
    Inspect {
        /// Sitemap or sitemap index URL (repeatable)
        #[arg(short, long = "sitemap", required = true)]
        sitemaps: Vec<String>,

        /// Sample at most this many entries per sitemap document
        #[arg(long)]
        fast_mode: Option<usize>,
    },

    /// Show match statistics for the session
    Stats,

    /// List matched redirects, best score first
    List {
        /// Minimum score to include
        #[arg(long, default_value = "0")]
        min_score: u8,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write the redirect CSV
    Export {
        /// Output file, `-` for stdout (default: redirects-<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every URL of the session
    Clear,

    /// Delete records of all sessions older than the retention window
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    cli::output::init(OutputSettings {
        json: args.json,
        quiet: args.quiet,
        verbose: args.verbose,
        no_color: args.no_color,
    });

    let level = if args.verbose { "relink=debug" } else { "relink=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    let ws = Workspace::open(config, args.session.as_deref())?;

    match args.command {
        Commands::Add { input } => cli::add_cmd::run(&ws, &input).await,
        Commands::Match { sitemaps, fast_mode } => cli::match_cmd::run(&ws, &sitemaps, fast_mode).await,
        Commands::Inspect { sitemaps, fast_mode } => cli::inspect_cmd::run(&ws, &sitemaps, fast_mode).await,
        Commands::Stats => cli::stats_cmd::run(&ws).await,
        Commands::List { min_score, limit } => cli::stats_cmd::run_list(&ws, min_score, limit).await,
        Commands::Export { output } => cli::export_cmd::run(&ws, output).await,
        Commands::Clear => cli::clear_cmd::run_clear(&ws).await,
        Commands::Purge => cli::clear_cmd::run_purge(&ws).await,
    }
}
