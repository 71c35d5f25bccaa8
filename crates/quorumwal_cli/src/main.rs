//! QuorumWAL CLI
//!
//! Command-line tools for inspecting and verifying write-ahead logs.
//!
//! # Commands
//!
//! - `inspect` - List the frames of a log (markers, messages, timestamps)
//! - `verify` - Check frame integrity (checksums, truncation)

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// QuorumWAL command-line log tools.
#[derive(Parser)]
#[command(name = "quorumwal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the frames of a write-ahead log
    Inspect {
        /// WAL directory (containing wal.log) or log file
        path: PathBuf,

        /// Maximum number of frames to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Byte offset to start reading at
        #[arg(short, long, default_value_t = 0)]
        start_offset: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check frame integrity of a write-ahead log
    Verify {
        /// WAL directory (containing wal.log) or log file
        path: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect {
            path,
            limit,
            start_offset,
            format,
        } => commands::inspect::run(&path, limit, start_offset, &format),
        Commands::Verify { path, format } => commands::verify::run(&path, &format),
    }
}
