//! Powerchip CLI - post generation and operations tools.
//!
//! # Usage
//!
//! ```bash
//! # Generate a carousel now
//! pc-cli generate carousel --count 5
//!
//! # Show when each scheduled post will next be generated
//! pc-cli schedule
//! pc-cli schedule --from 2026-03-02T09:00:00-03:00
//!
//! # Summarize quiz submissions
//! pc-cli quiz-summary --path data/quiz_submissions.jsonl
//! ```
//!
//! # Commands
//!
//! - `generate` - Run the post generator once
//! - `schedule` - Print the next fire time of every weekly trigger
//! - `quiz-summary` - Aggregate the quiz submission log

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use powerchip_core::GenerationKind;

mod commands;

#[derive(Parser)]
#[command(name = "pc-cli")]
#[command(author, version, about = "Powerchip Brasil CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the post generator once and print its result
    Generate {
        /// Post type (`static`, `carousel`, `reels`)
        kind: GenerationKind,

        /// Carousel slide count
        #[arg(short, long)]
        count: Option<u32>,

        /// Reel duration in seconds
        #[arg(short, long)]
        duration: Option<u32>,
    },
    /// Print the next fire time of every scheduled trigger
    Schedule {
        /// Reference time (RFC 3339); defaults to now in local time
        #[arg(long)]
        from: Option<DateTime<FixedOffset>>,
    },
    /// Summarize the quiz submission log
    QuizSummary {
        /// Log file; defaults to `$DATA_DIR/quiz_submissions.jsonl`
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Generate {
            kind,
            count,
            duration,
        } => commands::generate::run(kind, count, duration).await?,
        Commands::Schedule { from } => commands::schedule::print(from),
        Commands::QuizSummary { path } => commands::quiz_summary::print(path).await?,
    }
    Ok(())
}
