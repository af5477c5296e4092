//! Fay CLI - runs the event dispatch walkthrough and a concurrency check.
//!
//! `fay demo` subscribes one observer, dispatches a few events and prints
//! what the observer received. `fay concurrent` hammers a shared manager from
//! several threads and verifies the delivery counts.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fay_events::{EventManager, SingleThreadedEventManager};
use fay_telemetry::LogFormat;

mod concurrent;
mod config;
mod demo;

use config::ThreadingMode;

/// Fay - synchronous typed event dispatch
#[derive(Parser)]
#[command(name = "fay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file (defaults to ./fay.toml if present)
    #[arg(short, long, global = true, env = "FAY_CONFIG")]
    config: Option<PathBuf>,

    /// Use the single-threaded manager, which takes no locks
    #[arg(long, global = true)]
    single_threaded: bool,

    /// Log format: pretty, compact, json or full
    #[arg(
        long,
        global = true,
        value_parser = ["pretty", "compact", "json", "full"]
    )]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the subscribe/dispatch/unsubscribe walkthrough (default)
    Demo,

    /// Dispatch from many threads at once and verify delivery counts
    Concurrent {
        /// Number of dispatcher threads
        #[arg(short, long, default_value = "8")]
        threads: usize,

        /// Events each thread dispatches
        #[arg(short, long, default_value = "1000")]
        rounds: usize,
    },
}

fn parse_log_format(name: &str) -> LogFormat {
    match name {
        "json" => LogFormat::Json,
        "compact" => LogFormat::Compact,
        "full" => LogFormat::Full,
        _ => LogFormat::Pretty,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Command-line flags win over the file.
    if cli.verbose {
        "debug".clone_into(&mut cfg.logging.level);
    }
    if let Some(format) = cli.log_format.as_deref() {
        cfg.logging.format = parse_log_format(format);
    }
    if cli.single_threaded {
        cfg.manager.threading = ThreadingMode::Single;
    }

    if let Err(e) = fay_telemetry::setup_logging(&cfg.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let capacity = cfg.manager.initial_capacity;
    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            let lines = match cfg.manager.threading {
                ThreadingMode::Multi => demo::run(&EventManager::with_capacity(capacity))?,
                ThreadingMode::Single => {
                    let manager: SingleThreadedEventManager =
                        SingleThreadedEventManager::with_capacity(capacity);
                    demo::run(&manager)?
                },
            };
            for line in lines {
                println!("{line}");
            }
        },
        Commands::Concurrent { threads, rounds } => {
            if cfg.manager.threading == ThreadingMode::Single {
                bail!("`concurrent` needs the multi-threaded manager; drop --single-threaded");
            }
            let manager = EventManager::with_capacity(capacity);
            let report = concurrent::run(&manager, threads, rounds)?;
            println!("{report}");
        },
    }

    Ok(())
}
