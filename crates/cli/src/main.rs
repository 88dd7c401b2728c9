// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pac`: the command-line entry point for the pipeline runner, the signal
//! bus, and read-only guardian queries.

mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use pac_core::PacConfig;

/// Git commit this binary was built from, embedded by `build.rs`.
pub const BUILD_GIT_HASH: &str = env!("BUILD_GIT_HASH");

#[derive(Parser)]
#[command(name = "pac", version, about = "Pipeline Runner, Guardian, and Signal Bus CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the Pipeline Runner's cycle loop.
    Runner {
        #[command(flatten)]
        args: commands::runner::RunArgs,
    },
    /// Read-only queries over pipeline health and the audit log.
    Guardian(commands::guardian::GuardianArgs),
    /// Read, write, and wait on the signal bus.
    Signal(commands::signal::SignalArgs),
    /// Spawn, message, and supervise worker sessions.
    Session(commands::session::SessionArgs),
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = PacConfig::from_env();

    let result = match cli.command {
        Commands::Runner { args } => commands::runner::handle(args, config).await,
        Commands::Guardian(args) => commands::guardian::handle(args, config),
        Commands::Signal(args) => commands::signal::handle(args, config),
        Commands::Session(args) => commands::session::handle(args, config).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}
