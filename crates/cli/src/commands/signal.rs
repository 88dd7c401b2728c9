// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pac signal emit|read|wait` — thin CLI surface over the filesystem-backed
//! signal bus.

use crate::exit_error::ExitError;
use crate::output::{handle_list, OutputFormat};
use clap::{Args, Subcommand};
use pac_core::{PacConfig, Role, Signal, SignalType};
use pac_store::SignalStore;
use pac_wire::SignalView;
use std::time::Duration;

#[derive(Args)]
pub struct SignalArgs {
    #[command(subcommand)]
    pub command: SignalCommand,
}

#[derive(Subcommand)]
pub enum SignalCommand {
    /// Write a new signal onto the bus.
    Emit {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long = "type")]
        signal_type: String,
        /// JSON payload; defaults to `{}`.
        #[arg(long)]
        payload: Option<String>,
    },
    /// List pending signals addressed to a role, oldest first.
    Read {
        #[arg(long)]
        target: String,
        /// Remove each listed signal from the bus after printing it.
        #[arg(long)]
        consume: bool,
        #[arg(long)]
        json: bool,
    },
    /// Block until a signal addressed to a role arrives or the timeout elapses.
    Wait {
        #[arg(long)]
        target: String,
        #[arg(long, default_value_t = 30)]
        timeout_seconds: u64,
        #[arg(long, default_value_t = 500)]
        poll_interval_millis: u64,
        #[arg(long)]
        json: bool,
    },
}

fn parse_role(s: &str) -> Result<Role, ExitError> {
    Role::from_str_loose(&s.to_lowercase()).ok_or_else(|| ExitError::usage(format!("unknown role: {s}")))
}

fn parse_signal_type(s: &str) -> Result<SignalType, ExitError> {
    let quoted = format!("\"{}\"", s.to_uppercase());
    serde_json::from_str(&quoted).map_err(|_| ExitError::usage(format!("unknown signal type: {s}")))
}

pub fn handle(args: SignalArgs, config: PacConfig) -> Result<(), ExitError> {
    let store = SignalStore::new(&config.signals_dir);

    match args.command {
        SignalCommand::Emit { source, target, signal_type, payload } => {
            let source = parse_role(&source)?;
            let target = parse_role(&target)?;
            let signal_type = parse_signal_type(&signal_type)?;
            let payload = match payload {
                Some(text) => serde_json::from_str(&text).map_err(|e| ExitError::usage(format!("invalid --payload JSON: {e}")))?,
                None => serde_json::json!({}),
            };
            let signal = Signal::new(source, target, signal_type, payload, chrono::Utc::now());
            let path = store.write(&signal).map_err(|e| ExitError::failure(format!("failed to write signal: {e}")))?;
            println!("wrote {}", path.display());
            Ok(())
        }
        SignalCommand::Read { target, consume, json } => {
            let target = parse_role(&target)?;
            let pending = store.list(target).map_err(|e| ExitError::failure(format!("failed to list signals: {e}")))?;
            let views: Vec<SignalView> = pending.iter().map(|(_, s)| SignalView::from(s)).collect();
            if consume {
                for (path, _) in &pending {
                    store.consume(path).map_err(|e| ExitError::failure(format!("failed to consume signal: {e}")))?;
                }
            }
            handle_list(format_of(json), &views, "no pending signals", |views| {
                for v in views {
                    println!("{} {:?}->{:?} {:?} {}", v.id, v.source, v.target, v.signal_type, v.payload);
                }
            })
            .map_err(ExitError::from)
        }
        SignalCommand::Wait { target, timeout_seconds, poll_interval_millis, json } => {
            let target = parse_role(&target)?;
            let found = store
                .wait(target, Duration::from_secs(timeout_seconds), Duration::from_millis(poll_interval_millis))
                .map_err(|e| ExitError::failure(format!("failed waiting for signal: {e}")))?;
            match found {
                Some((_, signal)) => {
                    let view = SignalView::from(&signal);
                    crate::output::format_or_json(format_of(json), &view, || {
                        println!("{} {:?}->{:?} {:?} {}", view.id, view.source, view.target, view.signal_type, view.payload);
                    })
                    .map_err(ExitError::from)
                }
                None => Err(ExitError::failure("timed out waiting for a signal")),
            }
        }
    }
}

fn format_of(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}
