// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pac guardian status|list|verify-chain|audit` — read-only queries over
//! persisted runner state and the audit log.

use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, OutputFormat};
use clap::{Args, Subcommand};
use pac_core::PacConfig;
use pac_store::{AuditLog, ChainVerdict, RunnerStateStore};
use pac_wire::{AuditEntryView, ChainVerdictView, PipelineHealthView};

#[derive(Args)]
pub struct GuardianArgs {
    #[command(subcommand)]
    pub command: GuardianCommand,
}

#[derive(Subcommand)]
pub enum GuardianCommand {
    /// Report one pipeline's health label.
    Status {
        pipeline_id: String,
        #[arg(long)]
        json: bool,
    },
    /// List every known pipeline, most recently updated first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Walk a pipeline's audit log and verify the hash chain is intact.
    VerifyChain {
        pipeline_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the last N audit entries, oldest first.
    Audit {
        pipeline_id: String,
        #[arg(long, default_value_t = 20)]
        tail: usize,
        #[arg(long)]
        json: bool,
    },
}

fn format_of(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

fn audit_log_for(config: &PacConfig, pipeline_id: &str) -> AuditLog {
    AuditLog::new(config.state_dir.join(format!("{pipeline_id}-audit.jsonl")))
}

pub fn handle(args: GuardianArgs, config: PacConfig) -> Result<(), ExitError> {
    let state_store = RunnerStateStore::new(&config.state_dir);
    let now = chrono::Utc::now();

    match args.command {
        GuardianCommand::Status { pipeline_id, json } => {
            let state = state_store.load(&pipeline_id).map_err(|e| ExitError::failure(format!("{e}")))?;
            let view = PipelineHealthView::compute(&state, now, &config);
            format_or_json(format_of(json), &view, || {
                println!("{}: {} (updated {}s ago)", view.pipeline_id, view.health, view.age_seconds);
            })
            .map_err(ExitError::from)
        }
        GuardianCommand::List { json } => {
            let mut states = state_store.list_all().map_err(|e| ExitError::failure(format!("{e}")))?;
            states.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            let views: Vec<PipelineHealthView> = states.iter().map(|s| PipelineHealthView::compute(s, now, &config)).collect();
            handle_list(format_of(json), &views, "no pipelines found", |views| {
                for view in views {
                    println!("{:<20} {:<10} updated {}s ago", view.pipeline_id, view.health.to_string(), view.age_seconds);
                }
            })
            .map_err(ExitError::from)
        }
        GuardianCommand::VerifyChain { pipeline_id, json } => {
            let verdict = match audit_log_for(&config, &pipeline_id).verify_chain().map_err(|e| ExitError::failure(format!("{e}")))? {
                ChainVerdict::Intact => ChainVerdictView::intact(),
                ChainVerdict::Broken { line, reason } => ChainVerdictView::broken(line, reason),
            };
            let ok = verdict.ok;
            format_or_json(format_of(json), &verdict, || println!("{}", verdict.message)).map_err(ExitError::from)?;
            if ok {
                Ok(())
            } else {
                Err(ExitError::failure("audit chain is broken"))
            }
        }
        GuardianCommand::Audit { pipeline_id, tail, json } => {
            let entries: Vec<AuditEntryView> =
                audit_log_for(&config, &pipeline_id).tail(tail).map_err(|e| ExitError::failure(format!("{e}")))?.iter().map(AuditEntryView::from).collect();
            handle_list(format_of(json), &entries, "no audit entries found", |entries| {
                for e in entries {
                    println!("{} {} {:?}->{:?} by {}", e.timestamp.to_rfc3339(), e.node_id, e.from_status, e.to_status, e.agent_id);
                }
            })
            .map_err(ExitError::from)
        }
    }
}
