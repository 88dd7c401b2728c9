// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pac runner run` — drive the Pipeline Runner's cycle loop to completion
//! or until `--max-iterations` is exhausted.

use crate::exit_error::ExitError;
use clap::Args;
use pac_adapters::{ReservedPrefixGuard, SessionHost, TmuxSessionHost};
use pac_core::clock::SystemClock;
use pac_core::{PacConfig, RunnerState};
use pac_engine::PipelineRunner;
use pac_store::{AuditLog, RunnerStateStore, SignalStore};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the pipeline's DAG file.
    #[arg(long)]
    pub pipeline: std::path::PathBuf,
    /// Pipeline identifier; defaults to the DAG file's stem.
    #[arg(long)]
    pub pipeline_id: Option<String>,
    /// Session id this runner instance is operating under.
    #[arg(long, default_value = "runner-main")]
    pub session_id: String,
    /// Override the directory runner state is persisted under.
    #[arg(long)]
    pub state_dir: Option<std::path::PathBuf>,
    /// Compute and print each cycle's plan without persisting runner state.
    #[arg(long)]
    pub dry_run: bool,
    /// Stop after this many cycles even if the pipeline is not complete.
    #[arg(long)]
    pub max_iterations: Option<u32>,
    #[arg(long, value_enum, default_value_t = crate::output::OutputFormat::Text)]
    pub format: crate::output::OutputFormat,
}

pub async fn handle(args: RunArgs, mut config: PacConfig) -> Result<(), ExitError> {
    if let Some(state_dir) = &args.state_dir {
        config.state_dir = state_dir.clone();
    }

    let pipeline_id = args.pipeline_id.clone().unwrap_or_else(|| {
        args.pipeline.file_stem().and_then(|s| s.to_str()).unwrap_or("pipeline").to_string()
    });

    let state_store = RunnerStateStore::new(&config.state_dir);
    let now = chrono::Utc::now();
    let mut state = match state_store.load(&pipeline_id) {
        Ok(state) => state,
        Err(pac_store::RunnerStateError::NotFound(_)) => {
            RunnerState::new(pipeline_id.clone(), args.pipeline.display().to_string(), args.session_id.clone(), now)
        }
        Err(e) => return Err(ExitError::failure(format!("failed to load runner state: {e}"))),
    };

    let session_host: Arc<dyn SessionHost> =
        Arc::new(ReservedPrefixGuard::new(TmuxSessionHost::new(), config.reserved_session_prefixes.clone()));
    let signal_store = SignalStore::new(&config.signals_dir);
    let audit_log = AuditLog::new(config.state_dir.join(format!("{pipeline_id}-audit.jsonl")));
    let working_dir = args.pipeline.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| std::path::PathBuf::from("."));

    let runner = PipelineRunner::new(config.clone(), SystemClock, session_host, signal_store, audit_log, working_dir);

    let mut iterations: u32 = 0;
    loop {
        let plan = runner
            .cycle(&args.pipeline, &mut state)
            .await
            .map_err(|e| ExitError::failure(format!("runner cycle failed: {e}")))?;

        crate::output::format_or_json(args.format, &plan, || {
            println!("[{}] {}", plan.current_stage, plan.summary);
            for action in &plan.actions {
                println!("  -> {} {}", action.kind.label(), action.node_id);
            }
            for blocked in &plan.blocked_nodes {
                println!("  blocked: {} ({})", blocked.node_id, blocked.reason);
            }
        })
        .map_err(ExitError::from)?;

        if !args.dry_run {
            state_store.save(&state).map_err(|e| ExitError::failure(format!("failed to persist runner state: {e}")))?;
        }

        iterations += 1;
        if plan.pipeline_complete {
            return Ok(());
        }
        if let Some(max) = args.max_iterations {
            if iterations >= max {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
