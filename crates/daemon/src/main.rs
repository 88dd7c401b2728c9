// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pacd`: the long-running process that watches every registered worker,
//! reacts to signals addressed to the Guardian, and fans outbound events to
//! chat channels and desktop notifications.
//!
//! `pacd` never drives the Pipeline Runner itself — that is the `pac runner
//! run` CLI subcommand's job. This process only watches and reports.

use pac_adapters::{DesktopChannelAdapter, TmuxSessionHost};
use pac_core::PacConfig;
use pac_daemon::{AlwaysPassHook, ChannelBridge, Guardian, NotificationDispatcher};
use pac_store::IdentityRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing(log_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::EnvFilter;
    let file_appender = tracing_appender::rolling::daily(log_dir, "pacd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    guard
}

#[tokio::main]
async fn main() {
    let config = PacConfig::from_env();
    let log_dir = std::env::var("PACD_LOG_DIR").map(PathBuf::from).unwrap_or_else(|_| config.state_dir.join("logs"));
    let _guard = init_tracing(&log_dir);

    tracing::info!(?config, "pacd starting");

    let mut bridge = ChannelBridge::new(&config.signals_dir);
    bridge.register("desktop", Arc::new(DesktopChannelAdapter::new()), "pacd");
    let bridge = Arc::new(bridge);

    let dispatcher = Arc::new(NotificationDispatcher::new(config.notifications_dir.join("sent.jsonl"), config.clone()));
    let guardian = Arc::new(Guardian::new(config.clone(), config.state_dir.clone(), config.signals_dir.clone()));
    let identities = Arc::new(IdentityRegistry::new(&config.identities_dir));
    let session_host: Arc<TmuxSessionHost> = Arc::new(TmuxSessionHost::new());

    let guardian_loop = {
        let guardian = Arc::clone(&guardian);
        let session_host = Arc::clone(&session_host);
        let bridge = Arc::clone(&bridge);
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            loop {
                match guardian.react_once("runner-main", session_host.as_ref(), &AlwaysPassHook, Duration::from_secs(5)).await {
                    Ok(outcome) => tracing::debug!(?outcome, "guardian reaction cycle"),
                    Err(e) => {
                        tracing::error!(error = %e, "guardian reaction cycle failed");
                        dispatcher
                            .dispatch(&bridge, pac_core::SignalType::OrchestratorCrashed, serde_json::json!({"error": e.to_string()}), None, chrono::Utc::now())
                            .await
                            .ok();
                    }
                }
            }
        })
    };

    let stale_worker_sweep = {
        let guardian = Arc::clone(&guardian);
        let identities = Arc::clone(&identities);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let now = chrono::Utc::now();
                if let Err(e) = guardian.escalate_stale_workers(&identities, now, Duration::from_secs(300)) {
                    tracing::error!(error = %e, "stale-worker sweep failed");
                }
            }
        })
    };

    let _ = tokio::join!(guardian_loop, stale_worker_sweep);
}
