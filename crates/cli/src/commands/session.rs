// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pac session spawn|send|alive|respawn` — drive a worker session through
//! the tmux-backed Session Host Adapter, persisting
//! respawn-cap bookkeeping into the Identity Registry so the cap survives
//! across CLI invocations.

use crate::exit_error::ExitError;
use clap::{Args, Subcommand};
use pac_adapters::{ReservedPrefixGuard, SessionHost, TmuxSessionHost};
use pac_core::{Identity, PacConfig, Role};
use pac_store::IdentityRegistry;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a new session and register its identity.
    Spawn {
        #[arg(long)]
        role: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        worktree: std::path::PathBuf,
        #[arg(long)]
        initial_input: Option<String>,
    },
    /// Send keystrokes to a live session.
    Send {
        #[arg(long)]
        role: String,
        #[arg(long)]
        name: String,
        keystrokes: String,
    },
    /// Report whether a session is alive.
    Alive {
        #[arg(long)]
        role: String,
        #[arg(long)]
        name: String,
    },
    /// Recreate a dead session, refusing once its respawn cap is reached.
    Respawn {
        #[arg(long)]
        role: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        worktree: std::path::PathBuf,
        #[arg(long)]
        initial_input: Option<String>,
        #[arg(long, default_value_t = 3)]
        max_respawn: u32,
    },
}

fn session_host(config: &PacConfig) -> ReservedPrefixGuard<TmuxSessionHost> {
    ReservedPrefixGuard::new(TmuxSessionHost::new(), config.reserved_session_prefixes.clone())
}

fn parse_role(s: &str) -> Result<Role, ExitError> {
    Role::from_str_loose(&s.to_lowercase()).ok_or_else(|| ExitError::usage(format!("unknown role: {s}")))
}

fn session_name(role: Role, name: &str) -> String {
    format!("{role}-{name}")
}

pub async fn handle(args: SessionArgs, config: PacConfig) -> Result<(), ExitError> {
    let registry = IdentityRegistry::new(&config.identities_dir);
    let host = session_host(&config);
    let now = chrono::Utc::now();

    match args.command {
        SessionCommand::Spawn { role, name, worktree, initial_input } => {
            let role = parse_role(&role)?;
            let session = session_name(role, &name);
            host.spawn(&session, &worktree, initial_input.as_deref())
                .await
                .map_err(|e| ExitError::failure(format!("failed to spawn session: {e}")))?;
            let identity = Identity::new(role, &name, &session, worktree.display().to_string(), now);
            registry.create(&identity).map_err(|e| ExitError::failure(format!("failed to register identity: {e}")))?;
            println!("spawned {session}");
            Ok(())
        }
        SessionCommand::Send { role, name, keystrokes } => {
            let role = parse_role(&role)?;
            let session = session_name(role, &name);
            host.send(&session, &keystrokes).await.map_err(|e| ExitError::failure(format!("failed to send to session: {e}")))?;
            Ok(())
        }
        SessionCommand::Alive { role, name } => {
            let role = parse_role(&role)?;
            let session = session_name(role, &name);
            let alive = host.is_alive(&session).await.map_err(|e| ExitError::failure(format!("failed to check session: {e}")))?;
            println!("{}", if alive { "alive" } else { "dead" });
            if alive {
                Ok(())
            } else {
                Err(ExitError::failure(format!("session {session} is not alive")))
            }
        }
        SessionCommand::Respawn { role, name, worktree, initial_input, max_respawn } => {
            let role = parse_role(&role)?;
            let session = session_name(role, &name);
            let identity = registry.read(role, &name).map_err(|e| ExitError::failure(format!("no registered identity for {session}: {e}")))?;
            let respawn_count: u32 = identity.metadata.get("respawn_count").and_then(|s| s.parse().ok()).unwrap_or(0);

            let outcome = host
                .respawn(&session, &worktree, initial_input.as_deref(), respawn_count, max_respawn)
                .await
                .map_err(|e| ExitError::failure(format!("failed to respawn session: {e}")))?;

            match outcome {
                pac_adapters::RespawnOutcome::AlreadyAlive => {
                    println!("{session} is already alive");
                }
                pac_adapters::RespawnOutcome::Respawned { new_count } => {
                    let mut identity = identity;
                    identity.metadata.insert("respawn_count".to_string(), new_count.to_string());
                    identity.last_heartbeat = now;
                    registry.create(&identity).map_err(|e| ExitError::failure(format!("failed to update identity: {e}")))?;
                    println!("respawned {session} (respawn_count={new_count})");
                }
            }
            Ok(())
        }
    }
}
