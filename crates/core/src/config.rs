// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PacConfig`: every environment-derived constant, read once at startup.
//!
//! Collects every environment-derived constant into one struct built once
//! at process startup and passed by reference into each component. Nothing
//! downstream reads an environment variable directly.

use std::path::PathBuf;
use std::time::Duration;

/// Default retry budget before a node is marked permanently `blocked`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default age (seconds) after which a runner is considered `stale`.
pub const DEFAULT_STALE_SECONDS: u64 = 300;
/// Default maximum age (seconds) of `evidence_timestamp` on a validating transition.
pub const DEFAULT_EVIDENCE_MAX_AGE: u64 = 300;
/// Default notification dedup window (seconds).
pub const DEFAULT_DEDUP_WINDOW_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct PacConfig {
    pub max_retries: u32,
    pub stale_seconds: u64,
    pub evidence_max_age_seconds: u64,
    /// Probability (0.0-1.0) that an accepted transition also gets a
    /// `spot_check_flagged` audit entry appended alongside it.
    pub spot_check_rate: f64,
    pub signals_dir: PathBuf,
    pub state_dir: PathBuf,
    pub identities_dir: PathBuf,
    pub notifications_dir: PathBuf,
    /// Local `HH:MM` quiet-hours window; `None` disables quiet-hours gating.
    pub quiet_start: Option<(u32, u32)>,
    pub quiet_end: Option<(u32, u32)>,
    pub dedup_window_seconds: u64,
    /// Session-name prefixes reserved for system processes. Injected
    /// configuration, not hard-coded in the adapter.
    pub reserved_session_prefixes: Vec<String>,
}

impl Default for PacConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            stale_seconds: DEFAULT_STALE_SECONDS,
            evidence_max_age_seconds: DEFAULT_EVIDENCE_MAX_AGE,
            spot_check_rate: 0.0,
            signals_dir: PathBuf::from("./pac-data/signals"),
            state_dir: PathBuf::from("./pac-data/state"),
            identities_dir: PathBuf::from("./pac-data/identities"),
            notifications_dir: PathBuf::from("./pac-data/notifications"),
            quiet_start: None,
            quiet_end: None,
            dedup_window_seconds: DEFAULT_DEDUP_WINDOW_SECONDS,
            reserved_session_prefixes: vec![
                "runner-".to_string(),
                "guardian-".to_string(),
                "system-".to_string(),
            ],
        }
    }
}

impl PacConfig {
    /// Build a `PacConfig` from the process environment, falling back to
    /// defaults for anything unset or unparseable. Called exactly once, at
    /// process startup, by the CLI/daemon entry points.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_u32("MAX_RETRIES", defaults.max_retries),
            stale_seconds: env_u64("STALE_SECONDS", defaults.stale_seconds),
            evidence_max_age_seconds: env_u64("EVIDENCE_MAX_AGE", defaults.evidence_max_age_seconds),
            spot_check_rate: env_f64("SPOT_CHECK_RATE", defaults.spot_check_rate),
            signals_dir: env_path("SIGNALS_DIR", &defaults.signals_dir),
            state_dir: env_path("STATE_DIR", &defaults.state_dir),
            identities_dir: env_path("IDENTITIES_DIR", &defaults.identities_dir),
            notifications_dir: env_path("NOTIFICATIONS_DIR", &defaults.notifications_dir),
            quiet_start: std::env::var("QUIET_START").ok().and_then(|s| parse_hhmm(&s)),
            quiet_end: std::env::var("QUIET_END").ok().and_then(|s| parse_hhmm(&s)),
            dedup_window_seconds: env_u64("DEDUP_WINDOW_SECONDS", defaults.dedup_window_seconds),
            reserved_session_prefixes: defaults.reserved_session_prefixes,
        }
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_seconds)
    }

    pub fn evidence_max_age(&self) -> Duration {
        Duration::from_secs(self.evidence_max_age_seconds)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_seconds)
    }

    pub fn is_reserved_session_name(&self, name: &str) -> bool {
        self.reserved_session_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Parse an `HH:MM` local-time string into `(hour, minute)`.
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h < 24 && m < 60 {
        Some((h, m))
    } else {
        None
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_path(key: &str, default: &PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| default.clone())
}
