// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal Envelope & Store.

use crate::atomic::write_json_atomic;
use crate::error::{SignalStoreError, StoreIoError};
use pac_core::signal::Role;
use pac_core::Signal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SignalStore {
    dir: PathBuf,
}

impl SignalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn processed_dir(&self) -> PathBuf {
        self.dir.join("processed")
    }

    /// Serialize `signal` and write it with write-then-fsync-then-rename
    /// atomicity. The filename's ISO-8601 prefix plus random suffix make a
    /// lexical sort a chronological sort.
    pub fn write(&self, signal: &Signal) -> Result<PathBuf, SignalStoreError> {
        let path = self.dir.join(signal.filename());
        write_json_atomic(&path, signal).map_err(SignalStoreError::from)?;
        Ok(path)
    }

    /// All signals in the directory whose `target` matches, oldest-first.
    pub fn list(&self, target: Role) -> Result<Vec<(PathBuf, Signal)>, SignalStoreError> {
        let mut out = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(SignalStoreError::from(StoreIoError::from(e))),
        };
        for entry in entries {
            let entry = entry.map_err(|e| SignalStoreError::from(StoreIoError::from(e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_one(&path) {
                Ok(signal) if signal.target == target => out.push((path, signal)),
                Ok(_) => {}
                // Readers tolerate malformed files from concurrent writers/consumers
                // mid-rename; skip rather than fail the whole scan.
                Err(SignalStoreError::MalformedSignal { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        out.sort_by(|a, b| a.1.id.cmp(&b.1.id));
        Ok(out)
    }

    /// All signals targeting `target` sent by `source`, oldest-first.
    pub fn list_from(&self, source: Role, target: Role) -> Result<Vec<(PathBuf, Signal)>, SignalStoreError> {
        Ok(self.list(target)?.into_iter().filter(|(_, s)| s.source == source).collect())
    }

    pub fn read_one(&self, path: &Path) -> Result<Signal, SignalStoreError> {
        let bytes = std::fs::read(path).map_err(|e| SignalStoreError::from(StoreIoError::from(e)))?;
        serde_json::from_slice(&bytes).map_err(|source| SignalStoreError::MalformedSignal { path: path.display().to_string(), source })
    }

    /// Move a consumed signal out of the live directory. Idempotent: a
    /// second call on the same path is a no-op since the file is already gone.
    pub fn consume(&self, path: &Path) -> Result<(), SignalStoreError> {
        if !path.exists() {
            return Ok(());
        }
        let processed = self.processed_dir();
        std::fs::create_dir_all(&processed).map_err(|e| SignalStoreError::from(StoreIoError::from(e)))?;
        let dest = processed.join(path.file_name().unwrap_or_default());
        match std::fs::rename(path, &dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SignalStoreError::from(StoreIoError::from(e))),
        }
    }

    /// Poll `list(target)` until it is non-empty or `timeout` elapses,
    /// returning the oldest signal found.
    pub fn wait(&self, target: Role, timeout: Duration, poll_interval: Duration) -> Result<Option<(PathBuf, Signal)>, SignalStoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            let mut pending = self.list(target)?;
            if !pending.is_empty() {
                return Ok(Some(pending.remove(0)));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(poll_interval.min(deadline.saturating_duration_since(Instant::now())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pac_core::signal::SignalType;
    use std::thread;

    fn mk_signal(source: Role, target: Role, t: chrono::DateTime<chrono::Utc>) -> Signal {
        Signal::new(source, target, SignalType::RunnerHeartbeat, serde_json::json!({}), t)
    }

    #[test]
    fn write_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path());
        let sig = mk_signal(Role::Runner, Role::Guardian, chrono::Utc::now());
        store.write(&sig).unwrap();

        let found = store.list(Role::Guardian).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.id, sig.id);
    }

    #[test]
    fn list_filters_by_target() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path());
        store.write(&mk_signal(Role::Runner, Role::Guardian, chrono::Utc::now())).unwrap();
        store.write(&mk_signal(Role::Runner, Role::Terminal, chrono::Utc::now())).unwrap();

        assert_eq!(store.list(Role::Guardian).unwrap().len(), 1);
        assert_eq!(store.list(Role::Terminal).unwrap().len(), 1);
    }

    #[test]
    fn fifo_per_source_target_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path());
        let t0 = chrono::Utc::now();
        for i in 0..5 {
            let sig = mk_signal(Role::Runner, Role::Guardian, t0 + chrono::Duration::milliseconds(i));
            store.write(&sig).unwrap();
            thread::sleep(Duration::from_millis(1));
        }
        let found = store.list_from(Role::Runner, Role::Guardian).unwrap();
        let ids: Vec<&str> = found.iter().map(|(_, s)| s.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn consume_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path());
        let sig = mk_signal(Role::Runner, Role::Guardian, chrono::Utc::now());
        let path = store.write(&sig).unwrap();
        store.consume(&path).unwrap();
        assert!(store.consume(&path).is_ok());
        assert!(store.list(Role::Guardian).unwrap().is_empty());
    }

    #[test]
    fn wait_times_out_when_nothing_arrives() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path());
        let result = store.wait(Role::Guardian, Duration::from_millis(30), Duration::from_millis(5)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn wait_returns_the_oldest_signal() {
        let dir = tempfile::tempdir().unwrap();
        let store = SignalStore::new(dir.path());
        store.write(&mk_signal(Role::Runner, Role::Guardian, chrono::Utc::now())).unwrap();
        let result = store.wait(Role::Guardian, Duration::from_millis(30), Duration::from_millis(5)).unwrap();
        assert!(result.is_some());
    }

    proptest::proptest! {
        /// `list` filtered by source always yields signals in write order,
        /// whatever the number of writes (spec.md §8 "signal FIFO per channel").
        #[test]
        fn list_from_is_always_write_order(count in 1usize..20) {
            let dir = tempfile::tempdir().unwrap();
            let store = SignalStore::new(dir.path());
            let t0 = chrono::Utc::now();
            let mut written_ids = Vec::with_capacity(count);
            for i in 0..count {
                let sig = mk_signal(Role::Runner, Role::Guardian, t0 + chrono::Duration::milliseconds(i as i64));
                store.write(&sig).unwrap();
                written_ids.push(sig.id.clone());
                thread::sleep(Duration::from_millis(1));
            }
            let found = store.list_from(Role::Runner, Role::Guardian).unwrap();
            let found_ids: Vec<String> = found.into_iter().map(|(_, s)| s.id).collect();
            proptest::prop_assert_eq!(found_ids, written_ids);
        }
    }
}
