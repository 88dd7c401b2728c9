// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic persistence for one [`RunnerState`] per pipeline.

use crate::atomic::{read_json, write_json_atomic};
use crate::error::{RunnerStateError, StoreIoError};
use pac_core::RunnerState;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunnerStateStore {
    dir: PathBuf,
}

impl RunnerStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, pipeline_id: &str) -> PathBuf {
        self.dir.join(format!("{pipeline_id}.json"))
    }

    pub fn save(&self, state: &RunnerState) -> Result<(), RunnerStateError> {
        write_json_atomic(&self.path_for(&state.pipeline_id), state).map_err(RunnerStateError::from)
    }

    pub fn load(&self, pipeline_id: &str) -> Result<RunnerState, RunnerStateError> {
        match read_json(&self.path_for(pipeline_id)) {
            Ok(state) => Ok(state),
            Err(StoreIoError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RunnerStateError::NotFound(pipeline_id.to_string()))
            }
            Err(e) => Err(RunnerStateError::from(e)),
        }
    }

    pub fn exists(&self, pipeline_id: &str) -> bool {
        self.path_for(pipeline_id).exists()
    }

    /// Enumerate every persisted `RunnerState`.
    /// Malformed or unreadable files are skipped rather than failing the
    /// whole listing, since this directory may be shared with concurrent
    /// writers.
    pub fn list_all(&self) -> Result<Vec<RunnerState>, RunnerStateError> {
        let mut states = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(states),
            Err(e) => return Err(RunnerStateError::from(StoreIoError::Io(e))),
        };
        for entry in entries {
            let entry = entry.map_err(|e| RunnerStateError::from(StoreIoError::Io(e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(state) = read_json::<RunnerState>(&path) {
                states.push(state);
            }
        }
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunnerStateStore::new(dir.path());
        let now = chrono::Utc::now();
        let state = RunnerState::new("pipe-1", "pipelines/pipe-1.dag", "sess-1", now);
        store.save(&state).unwrap();

        let back = store.load("pipe-1").unwrap();
        assert_eq!(back.session_id, "sess-1");
    }

    #[test]
    fn load_missing_pipeline_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunnerStateStore::new(dir.path());
        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, RunnerStateError::NotFound(_)));
    }

    #[test]
    fn resave_replaces_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunnerStateStore::new(dir.path());
        let now = chrono::Utc::now();
        let mut state = RunnerState::new("pipe-1", "pipelines/pipe-1.dag", "sess-1", now);
        store.save(&state).unwrap();

        state.paused = true;
        store.save(&state).unwrap();

        let back = store.load("pipe-1").unwrap();
        assert!(back.paused);
    }

    #[test]
    fn list_all_returns_every_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunnerStateStore::new(dir.path());
        let now = chrono::Utc::now();
        store.save(&RunnerState::new("pipe-1", "p1.dag", "sess-1", now)).unwrap();
        store.save(&RunnerState::new("pipe-2", "p2.dag", "sess-2", now)).unwrap();

        let mut ids: Vec<String> = store.list_all().unwrap().into_iter().map(|s| s.pipeline_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["pipe-1".to_string(), "pipe-2".to_string()]);
    }

    #[test]
    fn list_all_on_missing_dir_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunnerStateStore::new(dir.path().join("does-not-exist"));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn list_all_skips_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunnerStateStore::new(dir.path());
        let now = chrono::Utc::now();
        store.save(&RunnerState::new("pipe-1", "p1.dag", "sess-1", now)).unwrap();
        std::fs::write(dir.path().join("pipe-1-audit.jsonl"), "not json\n").unwrap();

        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
