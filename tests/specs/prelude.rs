//! Test helpers for black-box specifications of the `pac` binary.
//!
//! Every scenario drives the compiled `pac` binary as a subprocess against an
//! isolated, per-test workspace (own signals/state/identities/notifications
//! directories) so tests never interfere with each other or a real pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Polling timeout for scenarios that wait on an async effect (e.g. a signal
/// written by one invocation becoming visible to a later `wait` invocation).
pub const SPEC_WAIT_MAX_MS: u64 = 2000;
const SPEC_POLL_INTERVAL_MS: u64 = 10;

/// Poll a condition until it returns true or `timeout_ms` elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// Build a `pac` invocation with no workspace wiring. Most scenarios should
/// go through `Project::pac()` instead; this is for `--help`/`--version`.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    fn new() -> Self {
        Self { cmd: Command::cargo_bin("pac").expect("pac binary should be built") }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.cmd.env(key, value.as_ref());
        self
    }

    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().expect("pac should run");
        assert!(
            output.status.success(),
            "expected `pac` to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().expect("pac should run");
        assert!(
            !output.status.success(),
            "expected `pac` to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run without asserting on the exit code, for scenarios that branch on it.
    pub fn run(mut self) -> RunAssert {
        let output = self.cmd.output().expect("pac should run");
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// An isolated temp workspace: its own signals/state/identities/notifications
/// directories, wired into every `pac` invocation via `Project::pac()`.
pub struct Project {
    root: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("signals")).unwrap();
        std::fs::create_dir_all(root.path().join("state")).unwrap();
        std::fs::create_dir_all(root.path().join("identities")).unwrap();
        std::fs::create_dir_all(root.path().join("notifications")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn signals_dir(&self) -> PathBuf {
        self.root.path().join("signals")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.path().join("state")
    }

    pub fn identities_dir(&self) -> PathBuf {
        self.root.path().join("identities")
    }

    pub fn notifications_dir(&self) -> PathBuf {
        self.root.path().join("notifications")
    }

    /// Write a file at `path` (relative to the project root), creating parent
    /// directories as needed.
    pub fn file(&self, path: impl AsRef<Path>, content: &str) -> PathBuf {
        let full_path = self.root.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        full_path
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.root.path().join(path.as_ref())).unwrap()
    }

    /// A `pac` invocation scoped to this project's directories.
    pub fn pac(&self) -> CliBuilder {
        cli()
            .env("SIGNALS_DIR", self.signals_dir())
            .env("STATE_DIR", self.state_dir())
            .env("IDENTITIES_DIR", self.identities_dir())
            .env("NOTIFICATIONS_DIR", self.notifications_dir())
    }
}

/// A two-node DAG (`start` -> `exit`, both terminal handlers) that completes
/// within a few cycles without spawning any session, since neither node is a
/// `code-generator`.
pub const MINIMAL_DAG: &str = r#"
node "start" {
  handler = "terminal-entry"
}

node "exit" {
  handler = "terminal-exit"
}

edge {
  from = "start"
  to   = "exit"
}
"#;
