//! `pac session` reserved-name rejection. Every scenario here must be
//! answerable without a real tmux on the test host: `ReservedPrefixGuard`
//! checks the name before delegating to the inner `SessionHost`, so a
//! reserved name never reaches a `tmux` invocation.

use crate::prelude::*;

#[test]
fn spawning_a_runner_prefixed_session_is_rejected_before_touching_tmux() {
    let project = Project::empty();
    let worktree = project.path().join("worktree");
    std::fs::create_dir_all(&worktree).unwrap();

    project
        .pac()
        .args(&["session", "spawn", "--role", "runner", "--name", "main", "--worktree", worktree.to_str().unwrap()])
        .fails()
        .stderr_has("reserved prefix");
}

#[test]
fn spawning_a_guardian_prefixed_session_is_rejected() {
    let project = Project::empty();
    let worktree = project.path().join("worktree");
    std::fs::create_dir_all(&worktree).unwrap();

    project
        .pac()
        .args(&["session", "spawn", "--role", "guardian", "--name", "main", "--worktree", worktree.to_str().unwrap()])
        .fails()
        .stderr_has("reserved prefix");
}

#[test]
fn sending_to_a_system_prefixed_session_is_rejected() {
    let project = Project::empty();
    project.pac().args(&["session", "send", "--role", "system", "--name", "daemon", "hello"]).fails().stderr_has("reserved prefix");
}

#[test]
fn spawn_rejects_an_unknown_role() {
    let project = Project::empty();
    let worktree = project.path().join("worktree");
    std::fs::create_dir_all(&worktree).unwrap();

    project
        .pac()
        .args(&["session", "spawn", "--role", "bogus", "--name", "main", "--worktree", worktree.to_str().unwrap()])
        .fails()
        .stderr_has("unknown role");
}

#[test]
fn respawn_without_a_registered_identity_fails() {
    let project = Project::empty();
    let worktree = project.path().join("worktree");
    std::fs::create_dir_all(&worktree).unwrap();

    project
        .pac()
        .args(&["session", "respawn", "--role", "terminal", "--name", "ghost", "--worktree", worktree.to_str().unwrap()])
        .fails()
        .stderr_has("no registered identity");
}
