//! `pac signal emit|read|wait` against an isolated signal directory.

use crate::prelude::*;

#[test]
fn emit_then_read_round_trips() {
    let project = Project::empty();

    project
        .pac()
        .args(&["signal", "emit", "--source", "runner", "--target", "guardian", "--type", "runner_heartbeat", "--payload", r#"{"iteration":1}"#])
        .passes();

    project.pac().args(&["signal", "read", "--target", "guardian"]).passes().stdout_has("runner").stdout_has("guardian");
}

#[test]
fn read_with_consume_drains_the_bus() {
    let project = Project::empty();
    project.pac().args(&["signal", "emit", "--source", "runner", "--target", "guardian", "--type", "runner_heartbeat"]).passes();

    project.pac().args(&["signal", "read", "--target", "guardian", "--consume"]).passes();
    project.pac().args(&["signal", "read", "--target", "guardian"]).passes().stdout_has("no pending signals");
}

#[test]
fn read_is_scoped_to_the_requested_target() {
    let project = Project::empty();
    project.pac().args(&["signal", "emit", "--source", "runner", "--target", "guardian", "--type", "runner_heartbeat"]).passes();
    project.pac().args(&["signal", "emit", "--source", "runner", "--target", "terminal", "--type", "runner_heartbeat"]).passes();

    project.pac().args(&["signal", "read", "--target", "channel"]).passes().stdout_has("no pending signals");
}

#[test]
fn wait_returns_a_signal_emitted_from_another_invocation() {
    let project = Project::empty();
    project.pac().args(&["signal", "emit", "--source", "guardian", "--target", "runner", "--type", "escalate"]).passes();

    project
        .pac()
        .args(&["signal", "wait", "--target", "runner", "--timeout-seconds", "2", "--poll-interval-millis", "10"])
        .passes()
        .stdout_has("escalate");
}

#[test]
fn wait_times_out_when_nothing_ever_arrives() {
    let project = Project::empty();
    project.pac().args(&["signal", "wait", "--target", "runner", "--timeout-seconds", "0", "--poll-interval-millis", "10"]).fails().stderr_has("timed out");
}

#[test]
fn emit_rejects_an_unknown_role() {
    let project = Project::empty();
    project.pac().args(&["signal", "emit", "--source", "bogus-role", "--target", "guardian", "--type", "runner_heartbeat"]).fails().stderr_has("unknown role");
}

#[test]
fn emit_rejects_an_unknown_signal_type() {
    let project = Project::empty();
    project.pac().args(&["signal", "emit", "--source", "runner", "--target", "guardian", "--type", "not_a_real_signal"]).fails().stderr_has("unknown signal type");
}

#[test]
fn emit_rejects_malformed_payload_json() {
    let project = Project::empty();
    project
        .pac()
        .args(&["signal", "emit", "--source", "runner", "--target", "guardian", "--type", "runner_heartbeat", "--payload", "{not json"])
        .fails()
        .stderr_has("invalid --payload");
}
