//! `pac guardian status|list|verify-chain|audit` over a pipeline produced by
//! driving `runner run`.

use crate::prelude::*;

fn run_minimal_pipeline(project: &Project) -> String {
    let dag_path = project.file("pipelines/minimal.dag", MINIMAL_DAG);
    project.pac().args(&["runner", "run", "--pipeline", dag_path.to_str().unwrap(), "--max-iterations", "6"]).passes();
    "minimal".to_string()
}

#[test]
fn status_reports_a_health_label_after_a_run() {
    let project = Project::empty();
    let pipeline_id = run_minimal_pipeline(&project);

    project.pac().args(&["guardian", "status", &pipeline_id]).passes().stdout_has(&pipeline_id);
}

#[test]
fn status_on_an_unknown_pipeline_fails() {
    let project = Project::empty();
    project.pac().args(&["guardian", "status", "ghost"]).fails();
}

#[test]
fn list_is_empty_before_any_pipeline_runs() {
    let project = Project::empty();
    project.pac().args(&["guardian", "list"]).passes().stdout_has("no pipelines found");
}

#[test]
fn list_includes_a_pipeline_after_a_run() {
    let project = Project::empty();
    let pipeline_id = run_minimal_pipeline(&project);

    project.pac().args(&["guardian", "list"]).passes().stdout_has(&pipeline_id);
}

#[test]
fn verify_chain_is_intact_after_a_clean_run() {
    let project = Project::empty();
    let pipeline_id = run_minimal_pipeline(&project);

    project.pac().args(&["guardian", "verify-chain", &pipeline_id]).passes();
}

#[test]
fn verify_chain_detects_a_tampered_audit_log() {
    let project = Project::empty();
    let pipeline_id = run_minimal_pipeline(&project);

    let audit_path = project.state_dir().join(format!("{pipeline_id}-audit.jsonl"));
    let mut entries: Vec<String> = std::fs::read_to_string(&audit_path).unwrap().lines().map(|s| s.to_string()).collect();
    assert!(!entries.is_empty(), "a completed run should have appended at least one audit entry");
    let tampered = entries[0].replace("\"agent_id\":\"runner\"", "\"agent_id\":\"attacker\"");
    entries[0] = tampered;
    std::fs::write(&audit_path, entries.join("\n") + "\n").unwrap();

    project.pac().args(&["guardian", "verify-chain", &pipeline_id]).fails().stderr_has("broken");
}

#[test]
fn audit_tail_lists_entries_oldest_first() {
    let project = Project::empty();
    let pipeline_id = run_minimal_pipeline(&project);

    let out = project.pac().args(&["guardian", "audit", &pipeline_id, "--tail", "10"]).passes();
    assert!(out.stdout().contains("start"));
}

#[test]
fn json_format_produces_parseable_output() {
    let project = Project::empty();
    let pipeline_id = run_minimal_pipeline(&project);

    let out = project.pac().args(&["guardian", "status", &pipeline_id, "--json"]).passes();
    let parsed: serde_json::Value = serde_json::from_str(&out.stdout()).expect("guardian status --json should emit valid JSON");
    assert_eq!(parsed["pipeline_id"], pipeline_id);
}
