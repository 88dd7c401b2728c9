//! `pac runner run` driving the reactive planning loop against small DAGs.

use crate::prelude::*;

#[test]
fn minimal_dag_completes_within_a_bounded_number_of_cycles() {
    let project = Project::empty();
    let dag_path = project.file("pipelines/minimal.dag", MINIMAL_DAG);

    project
        .pac()
        .args(&["runner", "run", "--pipeline", dag_path.to_str().unwrap(), "--max-iterations", "6"])
        .passes()
        .stdout_has("FINALIZE")
        .stdout_has("every terminal-exit node is validated");
}

#[test]
fn minimal_dag_never_spawns_a_session() {
    let project = Project::empty();
    let dag_path = project.file("pipelines/minimal.dag", MINIMAL_DAG);

    let out = project.pac().args(&["runner", "run", "--pipeline", dag_path.to_str().unwrap(), "--max-iterations", "6"]).passes();

    assert!(!out.stdout().contains("spawn"));
}

#[test]
fn dry_run_does_not_persist_runner_state() {
    let project = Project::empty();
    let dag_path = project.file("pipelines/minimal.dag", MINIMAL_DAG);

    project.pac().args(&["runner", "run", "--pipeline", dag_path.to_str().unwrap(), "--max-iterations", "1", "--dry-run"]).passes();

    assert!(!project.state_dir().join("minimal.json").exists());
}

#[test]
fn max_iterations_stops_a_pipeline_that_cannot_progress() {
    let project = Project::empty();
    let stuck_dag = r#"
        node "start" { handler = "terminal-entry" }
        node "impl_a" { handler = "code-generator" }
        node "wait_for_human" { handler = "human-wait" }
        node "exit" { handler = "terminal-exit" }
        edge { from = "start" to = "impl_a" }
        edge { from = "impl_a" to = "wait_for_human" }
        edge { from = "wait_for_human" to = "exit" }
    "#;
    let dag_path = project.file("pipelines/stuck.dag", stuck_dag);

    let out = project.pac().args(&["runner", "run", "--pipeline", dag_path.to_str().unwrap(), "--max-iterations", "1"]).passes();

    assert!(!out.stdout().contains("every terminal-exit node is validated"));
}

#[test]
fn missing_dag_file_fails_with_a_useful_message() {
    let project = Project::empty();
    let missing = project.path().join("pipelines/does-not-exist.dag");

    project.pac().args(&["runner", "run", "--pipeline", missing.to_str().unwrap(), "--max-iterations", "1"]).fails().stderr_has("runner cycle failed");
}

#[test]
fn pipeline_id_defaults_to_the_dag_file_stem() {
    let project = Project::empty();
    let dag_path = project.file("pipelines/my-pipeline.dag", MINIMAL_DAG);

    project.pac().args(&["runner", "run", "--pipeline", dag_path.to_str().unwrap(), "--max-iterations", "6"]).passes();

    project.pac().args(&["guardian", "status", "my-pipeline"]).passes();
}
