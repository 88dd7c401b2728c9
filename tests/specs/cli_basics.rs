//! Top-level CLI ergonomics: help/version surfaces and usage errors that
//! clap itself is responsible for.

use crate::prelude::*;

#[test]
fn no_subcommand_prints_usage_and_fails() {
    cli().fails().stderr_has("Usage");
}

#[test]
fn help_lists_every_subcommand() {
    cli().args(&["--help"]).passes().stdout_has("runner").stdout_has("guardian").stdout_has("signal").stdout_has("session");
}

#[test]
fn version_flag_passes() {
    cli().args(&["--version"]).passes();
}

#[test]
fn unknown_subcommand_fails_with_usage_error() {
    cli().args(&["frobnicate"]).fails().stderr_has("unrecognized");
}

#[test]
fn guardian_status_on_unknown_pipeline_fails() {
    let project = Project::empty();
    project.pac().args(&["guardian", "status", "ghost-pipeline"]).fails();
}
