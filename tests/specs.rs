//! Black-box specifications for the `pac` binary: every scenario shells out
//! to the compiled binary against an isolated temp workspace rather than
//! calling library code directly.

mod prelude;

mod cli_basics;
mod guardian_views;
mod runner_lifecycle;
mod session_guard;
mod signal_bus;
