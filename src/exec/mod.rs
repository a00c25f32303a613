// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`resolve`] finds the executable for a command (LaunchError if absent).
//! - [`exit`] classifies a wait status into `(exit_code, RunState)`.
//! - [`runner`] spawns one child under an optional TTL and records the
//!   attempt in the status registry.
//! - [`backend`] provides the `Launcher` trait the supervisor drives, so
//!   tests can swap in a scripted launcher.

pub mod backend;
pub mod exit;
pub mod resolve;
pub mod runner;

pub use backend::{Launcher, Outcome, RunRequest};
pub use exit::{classify, process_exit_code};
pub use resolve::resolve_executable;
pub use runner::ProcessRunner;
