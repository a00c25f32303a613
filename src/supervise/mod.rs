// src/supervise/mod.rs

//! Continual supervision.
//!
//! The restart state machine lives in [`core`] and is pure: it consumes
//! [`SupervisorEvent`]s and answers with a [`Directive`] for the shell.
//! The async shell in [`runtime`] performs the directives against a
//! [`Launcher`](crate::exec::Launcher) and the Tokio clock.

pub mod core;
pub mod runtime;

pub use core::{Directive, SupervisorCore, SupervisorEvent, SupervisorState};
pub use runtime::Supervisor;
