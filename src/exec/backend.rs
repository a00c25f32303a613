// src/exec/backend.rs

//! Launcher abstraction.
//!
//! The supervisor talks to a `Launcher` instead of spawning processes
//! itself. Production code uses [`ProcessRunner`](super::ProcessRunner);
//! tests provide implementations that script outcomes without touching the
//! OS.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::config::ProcessConfig;
use crate::errors::Result;
use crate::status::RecordId;
use crate::types::{Mode, RunState};

/// Everything needed to launch one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub mode: Mode,
    pub command: String,
    pub arguments: Vec<String>,
    /// `Duration::ZERO` disables the deadline.
    pub ttl: Duration,
    /// Recorded on the status entry; the runner itself never sleeps for it.
    pub wait: Duration,
    /// Raw signal number delivered on TTL expiry.
    pub ttl_signal: i32,
}

impl RunRequest {
    pub fn new(mode: Mode, command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            mode,
            command: command.into(),
            arguments,
            ttl: Duration::ZERO,
            wait: Duration::ZERO,
            ttl_signal: 9,
        }
    }

    /// Build a request with TTL, wait and signal taken from `process`.
    pub fn from_config(
        mode: Mode,
        command: impl Into<String>,
        arguments: Vec<String>,
        process: &ProcessConfig,
    ) -> Self {
        Self {
            ttl: process.ttl,
            wait: process.wait,
            ttl_signal: process.ttl_signal,
            ..Self::new(mode, command, arguments)
        }
    }
}

/// Terminal result of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub record: RecordId,
    pub exit_code: i32,
    pub state: RunState,
}

/// Trait abstracting how one attempt is executed.
///
/// An implementation must append a record for the attempt when the child
/// starts and finish it before resolving. Launch failures are returned as
/// `KapoError::Launch` without any record.
pub trait Launcher: Send + Sync {
    fn launch<'a>(
        &'a self,
        request: &'a RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>>;
}
