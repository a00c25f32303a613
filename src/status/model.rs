// src/status/model.rs

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::types::{Mode, RunState};

/// Exit code reported for a watched process that stopped. The watcher does
/// not own foreign processes and cannot reap them, so the real code is
/// unavailable.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// One execution attempt (run / supervise) or observation (watch).
///
/// Serialized with camelCase keys; durations are whole seconds and
/// timestamps are RFC 3339 in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub command: String,
    pub arguments: Vec<String>,
    pub start_time: DateTime<Utc>,
    /// `None` while running.
    pub end_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "as_secs")]
    pub ttl: Duration,
    #[serde(serialize_with = "as_secs")]
    pub wait: Duration,
    /// `None` while running.
    pub exit_code: Option<i32>,
    pub state: RunState,
    pub mode: Mode,
    pub pid: Option<u32>,
}

impl Status {
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// Description of an attempt that is about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub command: String,
    pub arguments: Vec<String>,
    pub ttl: Duration,
    pub wait: Duration,
    pub mode: Mode,
    pub pid: Option<u32>,
    pub start_time: DateTime<Utc>,
}

impl Attempt {
    pub fn new(mode: Mode, command: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
            ttl: Duration::ZERO,
            wait: Duration::ZERO,
            mode,
            pid: None,
            start_time: Utc::now(),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    pub fn started_at(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    pub(crate) fn into_running(self) -> Status {
        Status {
            command: self.command,
            arguments: self.arguments,
            start_time: self.start_time,
            end_time: None,
            ttl: self.ttl,
            wait: self.wait,
            exit_code: None,
            state: RunState::Running,
            mode: self.mode,
            pid: self.pid,
        }
    }
}
