// src/status/registry.rs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::status::model::{Attempt, Status};
use crate::types::{Mode, RunState};

/// Stable handle for a record, independent of its position in the history.
pub type RecordId = u64;

/// How a snapshot is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Only the current attempt, rendered as a JSON object (run mode).
    Single,
    /// Every retained attempt in order, rendered as a JSON array.
    History,
}

/// Point-in-time copy of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    Single(Option<Status>),
    History(Vec<Status>),
}

#[derive(Debug, Default)]
struct Records {
    entries: VecDeque<(RecordId, Status)>,
    next_id: RecordId,
}

/// Shared, append-only record of attempts.
///
/// All mutations take the lock once and complete before releasing it, so a
/// concurrent [`StatusView::snapshot`] sees each record either entirely
/// before or entirely after an update.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    records: Arc<Mutex<Records>>,
    shape: Shape,
    max_records: Option<usize>,
}

impl StatusRegistry {
    /// `max_records = None` keeps every record. `Shape::Single` always
    /// retains exactly the latest record.
    pub fn new(shape: Shape, max_records: Option<usize>) -> Self {
        let max_records = match shape {
            Shape::Single => Some(1),
            Shape::History => max_records.map(|n| n.max(1)),
        };
        Self {
            records: Arc::new(Mutex::new(Records::default())),
            shape,
            max_records,
        }
    }

    /// Registry shaped for `mode`: single object for run, history otherwise.
    pub fn for_mode(mode: Mode, max_records: Option<usize>) -> Self {
        let shape = match mode {
            Mode::Run => Shape::Single,
            Mode::Supervise | Mode::Watch => Shape::History,
        };
        Self::new(shape, max_records)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Read-only handle for the status server.
    pub fn view(&self) -> StatusView {
        StatusView {
            registry: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        // Records are only ever replaced whole, so a poisoned lock still
        // guards consistent data.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a running record for `attempt` and return its handle.
    pub fn begin(&self, attempt: Attempt) -> RecordId {
        self.push(attempt.into_running())
    }

    /// Append a record that is already terminal, e.g. a watched process
    /// that was gone when first observed. `end_time` equals `start_time`.
    pub fn record_terminal(&self, attempt: Attempt, exit_code: i32, state: RunState) -> RecordId {
        let mut status = attempt.into_running();
        status.end_time = Some(status.start_time);
        status.exit_code = Some(exit_code);
        status.state = state;
        self.push(status)
    }

    fn push(&self, status: Status) -> RecordId {
        let mut records = self.lock();
        let id = records.next_id;
        records.next_id += 1;
        records.entries.push_back((id, status));

        if let Some(max) = self.max_records {
            while records.entries.len() > max {
                if let Some((evicted, _)) = records.entries.pop_front() {
                    debug!(record = evicted, max_records = max, "evicted oldest status record");
                }
            }
        }
        id
    }

    /// Move record `id` to its terminal state, stamping `end_time` now.
    ///
    /// Returns `false` if the record was evicted or is already terminal;
    /// terminal records are never rewritten.
    pub fn finish(&self, id: RecordId, exit_code: i32, state: RunState) -> bool {
        self.finish_at(id, exit_code, state, Utc::now())
    }

    /// As [`finish`](Self::finish) with an explicit end time. An end time
    /// earlier than the start (wall clock stepped back) is clamped.
    pub fn finish_at(
        &self,
        id: RecordId,
        exit_code: i32,
        state: RunState,
        end_time: DateTime<Utc>,
    ) -> bool {
        if !state.is_terminal() {
            warn!(record = id, "refusing to finish a record into the running state");
            return false;
        }

        let mut records = self.lock();
        let Some((_, status)) = records.entries.iter_mut().find(|(rid, _)| *rid == id) else {
            debug!(record = id, "status record no longer retained; dropping update");
            return false;
        };

        if status.state.is_terminal() {
            debug!(record = id, "status record already terminal; ignoring update");
            return false;
        }

        status.end_time = Some(end_time.max(status.start_time));
        status.exit_code = Some(exit_code);
        status.state = state;
        true
    }

    /// Handle of the most recent record, if any.
    pub fn last_id(&self) -> Option<RecordId> {
        self.lock().entries.back().map(|(id, _)| *id)
    }

    /// Copy of the most recent record, if any.
    pub fn last(&self) -> Option<Status> {
        self.lock().entries.back().map(|(_, s)| s.clone())
    }

    pub fn records(&self) -> Vec<Status> {
        self.lock().entries.iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Snapshot {
        let records = self.lock();
        match self.shape {
            Shape::Single => Snapshot::Single(records.entries.back().map(|(_, s)| s.clone())),
            Shape::History => {
                Snapshot::History(records.entries.iter().map(|(_, s)| s.clone()).collect())
            }
        }
    }
}

/// Read-only view of a [`StatusRegistry`].
#[derive(Debug, Clone)]
pub struct StatusView {
    registry: StatusRegistry,
}

impl StatusView {
    pub fn snapshot(&self) -> Snapshot {
        self.registry.snapshot()
    }

    /// JSON encoding of a consistent snapshot. The lock is released before
    /// encoding starts.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.snapshot())
    }
}
