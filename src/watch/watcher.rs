// src/watch/watcher.rs

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::errors::Result;
use crate::status::{Attempt, StatusRegistry, UNKNOWN_EXIT_CODE};
use crate::types::{Mode, RunState};
use crate::watch::matcher::Matcher;
use crate::watch::probe::{ProcessInfo, ProcessProbe};

/// What to watch.
#[derive(Debug, Clone)]
pub enum WatchTarget {
    /// A single pid; nothing else is inspected.
    Pid(u32),
    /// Any process matching the search criteria.
    Search {
        command: String,
        arguments: Vec<String>,
        matcher: Matcher,
    },
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub alive: bool,
    /// The process the observation refers to, when one was found.
    pub process: Option<ProcessInfo>,
}

/// Polls a target every `wait` and appends a record whenever its liveness
/// changes.
pub struct Watcher<P: ProcessProbe> {
    target: WatchTarget,
    probe: P,
    registry: StatusRegistry,
    wait: Duration,
}

impl<P: ProcessProbe> fmt::Debug for Watcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("target", &self.target)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl<P: ProcessProbe> Watcher<P> {
    pub fn new(target: WatchTarget, probe: P, registry: StatusRegistry, wait: Duration) -> Self {
        Self {
            target,
            probe,
            registry,
            wait,
        }
    }

    /// Poll forever. The first poll happens immediately.
    pub async fn run(mut self) -> Result<()> {
        info!(target = ?self.target, wait_secs = self.wait.as_secs(), "watching process");
        loop {
            self.poll();
            sleep(self.wait).await;
        }
    }

    /// Observe once and record the observation if it changes the state.
    /// Returns whether the registry changed.
    pub fn poll(&mut self) -> bool {
        let observation = self.observe();
        self.record(observation)
    }

    pub fn observe(&mut self) -> Observation {
        match &self.target {
            WatchTarget::Pid(pid) => {
                let pid = *pid;
                let alive = self.probe.is_alive(pid);
                let process = if alive { self.probe.describe(pid) } else { None };
                Observation { alive, process }
            }
            WatchTarget::Search { matcher, .. } => {
                let last_pid = self.registry.last().filter(|s| s.is_running()).and_then(|s| s.pid);
                let matches: Vec<ProcessInfo> = self
                    .probe
                    .processes()
                    .into_iter()
                    .filter(|p| matcher.matches(p))
                    .collect();
                // Stay with the process already being reported while it lives.
                let process = matches
                    .iter()
                    .find(|p| Some(p.pid) == last_pid)
                    .or_else(|| matches.first())
                    .cloned();
                Observation {
                    alive: process.is_some(),
                    process,
                }
            }
        }
    }

    fn record(&mut self, observation: Observation) -> bool {
        let last = self.registry.last();
        let was_running = last.as_ref().map(|s| s.is_running());
        let observed_pid = observation.process.as_ref().map(|p| p.pid);

        match (was_running, observation.alive) {
            (Some(true), true) => {
                let last_pid = last.and_then(|s| s.pid);
                if last_pid.is_some() && observed_pid.is_some() && last_pid != observed_pid {
                    // A different instance replaced the one being reported.
                    self.finish_last();
                    self.begin(observation.process.as_ref());
                    return true;
                }
                false
            }
            (Some(false), false) => false,
            (None | Some(false), true) => {
                self.begin(observation.process.as_ref());
                true
            }
            (Some(true), false) => {
                self.finish_last();
                true
            }
            (None, false) => {
                let attempt = self.attempt(None);
                info!(command = %attempt.command, pid = attempt.pid, "watched process not running");
                self.registry
                    .record_terminal(attempt, UNKNOWN_EXIT_CODE, RunState::Stopped);
                true
            }
        }
    }

    fn begin(&mut self, process: Option<&ProcessInfo>) {
        let attempt = self.attempt(process);
        info!(command = %attempt.command, pid = attempt.pid, "watched process running");
        self.registry.begin(attempt);
    }

    fn finish_last(&mut self) {
        if let Some(id) = self.registry.last_id() {
            info!(record = id, "watched process stopped");
            self.registry.finish(id, UNKNOWN_EXIT_CODE, RunState::Stopped);
        } else {
            debug!("no record to finish");
        }
    }

    fn attempt(&self, process: Option<&ProcessInfo>) -> Attempt {
        let (command, arguments, pid) = match (&self.target, process) {
            (WatchTarget::Pid(pid), Some(p)) => (p.command(), p.arguments(), Some(*pid)),
            (WatchTarget::Pid(pid), None) => (String::new(), Vec::new(), Some(*pid)),
            (WatchTarget::Search { command, arguments, .. }, p) => {
                (command.clone(), arguments.clone(), p.map(|p| p.pid))
            }
        };
        Attempt::new(Mode::Watch, command, arguments)
            .wait(self.wait)
            .pid(pid)
    }
}
