// src/supervise/core.rs

//! Pure supervisor state machine.
//!
//! ```text
//! Idle -> Running -> Terminated -> WaitingRestart -> Running -> ...
//!            \
//!             +--> Halted   (launch failure)
//! ```
//!
//! `Running` covers the whole attempt, spawn included: a [`Launcher`]
//! resolves only once the attempt is over, so the shell cannot observe the
//! spawn separately. A launch failure is therefore reported from `Running`.
//!
//! There is no terminal state while supervision is healthy; only a launch
//! failure reaches `Halted`. No Tokio, no processes: the shell feeds events
//! in and executes the returned directives.
//!
//! [`Launcher`]: crate::exec::Launcher

use std::time::Duration;

use tracing::warn;

use crate::exec::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Terminated,
    WaitingRestart,
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Supervision begins.
    Start,
    /// The executable could not be launched. Never retried.
    LaunchFailed,
    /// The attempt concluded; `None` when it ended in a non-launch error.
    Exited(Option<Outcome>),
    /// The shell has started the restart delay.
    RestartScheduled,
    /// The restart delay is over.
    DelayElapsed,
}

/// What the shell should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Run one attempt to completion.
    Launch,
    /// An attempt ended; a restart follows after the given delay.
    ScheduleRestart(Duration),
    /// Sleep for the given delay.
    Sleep(Duration),
    /// Stop supervising.
    Halt,
    /// The event does not apply in the current state.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct SupervisorCore {
    state: SupervisorState,
    wait: Duration,
    attempts: u64,
    last_outcome: Option<Outcome>,
}

impl SupervisorCore {
    pub fn new(wait: Duration) -> Self {
        Self {
            state: SupervisorState::Idle,
            wait,
            attempts: 0,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Number of attempts that ran to completion.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn step(&mut self, event: SupervisorEvent) -> Directive {
        use SupervisorEvent as E;
        use SupervisorState as S;

        let (next, directive) = match (self.state, event) {
            (S::Idle, E::Start) => (S::Running, Directive::Launch),
            (S::Running, E::LaunchFailed) => (S::Halted, Directive::Halt),
            (S::Running, E::Exited(outcome)) => {
                self.attempts += 1;
                self.last_outcome = outcome;
                (S::Terminated, Directive::ScheduleRestart(self.wait))
            }
            (S::Terminated, E::RestartScheduled) => (S::WaitingRestart, Directive::Sleep(self.wait)),
            (S::WaitingRestart, E::DelayElapsed) => (S::Running, Directive::Launch),
            (state, event) => {
                warn!(?state, ?event, "supervisor event ignored in current state");
                (state, Directive::Ignore)
            }
        };

        self.state = next;
        directive
    }
}
