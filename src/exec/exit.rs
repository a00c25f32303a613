// src/exec/exit.rs

//! Exit status classification.
//!
//! Normal exit reports the child's own exit code with state `Stopped`.
//! A signal-terminated child is `Killed` and reports the raw POSIX wait
//! status: the signal number, plus `0x80` when a core was dumped. So
//! SIGKILL reports 9 and SIGTERM 15. Platforms without signals report `-1`
//! when no exit code is available.

use std::process::ExitStatus;

use crate::exec::backend::Outcome;
use crate::types::RunState;

#[cfg(unix)]
pub fn classify(status: ExitStatus) -> (i32, RunState) {
    use std::os::unix::process::ExitStatusExt;

    match status.code() {
        Some(code) => (code, RunState::Stopped),
        None => (status.into_raw(), RunState::Killed),
    }
}

#[cfg(not(unix))]
pub fn classify(status: ExitStatus) -> (i32, RunState) {
    match status.code() {
        Some(code) => (code, RunState::Stopped),
        None => (-1, RunState::Killed),
    }
}

/// Exit status for kapo itself after a run-mode attempt: the attempt's
/// code truncated to a single byte.
pub fn process_exit_code(outcome: &Outcome) -> i32 {
    outcome.exit_code & 0xff
}
