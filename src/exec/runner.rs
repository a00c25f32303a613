// src/exec/runner.rs

//! Single-attempt process runner.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::ExitStatus;

use chrono::Utc;
use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::errors::{KapoError, Result};
use crate::exec::backend::{Launcher, Outcome, RunRequest};
use crate::exec::exit::classify;
use crate::exec::resolve::resolve_executable;
use crate::server::ACTIVATION_ENV;
use crate::status::{Attempt, StatusRegistry, UNKNOWN_EXIT_CODE};
use crate::types::RunState;

/// Spawns children and records each attempt in the registry it owns.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    registry: StatusRegistry,
}

impl ProcessRunner {
    pub fn new(registry: StatusRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    /// Run one attempt to completion.
    ///
    /// - Resolution or spawn failure returns `KapoError::Launch` and leaves
    ///   the registry untouched.
    /// - With a TTL, the deadline counts from just before spawn. On expiry
    ///   the configured signal is sent once and the child is then awaited.
    /// - The record is finished from the child's real wait status, so a
    ///   child that exits on its own right at the deadline is `Stopped`.
    ///
    /// The child is spawned with `kill_on_drop`, so dropping this future
    /// (program shutdown) kills it.
    pub async fn execute(&self, request: &RunRequest) -> Result<Outcome> {
        let path = resolve_executable(&request.command)?;
        let command = path.display().to_string();

        let mut cmd = Command::new(&path);
        cmd.args(&request.arguments).kill_on_drop(true);
        for var in ACTIVATION_ENV {
            cmd.env_remove(var);
        }

        let started = Instant::now();
        let start_time = Utc::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| KapoError::launch(&command, format!("failed to start: {e}")))?;
        let pid = child.id();

        let record = self.registry.begin(
            Attempt::new(request.mode, command.clone(), request.arguments.clone())
                .ttl(request.ttl)
                .wait(request.wait)
                .pid(pid)
                .started_at(start_time),
        );

        info!(
            command = %command,
            args = ?request.arguments,
            pid,
            mode = %request.mode,
            "executing process"
        );
        if !request.ttl.is_zero() {
            info!(
                command = %command,
                ttl_secs = request.ttl.as_secs(),
                "stopping execution after TTL expires"
            );
        }

        let status = match wait_for_exit(&mut child, request, started).await {
            Ok(status) => status,
            Err(e) => {
                error!(command = %command, pid, error = %e, "failed waiting for process");
                self.registry
                    .finish(record, UNKNOWN_EXIT_CODE, RunState::Stopped);
                return Err(KapoError::IoError(e));
            }
        };

        let (exit_code, state) = classify(status);
        self.registry.finish(record, exit_code, state);

        info!(
            command = %command,
            pid,
            exit_code,
            state = ?state,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "process exited"
        );

        Ok(Outcome {
            record,
            exit_code,
            state,
        })
    }
}

impl Launcher for ProcessRunner {
    fn launch<'a>(
        &'a self,
        request: &'a RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}

/// Wait for `child`, enforcing the request's TTL when one is set.
async fn wait_for_exit(
    child: &mut Child,
    request: &RunRequest,
    started: Instant,
) -> io::Result<ExitStatus> {
    if request.ttl.is_zero() {
        return child.wait().await;
    }

    tokio::select! {
        status = child.wait() => return status,
        _ = sleep_until(started + request.ttl) => {}
    }

    info!(pid = child.id(), "TTL expired; terminating process");
    terminate(child, request.ttl_signal);
    child.wait().await
}

/// Deliver the termination signal once. The child has not been reaped yet,
/// so its pid cannot have been reused; a child that already exited is a
/// no-op.
#[cfg(unix)]
fn terminate(child: &mut Child, signal: i32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        debug!("process already reaped; nothing to terminate");
        return;
    };
    let signal = Signal::try_from(signal).unwrap_or(Signal::SIGKILL);

    match kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => debug!(pid, ?signal, "termination signal sent"),
        Err(Errno::ESRCH) => debug!(pid, "process already exited before termination"),
        Err(e) => warn!(pid, error = %e, "failed to signal process"),
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child, _signal: i32) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "process already exited before termination");
    }
}
