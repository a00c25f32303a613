// src/supervise/runtime.rs

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::errors::{KapoError, Result};
use crate::exec::{Launcher, RunRequest};

use super::core::{Directive, SupervisorCore, SupervisorEvent};

/// Restarts the requested command forever, `wait` apart.
///
/// This is the IO shell around [`SupervisorCore`]: it launches attempts
/// through the [`Launcher`] and sleeps between them. It only returns on a
/// launch failure; otherwise it runs until the future is dropped.
pub struct Supervisor<L: Launcher> {
    core: SupervisorCore,
    launcher: L,
    request: RunRequest,
}

impl<L: Launcher> fmt::Debug for Supervisor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl<L: Launcher> Supervisor<L> {
    pub fn new(launcher: L, request: RunRequest) -> Self {
        let core = SupervisorCore::new(request.wait);
        Self {
            core,
            launcher,
            request,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            command = %self.request.command,
            wait_secs = self.request.wait.as_secs(),
            "supervising process"
        );

        let mut directive = self.core.step(SupervisorEvent::Start);
        loop {
            directive = match directive {
                Directive::Launch => self.attempt().await?,
                Directive::ScheduleRestart(wait) => {
                    info!(
                        attempts = self.core.attempts(),
                        wait_secs = wait.as_secs(),
                        "process terminated; restarting after delay"
                    );
                    self.core.step(SupervisorEvent::RestartScheduled)
                }
                Directive::Sleep(wait) => {
                    sleep(wait).await;
                    self.core.step(SupervisorEvent::DelayElapsed)
                }
                Directive::Halt => {
                    debug!("supervisor halted");
                    return Ok(());
                }
                Directive::Ignore => {
                    return Err(KapoError::Other(anyhow::anyhow!(
                        "supervisor stalled in state {:?}",
                        self.core.state()
                    )));
                }
            };
        }
    }

    async fn attempt(&mut self) -> Result<Directive> {
        match self.launcher.launch(&self.request).await {
            Ok(outcome) => Ok(self.core.step(SupervisorEvent::Exited(Some(outcome)))),
            Err(err) if err.is_launch() => {
                self.core.step(SupervisorEvent::LaunchFailed);
                error!(
                    command = %self.request.command,
                    error = %err,
                    "cannot launch supervised process; stopping supervision"
                );
                Err(err)
            }
            Err(err) => {
                warn!(
                    command = %self.request.command,
                    error = %err,
                    "supervised attempt failed"
                );
                Ok(self.core.step(SupervisorEvent::Exited(None)))
            }
        }
    }
}
