use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use kapo::errors::{KapoError, Result};
use kapo::exec::{Launcher, Outcome, RunRequest};
use kapo::status::{Attempt, StatusRegistry, UNKNOWN_EXIT_CODE};
use kapo::types::RunState;

/// One scripted attempt result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    Exit(i32),
    Killed(i32),
    LaunchError,
    /// The attempt starts, then waiting on it fails (not a launch error).
    IoError,
}

/// A launcher that does not spawn anything:
/// - records every request it receives
/// - plays back scripted outcomes in order (`Exit(0)` once exhausted)
/// - writes a record per successful attempt, like the real runner.
#[derive(Clone)]
pub struct ScriptedLauncher {
    registry: StatusRegistry,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    launched: Arc<Mutex<Vec<RunRequest>>>,
}

impl ScriptedLauncher {
    pub fn new(registry: StatusRegistry, script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            registry,
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the requests seen so far.
    pub fn launched(&self) -> Arc<Mutex<Vec<RunRequest>>> {
        Arc::clone(&self.launched)
    }
}

impl Launcher for ScriptedLauncher {
    fn launch<'a>(
        &'a self,
        request: &'a RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        Box::pin(async move {
            self.launched.lock().unwrap().push(request.clone());
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Scripted::Exit(0));

            let (exit_code, state) = match next {
                Scripted::LaunchError => {
                    return Err(KapoError::launch(&request.command, "scripted launch failure"));
                }
                Scripted::Exit(code) => (code, RunState::Stopped),
                Scripted::Killed(signal) => (signal, RunState::Killed),
                Scripted::IoError => (UNKNOWN_EXIT_CODE, RunState::Stopped),
            };

            let record = self.registry.begin(
                Attempt::new(request.mode, request.command.clone(), request.arguments.clone())
                    .ttl(request.ttl)
                    .wait(request.wait),
            );
            // Yield so concurrent observers get a chance to see the running record.
            tokio::task::yield_now().await;
            self.registry.finish(record, exit_code, state);

            if next == Scripted::IoError {
                return Err(KapoError::IoError(io::Error::other("scripted wait failure")));
            }

            Ok(Outcome {
                record,
                exit_code,
                state,
            })
        })
    }
}
