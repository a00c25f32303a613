// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod server;
pub mod status;
pub mod supervise;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{error, info};

use crate::cli::{CliArgs, Invocation};
use crate::config::{Config, load_and_validate};
use crate::errors::{KapoError, Result};
use crate::exec::{ProcessRunner, RunRequest, process_exit_code};
use crate::server::{StatusServer, SystemdActivation, bind_listeners};
use crate::status::StatusRegistry;
use crate::supervise::Supervisor;
use crate::types::Mode;
use crate::watch::{Matcher, SystemProbe, WatchTarget, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + command line)
/// - the status registry for the selected mode
/// - the status server (started once, before the lifecycle)
/// - exactly one of: a single run, the supervisor loop, the watcher
/// - Ctrl-C / SIGTERM handling
///
/// Returns the exit status for the kapo process.
pub async fn run(args: CliArgs) -> Result<i32> {
    let invocation = args.invocation();
    let config = load_and_validate(
        args.config.as_deref(),
        invocation.overrides.clone(),
        invocation.mode,
    )
    .inspect_err(|e| error!(error = %e, "invalid configuration"))?;

    let registry = StatusRegistry::for_mode(invocation.mode, config.status.max_records);

    let listeners = bind_listeners(&config.server, &SystemdActivation)
        .await
        .inspect_err(|e| error!(error = %e, "cannot start status server"))?;
    let server = StatusServer::spawn(listeners, Arc::new(registry.view()));
    info!(addrs = ?server.local_addrs(), mode = %invocation.mode, "kapo started");

    let lifecycle = drive(&invocation, &config, registry);

    let code = tokio::select! {
        result = lifecycle => result?,
        _ = shutdown_signal() => {
            info!("shutdown requested; stopping");
            0
        }
    };

    server.abort();
    Ok(code)
}

/// Run the lifecycle component for the invocation's mode.
pub async fn drive(
    invocation: &Invocation,
    config: &Config,
    registry: StatusRegistry,
) -> Result<i32> {
    match invocation.mode {
        Mode::Run => run_once(invocation, config, registry).await,
        Mode::Supervise => {
            let request = request_for(invocation, config)?;
            Supervisor::new(ProcessRunner::new(registry), request)
                .run()
                .await?;
            Ok(0)
        }
        Mode::Watch => {
            let target = watch_target(invocation, config)?;
            Watcher::new(target, SystemProbe::new(), registry, config.process.wait)
                .run()
                .await?;
            Ok(0)
        }
    }
}

async fn run_once(
    invocation: &Invocation,
    config: &Config,
    registry: StatusRegistry,
) -> Result<i32> {
    let request = request_for(invocation, config)?;
    let runner = ProcessRunner::new(registry);

    let outcome = runner
        .execute(&request)
        .await
        .inspect_err(|e| error!(error = %e, "run failed"))?;

    if !config.process.wait.is_zero() {
        info!(
            wait_secs = config.process.wait.as_secs(),
            "reporting status before exit"
        );
        sleep(config.process.wait).await;
    }

    Ok(process_exit_code(&outcome))
}

fn request_for(invocation: &Invocation, config: &Config) -> Result<RunRequest> {
    let (command, arguments) = invocation
        .program
        .split_first()
        .ok_or_else(|| KapoError::ConfigError("no command given".to_string()))?;
    Ok(RunRequest::from_config(
        invocation.mode,
        command.clone(),
        arguments.to_vec(),
        &config.process,
    ))
}

fn watch_target(invocation: &Invocation, config: &Config) -> Result<WatchTarget> {
    if let Some(pid) = config.watch.pid {
        return Ok(WatchTarget::Pid(pid));
    }

    let (command, arguments) = invocation.program.split_first().ok_or_else(|| {
        KapoError::ConfigError("watch needs --pid or a command to search for".to_string())
    })?;
    let matcher = Matcher::new(config.watch.match_policy, command, arguments)?;
    Ok(WatchTarget::Search {
        command: command.clone(),
        arguments: arguments.to_vec(),
        matcher,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
