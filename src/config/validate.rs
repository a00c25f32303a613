// src/config/validate.rs

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::config::model::{
    Config, DEFAULT_INTERFACE, DEFAULT_PORT, DEFAULT_TTL_SIGNAL, ProcessConfig, RawConfig,
    ServerConfig, StatusConfig, WatchConfig,
};
use crate::errors::{KapoError, Result};
use crate::types::Mode;

/// Seconds between restarts / polls when nothing is configured.
const DEFAULT_LOOP_WAIT_SECS: u64 = 5;

/// Turn a raw (file + CLI) configuration into a validated [`Config`] for
/// the given mode.
///
/// Mode-dependent rules:
/// - `wait` defaults to 0 in run mode and 5 seconds otherwise.
/// - `ttl` only applies to run mode; it is forced to zero elsewhere.
/// - `wait = 0` is rejected in watch mode, and in supervise mode unless
///   `max_records` bounds the history.
/// - `max_records` is forced to 1 in run mode.
pub fn validate_config(raw: &RawConfig, mode: Mode) -> Result<Config> {
    Ok(Config {
        server: validate_server(raw)?,
        process: validate_process(raw, mode)?,
        watch: WatchConfig {
            pid: raw.watch.pid.filter(|pid| *pid != 0),
            match_policy: raw.watch.match_policy.unwrap_or_default(),
        },
        status: validate_status(raw, mode)?,
    })
}

fn validate_server(raw: &RawConfig) -> Result<ServerConfig> {
    let interface = raw
        .server
        .interface
        .as_deref()
        .unwrap_or(DEFAULT_INTERFACE)
        .trim();
    let ip: IpAddr = interface.parse().map_err(|_| {
        KapoError::ConfigError(format!(
            "[server].interface must be an IP address (got '{interface}')"
        ))
    })?;

    let port = raw.server.port.unwrap_or(u64::from(DEFAULT_PORT));
    let port = u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| {
            KapoError::ConfigError(format!("[server].port must be in 1..=65535 (got {port})"))
        })?;

    Ok(ServerConfig {
        bind: SocketAddr::new(ip, port),
        socket_activation: raw.server.socket_activation.unwrap_or(false),
        sidebind: raw.server.sidebind.unwrap_or(false),
    })
}

fn validate_process(raw: &RawConfig, mode: Mode) -> Result<ProcessConfig> {
    let ttl = match mode {
        Mode::Run => raw.process.ttl.unwrap_or(0),
        Mode::Supervise | Mode::Watch => 0,
    };

    let default_wait = match mode {
        Mode::Run => 0,
        Mode::Supervise | Mode::Watch => DEFAULT_LOOP_WAIT_SECS,
    };
    let wait = raw.process.wait.unwrap_or(default_wait);

    if mode == Mode::Watch && wait == 0 {
        return Err(KapoError::ConfigError(
            "[process].wait must be >= 1 in watch mode (got 0)".to_string(),
        ));
    }
    // Back-to-back restarts append records as fast as the child exits.
    if mode == Mode::Supervise && wait == 0 && raw.status.max_records.is_none() {
        return Err(KapoError::ConfigError(
            "[process].wait = 0 in supervise mode requires [status].max_records".to_string(),
        ));
    }

    let signal_name = raw
        .process
        .ttl_signal
        .as_deref()
        .unwrap_or(DEFAULT_TTL_SIGNAL);
    let ttl_signal = parse_signal(signal_name)?;

    Ok(ProcessConfig {
        ttl: Duration::from_secs(ttl),
        wait: Duration::from_secs(wait),
        ttl_signal,
    })
}

fn validate_status(raw: &RawConfig, mode: Mode) -> Result<StatusConfig> {
    if raw.status.max_records == Some(0) {
        return Err(KapoError::ConfigError(
            "[status].max_records must be >= 1 (got 0)".to_string(),
        ));
    }

    let max_records = match mode {
        Mode::Run => Some(1),
        Mode::Supervise | Mode::Watch => raw.status.max_records,
    };

    Ok(StatusConfig { max_records })
}

/// Parse a signal given by name (`SIGTERM`, `term`) or number (`15`).
#[cfg(unix)]
pub fn parse_signal(s: &str) -> Result<i32> {
    use std::str::FromStr;

    use nix::sys::signal::Signal;

    let s = s.trim();
    let signal = match s.parse::<i32>() {
        Ok(n) => Signal::try_from(n).ok(),
        Err(_) => {
            let upper = s.to_uppercase();
            let name = if upper.starts_with("SIG") {
                upper
            } else {
                format!("SIG{upper}")
            };
            Signal::from_str(&name).ok()
        }
    };

    signal
        .map(|sig| sig as i32)
        .ok_or_else(|| KapoError::ConfigError(format!("[process].ttl_signal: unknown signal '{s}'")))
}

/// Without POSIX signals the only termination available is a hard kill.
#[cfg(not(unix))]
pub fn parse_signal(s: &str) -> Result<i32> {
    match s.trim().to_uppercase().as_str() {
        "SIGKILL" | "KILL" | "9" => Ok(9),
        other => Err(KapoError::ConfigError(format!(
            "[process].ttl_signal: only SIGKILL is supported on this platform (got '{other}')"
        ))),
    }
}
