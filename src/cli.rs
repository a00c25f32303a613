// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Global flags go before the subcommand (`kapo -p 8080 run -- ./job`).
//! Every flag has a `KAPO_*` environment fallback. Parsed values become a
//! [`RawConfig`] overlay so the config file and the command line merge in
//! one place.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{
    RawConfig, RawProcessSection, RawServerSection, RawStatusSection, RawWatchSection,
};
use crate::types::{MatchPolicy, Mode};

/// Command-line arguments for `kapo`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "kapo",
    version,
    about = "Run, supervise or watch a process and report its status over HTTP.",
    long_about = None
)]
pub struct CliArgs {
    /// Port to listen on.
    #[arg(short = 'p', long, env = "KAPO_PORT", value_name = "PORT")]
    pub port: Option<u64>,

    /// Bind to interface IP.
    #[arg(short = 'i', long, env = "KAPO_INTERFACE", value_name = "IP")]
    pub interface: Option<String>,

    /// Also bind to the next highest available port.
    #[arg(short = 'b', long, env = "KAPO_SIDEBIND")]
    pub sidebind: bool,

    /// Use systemd socket activation.
    #[arg(short = 's', long, env = "KAPO_SOCKET_ACTIVATION")]
    pub socket_activation: bool,

    /// Optional TOML config file; command-line values take precedence.
    #[arg(long, env = "KAPO_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KAPO_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a command and close the socket on exit.
    #[command(visible_alias = "r")]
    Run {
        /// Stop execution after SECONDS seconds.
        #[arg(short, long, env = "KAPO_TTL", value_name = "SECONDS")]
        ttl: Option<u64>,

        /// Report status for SECONDS seconds after termination.
        #[arg(short, long, env = "KAPO_WAIT", value_name = "SECONDS")]
        wait: Option<u64>,

        /// Signal sent when the TTL expires (name or number).
        #[arg(long, env = "KAPO_TTL_SIGNAL", value_name = "SIGNAL")]
        ttl_signal: Option<String>,

        /// Command to execute, followed by its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        program: Vec<String>,
    },

    /// Run and restart a command continually.
    #[command(visible_alias = "s")]
    Supervise {
        /// Seconds to wait between restarts.
        #[arg(short, long, env = "KAPO_WAIT", value_name = "SECONDS")]
        wait: Option<u64>,

        /// Keep at most N status records.
        #[arg(long, env = "KAPO_MAX_RECORDS", value_name = "N")]
        max_records: Option<usize>,

        /// Command to execute, followed by its arguments.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        program: Vec<String>,
    },

    /// Report status of an externally invoked process.
    #[command(visible_alias = "w")]
    Watch {
        /// Seconds to wait between evaluating the process list.
        #[arg(short, long, env = "KAPO_WAIT", value_name = "SECONDS")]
        wait: Option<u64>,

        /// Limit the watched process to a single pid.
        #[arg(short, long, env = "KAPO_WATCHPID", value_name = "PID")]
        pid: Option<u32>,

        /// How the command is matched against the process list
        /// (exact or regex).
        #[arg(long, env = "KAPO_MATCH_POLICY", value_name = "POLICY")]
        match_policy: Option<MatchPolicy>,

        /// Keep at most N status records.
        #[arg(long, env = "KAPO_MAX_RECORDS", value_name = "N")]
        max_records: Option<usize>,

        /// Command to search for, optionally followed by its arguments.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        program: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// What the core needs from the command line.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub mode: Mode,
    /// Command and its arguments; may be empty in watch mode.
    pub program: Vec<String>,
    pub overrides: RawConfig,
}

impl CliArgs {
    pub fn invocation(&self) -> Invocation {
        let server = RawServerSection {
            interface: self.interface.clone(),
            port: self.port,
            socket_activation: self.socket_activation.then_some(true),
            sidebind: self.sidebind.then_some(true),
        };

        let (mode, program, process, watch, status) = match &self.command {
            Command::Run {
                ttl,
                wait,
                ttl_signal,
                program,
            } => (
                Mode::Run,
                program.clone(),
                RawProcessSection {
                    ttl: *ttl,
                    wait: *wait,
                    ttl_signal: ttl_signal.clone(),
                },
                RawWatchSection::default(),
                RawStatusSection::default(),
            ),
            Command::Supervise {
                wait,
                max_records,
                program,
            } => (
                Mode::Supervise,
                program.clone(),
                RawProcessSection {
                    wait: *wait,
                    ..Default::default()
                },
                RawWatchSection::default(),
                RawStatusSection {
                    max_records: *max_records,
                },
            ),
            Command::Watch {
                wait,
                pid,
                match_policy,
                max_records,
                program,
            } => (
                Mode::Watch,
                program.clone(),
                RawProcessSection {
                    wait: *wait,
                    ..Default::default()
                },
                RawWatchSection {
                    pid: *pid,
                    match_policy: *match_policy,
                },
                RawStatusSection {
                    max_records: *max_records,
                },
            ),
        };

        Invocation {
            mode,
            program,
            overrides: RawConfig {
                server,
                process,
                watch,
                status,
            },
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
