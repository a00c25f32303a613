// src/config/model.rs

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::types::MatchPolicy;

pub const DEFAULT_INTERFACE: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 6666;
pub const DEFAULT_TTL_SIGNAL: &str = "SIGKILL";

/// Configuration as read from an optional TOML file and then overlaid with
/// command-line values.
///
/// ```toml
/// [server]
/// interface = "127.0.0.1"
/// port = 6666
/// socket_activation = false
/// sidebind = false
///
/// [process]
/// ttl = 0
/// wait = 5
/// ttl_signal = "SIGTERM"
///
/// [watch]
/// pid = 4242
/// match_policy = "exact"
///
/// [status]
/// max_records = 100
/// ```
///
/// Every field is optional; defaults that depend on the mode (such as
/// `wait`) are applied by [`crate::config::validate_config`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub server: RawServerSection,

    #[serde(default)]
    pub process: RawProcessSection,

    #[serde(default)]
    pub watch: RawWatchSection,

    #[serde(default)]
    pub status: RawStatusSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawServerSection {
    /// IP address of the interface to bind.
    pub interface: Option<String>,
    /// Port to listen on. Kept wider than `u16` so out-of-range values
    /// surface as a configuration error instead of a TOML type error.
    pub port: Option<u64>,
    /// Take the listener from the service manager instead of binding.
    pub socket_activation: Option<bool>,
    /// Also serve on the next free port above `port`.
    pub sidebind: Option<bool>,
}

/// `[process]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProcessSection {
    /// Seconds after which the child is terminated (run mode, 0 = never).
    pub ttl: Option<u64>,
    /// Seconds between restarts / polls, or seconds to keep reporting
    /// after termination in run mode.
    pub wait: Option<u64>,
    /// Signal delivered on TTL expiry, by name (`"SIGTERM"`) or number.
    pub ttl_signal: Option<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawWatchSection {
    /// Restrict watching to a single pid (0 = no restriction).
    pub pid: Option<u32>,
    pub match_policy: Option<MatchPolicy>,
}

/// `[status]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStatusSection {
    /// Upper bound on retained records in supervise/watch mode.
    pub max_records: Option<usize>,
}

/// Validated, immutable configuration handed to the lifecycle core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub process: ProcessConfig,
    pub watch: WatchConfig,
    pub status: StatusConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub socket_activation: bool,
    pub sidebind: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// `Duration::ZERO` disables the deadline.
    pub ttl: Duration,
    pub wait: Duration,
    /// Raw signal number sent when the TTL expires.
    pub ttl_signal: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub pid: Option<u32>,
    pub match_policy: MatchPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusConfig {
    /// `None` means the history grows until the program exits.
    pub max_records: Option<usize>,
}

impl RawConfig {
    /// Overlay `overrides` on top of `self`: any value set in `overrides`
    /// wins, anything unset falls back to `self`.
    pub fn merged_with(self, overrides: RawConfig) -> RawConfig {
        RawConfig {
            server: RawServerSection {
                interface: overrides.server.interface.or(self.server.interface),
                port: overrides.server.port.or(self.server.port),
                socket_activation: overrides
                    .server
                    .socket_activation
                    .or(self.server.socket_activation),
                sidebind: overrides.server.sidebind.or(self.server.sidebind),
            },
            process: RawProcessSection {
                ttl: overrides.process.ttl.or(self.process.ttl),
                wait: overrides.process.wait.or(self.process.wait),
                ttl_signal: overrides.process.ttl_signal.or(self.process.ttl_signal),
            },
            watch: RawWatchSection {
                pid: overrides.watch.pid.or(self.watch.pid),
                match_policy: overrides.watch.match_policy.or(self.watch.match_policy),
            },
            status: RawStatusSection {
                max_records: overrides.status.max_records.or(self.status.max_records),
            },
        }
    }
}
