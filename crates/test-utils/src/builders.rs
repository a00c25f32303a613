#![allow(dead_code)]

use kapo::config::{Config, RawConfig, validate_config};
use kapo::types::{MatchPolicy, Mode};

/// Builder for `RawConfig` to simplify test setup.
pub struct RawConfigBuilder {
    config: RawConfig,
}

impl RawConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfig::default(),
        }
    }

    pub fn interface(mut self, interface: &str) -> Self {
        self.config.server.interface = Some(interface.to_string());
        self
    }

    pub fn port(mut self, port: u64) -> Self {
        self.config.server.port = Some(port);
        self
    }

    pub fn socket_activation(mut self, val: bool) -> Self {
        self.config.server.socket_activation = Some(val);
        self
    }

    pub fn sidebind(mut self, val: bool) -> Self {
        self.config.server.sidebind = Some(val);
        self
    }

    pub fn ttl(mut self, secs: u64) -> Self {
        self.config.process.ttl = Some(secs);
        self
    }

    pub fn wait(mut self, secs: u64) -> Self {
        self.config.process.wait = Some(secs);
        self
    }

    pub fn ttl_signal(mut self, signal: &str) -> Self {
        self.config.process.ttl_signal = Some(signal.to_string());
        self
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.config.watch.pid = Some(pid);
        self
    }

    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.config.watch.match_policy = Some(policy);
        self
    }

    pub fn max_records(mut self, n: usize) -> Self {
        self.config.status.max_records = Some(n);
        self
    }

    pub fn raw(self) -> RawConfig {
        self.config
    }

    /// Validate for `mode`, panicking on invalid test input.
    pub fn build(self, mode: Mode) -> Config {
        validate_config(&self.config, mode).expect("Failed to build valid config from builder")
    }
}

impl Default for RawConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
