// src/watch/mod.rs

//! Watching externally launched processes.
//!
//! - [`probe`] abstracts the OS process table (`sysinfo`, plus `kill(2)` on
//!   Unix for single-pid liveness).
//! - [`matcher`] decides which processes match the search criteria.
//! - [`watcher`] polls on an interval and records state changes.

pub mod matcher;
pub mod probe;
pub mod watcher;

pub use matcher::Matcher;
pub use probe::{ProcessInfo, ProcessProbe, SystemProbe};
pub use watcher::{WatchTarget, Watcher};
