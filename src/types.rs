use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which lifecycle the program drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Run,
    Supervise,
    Watch,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Run => "run",
            Mode::Supervise => "supervise",
            Mode::Watch => "watch",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of a single attempt or observation.
///
/// - `Running`: the process is alive (or believed to be).
/// - `Stopped`: the process exited on its own.
/// - `Killed`: the process was terminated by a signal, including TTL expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Stopped,
    Killed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// How the watcher matches processes when no pid is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    /// Process name (or executable file name) equals the file name of the
    /// search command; search arguments, when present, must equal the
    /// process arguments after argv[0].
    Exact,
    /// The search command is a regex applied to the full command line.
    Regex,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "regex" => Ok(MatchPolicy::Regex),
            other => Err(format!(
                "invalid match_policy: {other} (expected \"exact\" or \"regex\")"
            )),
        }
    }
}
