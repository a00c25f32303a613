// src/watch/matcher.rs

use std::ffi::OsStr;
use std::path::Path;

use regex::Regex;

use crate::errors::{KapoError, Result};
use crate::types::MatchPolicy;
use crate::watch::probe::ProcessInfo;

/// Search criteria compiled for one [`MatchPolicy`].
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Name equality on the executable file name, plus exact argument
    /// equality when arguments were given.
    Exact { name: String, arguments: Vec<String> },
    /// Regex over the full command line (`argv` joined by single spaces).
    /// The pattern is the search command and arguments joined the same way.
    Regex(Regex),
}

impl Matcher {
    pub fn new(policy: MatchPolicy, command: &str, arguments: &[String]) -> Result<Self> {
        if command.trim().is_empty() {
            return Err(KapoError::ConfigError(
                "watch needs a command to search for when no pid is given".to_string(),
            ));
        }

        match policy {
            MatchPolicy::Exact => {
                let name = Path::new(command)
                    .file_name()
                    .and_then(OsStr::to_str)
                    .unwrap_or(command)
                    .to_string();
                Ok(Matcher::Exact {
                    name,
                    arguments: arguments.to_vec(),
                })
            }
            MatchPolicy::Regex => {
                let mut pattern = command.to_string();
                for arg in arguments {
                    pattern.push(' ');
                    pattern.push_str(arg);
                }
                let regex = Regex::new(&pattern).map_err(|e| {
                    KapoError::ConfigError(format!("invalid watch pattern '{pattern}': {e}"))
                })?;
                Ok(Matcher::Regex(regex))
            }
        }
    }

    pub fn matches(&self, process: &ProcessInfo) -> bool {
        match self {
            Matcher::Exact { name, arguments } => {
                let exe_name = process
                    .exe
                    .as_deref()
                    .and_then(Path::file_name)
                    .and_then(OsStr::to_str);
                let name_matches = process.name == *name || exe_name == Some(name.as_str());

                name_matches
                    && (arguments.is_empty() || process.cmd.get(1..) == Some(arguments.as_slice()))
            }
            Matcher::Regex(regex) => {
                let line = if process.cmd.is_empty() {
                    process.name.clone()
                } else {
                    process.cmd.join(" ")
                };
                regex.is_match(&line)
            }
        }
    }
}
