// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KapoError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The activation collaborator handed us something other than exactly
    /// one listener.
    #[error("Socket activation error: expected exactly 1 listener, got {count}")]
    SocketActivation { count: usize },

    #[error("Launch error: {command}: {reason}")]
    Launch { command: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KapoError {
    pub fn launch(command: impl Into<String>, reason: impl Into<String>) -> Self {
        KapoError::Launch {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that make the current command unlaunchable.
    pub fn is_launch(&self) -> bool {
        matches!(self, KapoError::Launch { .. })
    }
}

pub type Result<T> = std::result::Result<T, KapoError>;
