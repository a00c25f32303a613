// src/server/activation.rs

//! Socket activation: listeners handed over by a service manager.

use std::io;
use std::net::TcpListener;

use tracing::debug;

use crate::errors::{KapoError, Result};

/// Source of pre-opened listeners.
pub trait ActivationSource {
    fn listeners(&self) -> io::Result<Vec<TcpListener>>;
}

/// Take the one listener an activation source must provide.
///
/// Any other count is a fatal `SocketActivation` error.
pub fn take_single_listener(source: &dyn ActivationSource) -> Result<TcpListener> {
    let mut listeners = source.listeners()?;
    if listeners.len() != 1 {
        return Err(KapoError::SocketActivation {
            count: listeners.len(),
        });
    }
    let listener = listeners.remove(0);
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Environment variables of the activation protocol. They are stripped
/// from every child kapo spawns.
pub const ACTIVATION_ENV: [&str; 3] = ["LISTEN_PID", "LISTEN_FDS", "LISTEN_FDNAMES"];

/// Take ownership of a listener inherited across `exec`.
///
/// Service managers hand descriptors over without `FD_CLOEXEC`; it is set
/// here so the listener is not passed on to spawned children.
#[cfg(unix)]
pub fn adopt_inherited(fd: std::os::unix::io::OwnedFd) -> io::Result<TcpListener> {
    use std::os::unix::io::AsRawFd;

    use nix::fcntl::{FcntlArg, FdFlag, fcntl};

    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(io::Error::from)?;
    Ok(TcpListener::from(fd))
}

/// The systemd protocol: `LISTEN_FDS` descriptors starting at fd 3,
/// addressed to this process by `LISTEN_PID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemdActivation;

const LISTEN_FDS_START: i32 = 3;

impl ActivationSource for SystemdActivation {
    #[cfg(unix)]
    fn listeners(&self) -> io::Result<Vec<TcpListener>> {
        use std::os::unix::io::{FromRawFd, OwnedFd};

        // Children inherit the environment, so only honour descriptors
        // addressed to this pid.
        if let Ok(pid) = std::env::var("LISTEN_PID") {
            if pid.trim().parse::<u32>().ok() != Some(std::process::id()) {
                debug!(listen_pid = %pid, "LISTEN_PID does not match this process");
                return Ok(Vec::new());
            }
        }

        let count = std::env::var("LISTEN_FDS")
            .ok()
            .and_then(|n| n.trim().parse::<i32>().ok())
            .unwrap_or(0)
            .max(0);
        debug!(count, "socket activation descriptors");

        (LISTEN_FDS_START..LISTEN_FDS_START + count)
            // SAFETY: the service manager passes ownership of these
            // descriptors to us and nothing else in the process uses them.
            .map(|fd| adopt_inherited(unsafe { OwnedFd::from_raw_fd(fd) }))
            .collect()
    }

    #[cfg(not(unix))]
    fn listeners(&self) -> io::Result<Vec<TcpListener>> {
        Ok(Vec::new())
    }
}
