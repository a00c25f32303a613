// src/server/mod.rs

//! HTTP status server.
//!
//! - [`activation`] obtains a pre-opened listener from the service manager.
//! - [`listener`] chooses between activation and a plain bind, plus the
//!   optional side listener.
//! - [`handler`] renders the registry snapshot for `GET /`.

pub mod activation;
pub mod handler;
pub mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use activation::{ACTIVATION_ENV, ActivationSource, SystemdActivation, take_single_listener};
#[cfg(unix)]
pub use activation::adopt_inherited;
pub use handler::{SnapshotSource, build_router};
pub use listener::{SIDEBIND_ATTEMPTS, bind_listeners};

/// Running status server: one Tokio task per listener, all serving the same
/// read-only snapshot source.
#[derive(Debug)]
pub struct StatusServer {
    addrs: Vec<SocketAddr>,
    handles: Vec<JoinHandle<()>>,
}

impl StatusServer {
    /// Start serving `source` on every listener.
    pub fn spawn(listeners: Vec<TcpListener>, source: Arc<dyn SnapshotSource>) -> Self {
        let router = build_router(source);
        let mut addrs = Vec::with_capacity(listeners.len());
        let mut handles = Vec::with_capacity(listeners.len());

        for listener in listeners {
            let addr = listener.local_addr().ok();
            if let Some(addr) = addr {
                addrs.push(addr);
            }
            let app = router.clone();
            handles.push(tokio::spawn(async move {
                info!(addr = ?addr, "status server listening");
                if let Err(e) = axum::serve(listener, app).await {
                    error!(addr = ?addr, error = %e, "status server stopped");
                }
            }));
        }

        Self { addrs, handles }
    }

    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Stop every listener task.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.abort();
    }
}
