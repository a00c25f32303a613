// src/server/listener.rs

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::errors::Result;
use crate::server::activation::{ActivationSource, take_single_listener};

/// How many ports above the primary one are tried for the side listener.
pub const SIDEBIND_ATTEMPTS: u16 = 64;

/// Acquire the status server's listeners: the primary listener first, then
/// the side listener when `sidebind` is set.
///
/// The primary comes from `activation` when socket activation is enabled,
/// otherwise from binding `config.bind`. Failing to find a side port is
/// logged, not fatal.
pub async fn bind_listeners(
    config: &ServerConfig,
    activation: &dyn ActivationSource,
) -> Result<Vec<TcpListener>> {
    let primary = if config.socket_activation {
        let listener = TcpListener::from_std(take_single_listener(activation)?)?;
        info!(addr = ?listener.local_addr().ok(), "using socket-activated listener");
        listener
    } else {
        info!(addr = %config.bind, "binding status server");
        TcpListener::bind(config.bind).await?
    };

    let mut listeners = Vec::with_capacity(2);
    let primary_addr = primary.local_addr()?;
    listeners.push(primary);

    if config.sidebind {
        match bind_side(primary_addr).await {
            Some(side) => listeners.push(side),
            None => warn!(
                addr = %primary_addr,
                attempts = SIDEBIND_ATTEMPTS,
                "no free port for side listener"
            ),
        }
    }

    Ok(listeners)
}

/// Bind the first free port above `primary`.
async fn bind_side(primary: SocketAddr) -> Option<TcpListener> {
    for offset in 1..=SIDEBIND_ATTEMPTS {
        let Some(port) = primary.port().checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(primary.ip(), port);
        if let Ok(listener) = TcpListener::bind(addr).await {
            info!(addr = %addr, "side listener bound");
            return Some(listener);
        }
    }
    None
}
