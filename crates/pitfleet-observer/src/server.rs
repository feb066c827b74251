//! Observer HTTP server: bind, then serve until the task is aborted.
//!
//! Binding and serving are split so the engine can surface a bind failure
//! at startup instead of inside a background task.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use pitfleet_core::config::ObserverConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the Observer server listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (all interfaces by default).
    pub host: IpAddr,
    /// TCP port; 0 asks the OS for a free one.
    pub port: u16,
}

impl ServerConfig {
    /// The socket address to bind.
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ObserverConfig::default())
    }
}

impl From<&ObserverConfig> for ServerConfig {
    fn from(config: &ObserverConfig) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: config.port,
        }
    }
}

/// Errors from binding or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The server hit a fatal I/O error while serving.
    #[error("serve error: {source}")]
    Serve {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Bind a listener for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is in use or not available.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.addr();
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve the Observer router on an already bound listener.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Observer server listening");
    }
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Bind and serve in one call.
///
/// # Errors
///
/// Returns [`ServerError`] if binding or serving fails.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces_on_the_configured_port() {
        let config = ServerConfig::default();
        assert!(config.host.is_unspecified());
        assert_eq!(config.port, 8080);
        assert_eq!(config.addr().port(), 8080);
    }

    #[test]
    fn follows_observer_port() {
        let observer = ObserverConfig {
            enabled: true,
            port: 9123,
        };
        assert_eq!(ServerConfig::from(&observer).port, 9123);
    }
}
