//! Launch the Observer server next to the tick loop.
//!
//! [`spawn_observer`] binds eagerly, so a port already in use fails engine
//! startup, then serves on a background task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::server::{ServerConfig, ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running Observer server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// Address actually bound (resolves port 0).
    pub addr: SocketAddr,
    /// The serving task; abort it on shutdown.
    pub task: JoinHandle<()>,
}

/// Bind the Observer server and serve it on a background task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot bind.
pub async fn spawn_observer(config: &ServerConfig, state: Arc<AppState>) -> Result<ObserverHandle, StartupError> {
    let listener = bind(config).await?;
    let addr = listener.local_addr().unwrap_or_else(|_| config.addr());

    let task = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            error!(error = %e, "Observer server exited with error");
        }
    });

    info!(%addr, "Observer server spawned on background task");
    Ok(ObserverHandle { addr, task })
}
