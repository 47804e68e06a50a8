//! Process shutdown signals
//!
//! Handlers are installed eagerly so a signal delivered while a poll cycle
//! is running is still observed once the cycle completes.

use crate::error::Result;

#[cfg(unix)]
use crate::error::Error;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// SIGTERM/SIGINT listener
#[cfg(unix)]
pub struct ShutdownSignal {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignal {
    /// Install SIGTERM and SIGINT handlers
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| Error::other(format!("Failed to setup SIGTERM handler: {}", e)))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| Error::other(format!("Failed to setup SIGINT handler: {}", e)))?;

        Ok(Self { sigterm, sigint })
    }

    /// Wait for either signal, returning its name
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// CTRL-C listener
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
pub struct ShutdownSignal;

#[cfg(not(unix))]
impl ShutdownSignal {
    pub fn install() -> Result<Self> {
        Ok(Self)
    }

    pub async fn recv(self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::warn!("Failed to wait for CTRL-C, shutdown by signal disabled: {}", e);
                std::future::pending().await
            }
        }
    }
}
