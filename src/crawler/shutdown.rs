//! Shutdown reasons and process signal handling

use crate::ExportError;
use std::fmt;

/// Why a checkpoint is being written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The process received a termination signal
    Signal,

    /// A request budget reached zero
    RateLimit,

    /// A fetch, parse or transform step failed
    Error,

    /// Regular save during a healthy run
    Periodic,

    /// The frontier is empty
    Completed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Signal => "signal received",
            Self::RateLimit => "rate limit exhausted",
            Self::Error => "run failed",
            Self::Periodic => "periodic save",
            Self::Completed => "completed",
        };
        f.write_str(text)
    }
}

impl From<&ExportError> for ShutdownReason {
    fn from(err: &ExportError) -> Self {
        match err {
            ExportError::RateLimitExhausted { .. } => Self::RateLimit,
            _ => Self::Error,
        }
    }
}

/// Resolves when the process is asked to terminate
///
/// Listens for Ctrl-C everywhere and additionally for SIGTERM on unix. If a
/// listener cannot be installed it is skipped with a warning rather than
/// resolving immediately.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
