//! Lifecycle-specific error types

use thiserror::Error;

/// Failures reported by the host while starting or stopping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The host could not finish starting
    #[error("Startup failed: {0}")]
    StartupFailed(String),

    /// The host failed while shutting down
    #[error("Shutdown failed: {0}")]
    ShutdownFailed(String),
}

impl LifecycleError {
    /// Create a startup failure error
    pub fn startup_failed(msg: impl Into<String>) -> Self {
        Self::StartupFailed(msg.into())
    }

    /// Create a shutdown failure error
    pub fn shutdown_failed(msg: impl Into<String>) -> Self {
        Self::ShutdownFailed(msg.into())
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
