//! Lifecycle listener contract
//!
//! Hosts report their own start/stop transitions through [`LifecycleListener`].
//! Every hook has an empty default so listeners only implement what they react to.

use super::LifecycleError;
use async_trait::async_trait;
use strum_macros::Display;

/// Host state at the moment a failure was reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureContext {
    pub stopping: bool,
    pub stopped: bool,
}

impl FailureContext {
    /// A failure while starting up (neither stopping nor stopped).
    pub fn startup() -> Self {
        Self::default()
    }

    pub fn during_shutdown(&self) -> bool {
        self.stopping || self.stopped
    }
}

/// The five host transitions a listener can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LifecyclePhase {
    Starting,
    Started,
    StoppingOrStopped,
    FailedDuringStartup,
    FailedDuringShutdown,
}

impl LifecyclePhase {
    pub fn from_failure(context: FailureContext) -> Self {
        if context.during_shutdown() {
            LifecyclePhase::FailedDuringShutdown
        } else {
            LifecyclePhase::FailedDuringStartup
        }
    }
}

/// Receives host lifecycle events
///
/// Register implementations with
/// [`LifecycleEnvironment::add_listener`](super::LifecycleEnvironment::add_listener).
/// Hooks run on whatever task drives the host lifecycle and are awaited in
/// registration order, so they should not block for long.
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_cfn_signal::lifecycle::{LifecycleListener, LifecycleError, FailureContext};
/// use async_trait::async_trait;
///
/// struct ReadinessFlag(AtomicBool);
///
/// #[async_trait]
/// impl LifecycleListener for ReadinessFlag {
///     async fn lifecycle_started(&self) {
///         self.0.store(true, Ordering::SeqCst);
///     }
/// }
/// ```
#[async_trait]
pub trait LifecycleListener: Send + Sync {
    /// The host is about to start
    async fn lifecycle_starting(&self) {}

    /// The host started and is serving
    async fn lifecycle_started(&self) {}

    /// The host failed. `context` tells whether it was shutting down at the time.
    async fn lifecycle_failure(&self, _context: FailureContext, _error: &LifecycleError) {}

    /// The host began shutting down
    async fn lifecycle_stopping(&self) {}

    /// The host has fully stopped
    async fn lifecycle_stopped(&self) {}
}
