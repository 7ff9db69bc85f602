use crate::lifecycle::{FailureContext, LifecycleError, LifecycleListener, LifecyclePhase};
use crate::signal::SignalDispatcher;
use async_trait::async_trait;

/// Turns host lifecycle events into CloudFormation signals.
///
/// | phase                  | signal  |
/// |------------------------|---------|
/// | `Started`              | SUCCESS |
/// | `FailedDuringStartup`  | FAILURE |
/// | anything else          | none    |
///
/// A failure while stopping or stopped is a shutdown problem, not a failed
/// deployment, and is never reported.
pub struct SignalLifecycleListener {
    instance_id: String,
    dispatcher: SignalDispatcher,
}

impl SignalLifecycleListener {
    pub fn new(instance_id: impl Into<String>, dispatcher: SignalDispatcher) -> Self {
        Self {
            instance_id: instance_id.into(),
            dispatcher,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn dispatcher(&self) -> &SignalDispatcher {
        &self.dispatcher
    }

    /// The signal to send for `phase`: `Some(success)` or `None` for no signal.
    pub fn signal_for(phase: LifecyclePhase) -> Option<bool> {
        match phase {
            LifecyclePhase::Started => Some(true),
            LifecyclePhase::FailedDuringStartup => Some(false),
            LifecyclePhase::Starting
            | LifecyclePhase::StoppingOrStopped
            | LifecyclePhase::FailedDuringShutdown => None,
        }
    }

    pub async fn on_phase(&self, phase: LifecyclePhase) {
        match Self::signal_for(phase) {
            Some(success) => self.dispatcher.send_signal(&self.instance_id, success).await,
            None => tracing::trace!("No signal for lifecycle phase {}", phase),
        }
    }
}

#[async_trait]
impl LifecycleListener for SignalLifecycleListener {
    async fn lifecycle_starting(&self) {
        self.on_phase(LifecyclePhase::Starting).await;
    }

    async fn lifecycle_started(&self) {
        self.on_phase(LifecyclePhase::Started).await;
    }

    async fn lifecycle_failure(&self, context: FailureContext, error: &LifecycleError) {
        let phase = LifecyclePhase::from_failure(context);
        if phase == LifecyclePhase::FailedDuringShutdown {
            tracing::debug!("Not signaling failure during shutdown: {}", error);
        }
        self.on_phase(phase).await;
    }

    async fn lifecycle_stopping(&self) {
        self.on_phase(LifecyclePhase::StoppingOrStopped).await;
    }

    async fn lifecycle_stopped(&self) {
        self.on_phase(LifecyclePhase::StoppingOrStopped).await;
    }
}
