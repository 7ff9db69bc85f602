//! Lifecycle Environment
//!
//! Tracks the host's own state and fans its transitions out to registered
//! listeners.

use super::{FailureContext, LifecycleError, LifecycleListener};
use std::sync::{Arc, Mutex, PoisonError};
use strum_macros::Display;

/// Where the host currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum HostState {
    Idle,
    Starting,
    Started,
    Stopping,
    Stopped,
    Failed,
}

/// A listener registered under a name, for logging
struct RegisteredListener {
    listener: Arc<dyn LifecycleListener>,
    name: String,
}

/// Registry of lifecycle listeners plus the host state they observe
///
/// The host calls [`starting`](Self::starting), [`started`](Self::started),
/// [`fail`](Self::fail) and [`stop`](Self::stop) as it moves through its
/// lifecycle. Failures carry a [`FailureContext`] computed from the state the
/// host was in when it failed, so listeners can tell a startup failure from a
/// failure during a planned shutdown.
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_cfn_signal::lifecycle::LifecycleEnvironment;
///
/// let mut lifecycle = LifecycleEnvironment::new();
/// lifecycle.add_listener(Arc::new(my_listener), "MyListener");
///
/// let listener = lifecycle
///     .run_startup(tokio::net::TcpListener::bind("0.0.0.0:3000"))
///     .await?;
/// // ... serve ...
/// lifecycle.stop().await;
/// ```
pub struct LifecycleEnvironment {
    listeners: Vec<RegisteredListener>,
    state: Mutex<HostState>,
}

impl Default for LifecycleEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleEnvironment {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            state: Mutex::new(HostState::Idle),
        }
    }

    /// Register a listener. Nothing is fired on registration.
    pub fn add_listener(&mut self, listener: Arc<dyn LifecycleListener>, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!("Registered lifecycle listener: {}", name);
        self.listeners.push(RegisteredListener { listener, name });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn state(&self) -> HostState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: HostState) -> HostState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *state, next)
    }

    pub async fn starting(&self) {
        self.transition(HostState::Starting);
        tracing::debug!("Lifecycle starting ({} listeners)", self.listeners.len());
        for entry in &self.listeners {
            entry.listener.lifecycle_starting().await;
        }
    }

    pub async fn started(&self) {
        self.transition(HostState::Started);
        tracing::info!("Lifecycle started");
        for entry in &self.listeners {
            tracing::debug!("Notifying {} of start", entry.name);
            entry.listener.lifecycle_started().await;
        }
    }

    /// Report a host failure. The context reflects the state before failing.
    pub async fn fail(&self, error: LifecycleError) {
        let previous = self.transition(HostState::Failed);
        let context = FailureContext {
            stopping: previous == HostState::Stopping,
            stopped: previous == HostState::Stopped,
        };
        tracing::error!("Lifecycle failed while {}: {}", previous, error);
        for entry in &self.listeners {
            tracing::debug!("Notifying {} of failure", entry.name);
            entry.listener.lifecycle_failure(context, &error).await;
        }
    }

    pub async fn stopping(&self) {
        self.transition(HostState::Stopping);
        tracing::info!("Lifecycle stopping");
        for entry in &self.listeners {
            entry.listener.lifecycle_stopping().await;
        }
    }

    pub async fn stopped(&self) {
        self.transition(HostState::Stopped);
        for entry in &self.listeners {
            entry.listener.lifecycle_stopped().await;
        }
        tracing::info!("Lifecycle stopped");
    }

    /// Fire `stopping` then `stopped`.
    pub async fn stop(&self) {
        self.stopping().await;
        self.stopped().await;
    }

    /// Drive a startup future through `starting`, then `started` or `fail`.
    ///
    /// The startup result is handed back unchanged.
    pub async fn run_startup<F, T, E>(&self, startup: F) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        self.starting().await;
        match startup.await {
            Ok(value) => {
                self.started().await;
                Ok(value)
            }
            Err(e) => {
                self.fail(LifecycleError::startup_failed(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }
    }

    #[async_trait]
    impl LifecycleListener for RecordingListener {
        async fn lifecycle_starting(&self) {
            self.push("starting");
        }

        async fn lifecycle_started(&self) {
            self.push("started");
        }

        async fn lifecycle_failure(&self, context: FailureContext, _error: &LifecycleError) {
            self.push(format!(
                "failure(stopping={}, stopped={})",
                context.stopping, context.stopped
            ));
        }

        async fn lifecycle_stopping(&self) {
            self.push("stopping");
        }

        async fn lifecycle_stopped(&self) {
            self.push("stopped");
        }
    }

    fn environment_with_listener() -> (LifecycleEnvironment, Arc<RecordingListener>) {
        let listener = Arc::new(RecordingListener::default());
        let mut lifecycle = LifecycleEnvironment::new();
        lifecycle.add_listener(listener.clone(), "Recording");
        (lifecycle, listener)
    }

    #[tokio::test]
    async fn test_registration_fires_nothing() {
        let (lifecycle, listener) = environment_with_listener();
        assert_eq!(lifecycle.listener_count(), 1);
        assert_eq!(lifecycle.state(), HostState::Idle);
        assert!(listener.events().is_empty());
    }

    #[tokio::test]
    async fn test_successful_startup_and_stop() {
        let (lifecycle, listener) = environment_with_listener();

        let value = lifecycle
            .run_startup(async { Ok::<_, LifecycleError>(7) })
            .await
            .unwrap();
        lifecycle.stop().await;

        assert_eq!(value, 7);
        assert_eq!(lifecycle.state(), HostState::Stopped);
        assert_eq!(
            listener.events(),
            vec!["starting", "started", "stopping", "stopped"]
        );
    }

    #[tokio::test]
    async fn test_startup_failure_context() {
        let (lifecycle, listener) = environment_with_listener();

        let result = lifecycle
            .run_startup(async { Err::<(), _>("address in use") })
            .await;

        assert_eq!(result, Err("address in use"));
        assert_eq!(lifecycle.state(), HostState::Failed);
        assert_eq!(
            listener.events(),
            vec!["starting", "failure(stopping=false, stopped=false)"]
        );
    }

    #[tokio::test]
    async fn test_failure_while_stopping_context() {
        let (lifecycle, listener) = environment_with_listener();

        lifecycle.started().await;
        lifecycle.stopping().await;
        lifecycle
            .fail(LifecycleError::shutdown_failed("drain timed out"))
            .await;

        assert_eq!(
            listener.events(),
            vec!["started", "stopping", "failure(stopping=true, stopped=false)"]
        );
    }

    #[tokio::test]
    async fn test_listeners_notified_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        struct OrderedListener {
            id: usize,
            order: Arc<Mutex<Vec<usize>>>,
        }

        #[async_trait]
        impl LifecycleListener for OrderedListener {
            async fn lifecycle_started(&self) {
                self.order.lock().unwrap().push(self.id);
            }
        }

        let mut lifecycle = LifecycleEnvironment::new();
        for i in 0..3 {
            lifecycle.add_listener(
                Arc::new(OrderedListener {
                    id: i,
                    order: Arc::clone(&order),
                }),
                format!("Listener{}", i),
            );
        }

        lifecycle.started().await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
