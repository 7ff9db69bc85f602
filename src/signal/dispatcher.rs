use super::{
    AwsClientFactory, ClientFactory, CloudFormationApi, SignalRequest, SignalStatus,
};
use crate::config::{ConfigError, SignalConfig};
use crate::error::{Result, SignalError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Which resource to signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalTarget {
    pub resource_name: String,
    /// `None` resolves the stack from the instance id at signal time.
    pub group_name: Option<String>,
}

impl SignalTarget {
    pub fn new(resource_name: impl Into<String>, group_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            group_name: Some(group_name.into()),
        }
    }

    /// A target whose stack is looked up from the instance id.
    pub fn discovered(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            group_name: None,
        }
    }

    pub fn from_config(config: &SignalConfig) -> std::result::Result<Self, ConfigError> {
        let resource_name = config
            .resource_name()
            .ok_or(ConfigError::MissingField("asgResourceName"))?;
        match config.group_name() {
            Some(group_name) => Ok(Self::new(resource_name, group_name)),
            None if config.discover_group_name => Ok(Self::discovered(resource_name)),
            None => Err(ConfigError::MissingField("stackName")),
        }
    }

    fn stack_label(&self) -> &str {
        self.group_name.as_deref().unwrap_or("<unresolved>")
    }
}

enum ClientSource {
    /// Owned by the caller. Never created or shut down here.
    Supplied(Arc<dyn CloudFormationApi>),
    /// Created on first use and shut down after every signal attempt.
    Managed {
        factory: Arc<dyn ClientFactory>,
        region: Option<String>,
        slot: Mutex<Option<Arc<dyn CloudFormationApi>>>,
    },
}

/// Sends the SUCCESS/FAILURE signal for this instance.
///
/// [`send_signal`](Self::send_signal) never fails: every problem ends up as a
/// log line, so a broken signaling setup cannot take the host process down
/// with it.
pub struct SignalDispatcher {
    target: SignalTarget,
    source: ClientSource,
}

impl SignalDispatcher {
    /// Use a client owned by the caller.
    pub fn with_client(target: SignalTarget, client: Arc<dyn CloudFormationApi>) -> Self {
        Self {
            target,
            source: ClientSource::Supplied(client),
        }
    }

    /// Create clients on demand through `factory`.
    pub fn self_managed(
        target: SignalTarget,
        region: Option<String>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            target,
            source: ClientSource::Managed {
                factory,
                region,
                slot: Mutex::new(None),
            },
        }
    }

    /// A self-managed dispatcher that talks to AWS in `region`.
    pub fn from_config(
        config: &SignalConfig,
        region: Option<String>,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::self_managed(
            SignalTarget::from_config(config)?,
            region,
            Arc::new(AwsClientFactory),
        ))
    }

    pub fn target(&self) -> &SignalTarget {
        &self.target
    }

    pub fn is_self_managed(&self) -> bool {
        matches!(self.source, ClientSource::Managed { .. })
    }

    /// Get the client, creating it if this dispatcher manages its own.
    ///
    /// Concurrent first calls all receive the same instance; the factory runs once.
    pub async fn client(&self) -> Result<Arc<dyn CloudFormationApi>> {
        match &self.source {
            ClientSource::Supplied(client) => Ok(Arc::clone(client)),
            ClientSource::Managed {
                factory,
                region,
                slot,
            } => {
                let mut slot = slot.lock().await;
                acquire(&mut slot, factory.as_ref(), region.as_deref()).await
            }
        }
    }

    /// Whether a self-managed client is currently held. Always `false` for supplied clients.
    pub async fn holds_client(&self) -> bool {
        match &self.source {
            ClientSource::Supplied(_) => false,
            ClientSource::Managed { slot, .. } => slot.lock().await.is_some(),
        }
    }

    /// Signal the target resource on behalf of instance `identity`.
    ///
    /// A self-managed client stays locked from creation through release, so
    /// concurrent sends run one after another and none of them can use a
    /// client another send has already shut down.
    pub async fn send_signal(&self, identity: &str, success: bool) {
        let status = SignalStatus::from(success);
        tracing::info!(
            "Signaling {} for {} in stack {}",
            status,
            self.target.resource_name,
            self.target.stack_label()
        );

        let result = match &self.source {
            ClientSource::Supplied(client) => {
                self.signal_with(client.as_ref(), identity, status).await
            }
            ClientSource::Managed {
                factory,
                region,
                slot,
            } => {
                let mut slot = slot.lock().await;
                let result = match acquire(&mut slot, factory.as_ref(), region.as_deref()).await {
                    Ok(client) => self.signal_with(client.as_ref(), identity, status).await,
                    Err(e) => Err(e),
                };
                release(&mut slot).await;
                result
            }
        };

        if let Err(e) = result {
            tracing::error!(
                "There was a problem signaling {} in stack {}: {}",
                self.target.resource_name,
                self.target.stack_label(),
                e
            );
        }
    }

    async fn signal_with(
        &self,
        client: &dyn CloudFormationApi,
        identity: &str,
        status: SignalStatus,
    ) -> Result<()> {
        let stack_name = self.resolve_stack_name(client, identity).await?;
        let request = SignalRequest {
            unique_id: identity.to_string(),
            logical_resource_id: self.target.resource_name.clone(),
            stack_name,
            status,
        };
        client.signal_resource(&request).await?;
        tracing::info!(
            "Signaled {} for {} in stack {}",
            request.status,
            request.logical_resource_id,
            request.stack_name
        );
        Ok(())
    }

    async fn resolve_stack_name(
        &self,
        client: &dyn CloudFormationApi,
        identity: &str,
    ) -> Result<String> {
        if let Some(stack_name) = &self.target.group_name {
            return Ok(stack_name.clone());
        }

        let memberships = client.describe_stack_memberships(identity).await?;
        match memberships.as_slice() {
            [membership] => {
                tracing::debug!(
                    "Resolved stack {} for instance {}",
                    membership.stack_name,
                    identity
                );
                Ok(membership.stack_name.clone())
            }
            _ => Err(SignalError::ambiguous(identity, memberships.len())),
        }
    }
}

/// Return the held client, creating it through `factory` if the slot is empty.
async fn acquire(
    slot: &mut Option<Arc<dyn CloudFormationApi>>,
    factory: &dyn ClientFactory,
    region: Option<&str>,
) -> Result<Arc<dyn CloudFormationApi>> {
    if let Some(client) = slot.as_ref() {
        return Ok(Arc::clone(client));
    }
    tracing::debug!(
        "Creating CloudFormation client (region: {})",
        region.unwrap_or("default")
    );
    let client = factory.create(region).await?;
    *slot = Some(Arc::clone(&client));
    Ok(client)
}

/// Shut down the held client, if any. Teardown errors are logged.
async fn release(slot: &mut Option<Arc<dyn CloudFormationApi>>) {
    let Some(client) = slot.take() else {
        return;
    };
    if let Err(e) = client.shutdown().await {
        tracing::warn!("Failed to shut down CloudFormation client: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::StackMembership;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingClient {
        requests: StdMutex<Vec<SignalRequest>>,
        memberships: Vec<StackMembership>,
        shutdowns: AtomicUsize,
    }

    #[async_trait]
    impl CloudFormationApi for RecordingClient {
        async fn signal_resource(&self, request: &SignalRequest) -> Result<()> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn describe_stack_memberships(
            &self,
            _instance_id: &str,
        ) -> Result<Vec<StackMembership>> {
            Ok(self.memberships.clone())
        }

        async fn shutdown(&self) -> Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_target_from_config() {
        let config = SignalConfig::new("asg", "stack");
        assert_eq!(
            SignalTarget::from_config(&config).unwrap(),
            SignalTarget::new("asg", "stack")
        );

        let config = SignalConfig::new("asg", "").with_discovered_group_name();
        assert_eq!(
            SignalTarget::from_config(&config).unwrap(),
            SignalTarget::discovered("asg")
        );

        let config = SignalConfig::new("", "stack");
        assert_eq!(
            SignalTarget::from_config(&config),
            Err(ConfigError::MissingField("asgResourceName"))
        );
    }

    #[tokio::test]
    async fn test_supplied_client_is_returned_as_is() {
        let client: Arc<dyn CloudFormationApi> = Arc::new(RecordingClient::default());
        let dispatcher =
            SignalDispatcher::with_client(SignalTarget::new("asg", "stack"), Arc::clone(&client));

        let resolved = dispatcher.client().await.unwrap();

        assert!(Arc::ptr_eq(&resolved, &client));
        assert!(!dispatcher.is_self_managed());
        assert!(!dispatcher.holds_client().await);
    }

    #[tokio::test]
    async fn test_discovered_stack_name_is_used() {
        let client = Arc::new(RecordingClient {
            memberships: vec![StackMembership::new("discovered-stack")],
            ..RecordingClient::default()
        });
        let dispatcher =
            SignalDispatcher::with_client(SignalTarget::discovered("asg"), client.clone());

        dispatcher.send_signal("i-123", true).await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].stack_name, "discovered-stack");
        assert_eq!(client.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ambiguous_stack_lookup_does_not_signal() {
        for memberships in [
            vec![],
            vec![StackMembership::new("a"), StackMembership::new("b")],
        ] {
            let client = Arc::new(RecordingClient {
                memberships,
                ..RecordingClient::default()
            });
            let dispatcher =
                SignalDispatcher::with_client(SignalTarget::discovered("asg"), client.clone());

            dispatcher.send_signal("i-123", true).await;

            assert!(client.requests.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_resolve_stack_name_reports_match_count() {
        let client = RecordingClient {
            memberships: vec![StackMembership::new("a"), StackMembership::new("b")],
            ..RecordingClient::default()
        };
        let dispatcher = SignalDispatcher::with_client(
            SignalTarget::discovered("asg"),
            Arc::new(RecordingClient::default()),
        );

        let err = dispatcher
            .resolve_stack_name(&client, "i-123")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SignalError::GroupResolutionAmbiguous { matches: 2, .. }
        ));
    }
}
