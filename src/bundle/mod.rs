//! Bundles
//!
//! A [`Bundle`] hooks an add-on into host bootstrap: it sees the application
//! configuration once and may register lifecycle listeners.
//! [`SignalBundle`] is the CloudFormation signaling add-on.

mod listener;

pub use listener::SignalLifecycleListener;

use crate::config::{ConfigError, HasSignalConfig};
use crate::environment::{EnvironmentProber, RuntimeIdentity};
use crate::lifecycle::LifecycleEnvironment;
use crate::signal::{
    AwsClientFactory, ClientFactory, CloudFormationApi, SignalDispatcher, SignalTarget,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for add-ons run during application bootstrap
///
/// # Example
/// ```rust,ignore
/// let mut lifecycle = LifecycleEnvironment::new();
/// SignalBundle::new().run(&app_config, &mut lifecycle).await?;
/// ```
#[async_trait]
pub trait Bundle<C: Sync>: Send + Sync {
    type Error;

    /// Inspect the configuration and register whatever listeners the bundle needs
    async fn run(
        &self,
        config: &C,
        lifecycle: &mut LifecycleEnvironment,
    ) -> Result<(), Self::Error>;
}

enum ClientMode {
    Supplied(Arc<dyn CloudFormationApi>),
    Factory(Arc<dyn ClientFactory>),
}

/// Signals the auto scaling group via CloudFormation when running on EC2.
///
/// On `run` the bundle builds its target from the config (rejecting missing
/// fields unless `skip` is set), resolves the instance identity
/// and, only if one was found, registers a [`SignalLifecycleListener`]. Off
/// EC2, or with `skip` set, it registers nothing and never calls AWS.
pub struct SignalBundle {
    prober: EnvironmentProber,
    client: ClientMode,
}

impl Default for SignalBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBundle {
    /// Probe EC2 metadata and create an SDK client on first signal.
    pub fn new() -> Self {
        Self {
            prober: EnvironmentProber::ec2(),
            client: ClientMode::Factory(Arc::new(AwsClientFactory)),
        }
    }

    /// Signal through a client the caller owns. The bundle never shuts it down.
    pub fn with_client(client: Arc<dyn CloudFormationApi>) -> Self {
        Self {
            prober: EnvironmentProber::ec2(),
            client: ClientMode::Supplied(client),
        }
    }

    pub fn with_client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.client = ClientMode::Factory(factory);
        self
    }

    pub fn with_prober(mut self, prober: EnvironmentProber) -> Self {
        self.prober = prober;
        self
    }

    fn dispatcher(&self, target: SignalTarget, identity: &RuntimeIdentity) -> SignalDispatcher {
        match &self.client {
            ClientMode::Supplied(client) => {
                SignalDispatcher::with_client(target, Arc::clone(client))
            }
            ClientMode::Factory(factory) => SignalDispatcher::self_managed(
                target,
                identity.region.clone(),
                Arc::clone(factory),
            ),
        }
    }
}

#[async_trait]
impl<C> Bundle<C> for SignalBundle
where
    C: HasSignalConfig + Sync,
{
    type Error = ConfigError;

    async fn run(
        &self,
        config: &C,
        lifecycle: &mut LifecycleEnvironment,
    ) -> Result<(), ConfigError> {
        let config = config.signal_config();
        if config.skip {
            tracing::debug!("CloudFormation signaling is disabled by configuration");
            return Ok(());
        }

        let target = SignalTarget::from_config(config)?;
        let identity = self.prober.resolve_identity(config).await;
        let Some(instance_id) = identity.instance_id.clone() else {
            tracing::debug!("Not running on EC2, CloudFormation signaling disabled");
            return Ok(());
        };

        tracing::info!(
            "Will signal {} in stack {} for instance {}",
            target.resource_name,
            target.group_name.as_deref().unwrap_or("<discovered>"),
            instance_id
        );

        let dispatcher = self.dispatcher(target, &identity);
        let listener = SignalLifecycleListener::new(instance_id, dispatcher);
        lifecycle.add_listener(Arc::new(listener), "CfnSignal");
        Ok(())
    }
}
