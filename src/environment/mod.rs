//! Environment probing
//!
//! Decides whether the process runs on an EC2 instance and, if so, which
//! instance and region it belongs to. Not running on EC2 is a normal outcome
//! (local development, CI) and is reported as an absent instance id, never as
//! an error.

mod ec2;

pub use ec2::Ec2InstanceMetadata;

use crate::config::SignalConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Best-effort lookups against the instance metadata service.
///
/// Implementations must swallow their own failures and report them as `None`.
#[async_trait]
pub trait InstanceMetadata: Send + Sync {
    async fn instance_id(&self) -> Option<String>;

    async fn region(&self) -> Option<String>;
}

/// Who and where this process is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeIdentity {
    /// `None` means "not running in EC2"; nothing gets signaled.
    pub instance_id: Option<String>,
    /// `None` defers to the SDK's default region chain.
    pub region: Option<String>,
}

impl RuntimeIdentity {
    pub fn new(instance_id: Option<String>, region: Option<String>) -> Self {
        Self {
            instance_id,
            region,
        }
    }

    pub fn is_present(&self) -> bool {
        self.instance_id.is_some()
    }
}

/// Resolves the [`RuntimeIdentity`] once and caches it.
pub struct EnvironmentProber {
    metadata: Arc<dyn InstanceMetadata>,
    identity: OnceCell<RuntimeIdentity>,
}

impl EnvironmentProber {
    pub fn new(metadata: Arc<dyn InstanceMetadata>) -> Self {
        Self {
            metadata,
            identity: OnceCell::new(),
        }
    }

    /// A prober backed by the EC2 instance metadata service.
    pub fn ec2() -> Self {
        Self::new(Arc::new(Ec2InstanceMetadata::new()))
    }

    /// Resolve the identity, preferring explicit config values over metadata.
    ///
    /// Only the first call does any work; later calls return the cached result
    /// regardless of the config passed.
    pub async fn resolve_identity(&self, config: &SignalConfig) -> RuntimeIdentity {
        self.identity
            .get_or_init(|| self.probe(config))
            .await
            .clone()
    }

    async fn probe(&self, config: &SignalConfig) -> RuntimeIdentity {
        let instance_id = match config.instance_id() {
            Some(id) => Some(id.to_string()),
            None => self
                .metadata
                .instance_id()
                .await
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        };

        if instance_id.is_none() {
            tracing::debug!("Unable to fetch EC2 instance id, assuming not running on AWS");
            return RuntimeIdentity::new(None, config.region().map(str::to_string));
        }

        let region = match config.region() {
            Some(region) => Some(region.to_string()),
            None => self.metadata.region().await,
        };

        if region.is_none() {
            tracing::debug!("No region configured or discovered, deferring to the SDK default");
        }

        RuntimeIdentity::new(instance_id, region)
    }
}
