#![allow(dead_code)]

use meshestra_cfn_signal::prelude::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Send test diagnostics through the test harness writer.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Records every call; optionally fails signal or shutdown.
#[derive(Default)]
pub struct FakeCloudFormation {
    pub requests: Mutex<Vec<SignalRequest>>,
    pub memberships: Vec<StackMembership>,
    pub describe_calls: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub fail_signal: bool,
    pub fail_shutdown: bool,
    /// How long `signal_resource` takes.
    pub signal_delay: Duration,
    pub in_flight: AtomicUsize,
    /// Shutdowns that arrived while a signal was still running.
    pub shutdowns_during_signal: AtomicUsize,
}

impl FakeCloudFormation {
    pub fn requests(&self) -> Vec<SignalRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn is_untouched(&self) -> bool {
        self.requests().is_empty()
            && self.describe_calls.load(Ordering::SeqCst) == 0
            && self.shutdown_count() == 0
    }
}

#[async_trait]
impl CloudFormationApi for FakeCloudFormation {
    async fn signal_resource(&self, request: &SignalRequest) -> Result<()> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if !self.signal_delay.is_zero() {
            tokio::time::sleep(self.signal_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_signal {
            return Err(SignalError::remote_signal(
                &request.logical_resource_id,
                &request.stack_name,
                "Rate exceeded",
            ));
        }
        Ok(())
    }

    async fn describe_stack_memberships(&self, _instance_id: &str) -> Result<Vec<StackMembership>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.memberships.clone())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            self.shutdowns_during_signal.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_shutdown {
            return Err(SignalError::ClientTeardown("connection pool busy".to_string()));
        }
        Ok(())
    }
}

/// Hands out one shared fake and counts how often it was asked to.
pub struct CountingFactory {
    pub client: Arc<FakeCloudFormation>,
    pub creations: AtomicUsize,
    pub regions: Mutex<Vec<Option<String>>>,
    pub delay: Duration,
    pub fail: bool,
}

impl CountingFactory {
    pub fn new(client: Arc<FakeCloudFormation>) -> Self {
        Self {
            client,
            creations: AtomicUsize::new(0),
            regions: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for CountingFactory {
    async fn create(&self, region: Option<&str>) -> Result<Arc<dyn CloudFormationApi>> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        self.regions
            .lock()
            .unwrap()
            .push(region.map(str::to_string));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(SignalError::ClientConstruction(
                "no credentials in chain".to_string(),
            ));
        }
        let client: Arc<dyn CloudFormationApi> = self.client.clone();
        Ok(client)
    }
}

/// Metadata that answers with fixed values.
pub struct StaticMetadata {
    pub instance_id: Option<String>,
    pub region: Option<String>,
}

impl StaticMetadata {
    pub fn off_ec2() -> Self {
        Self {
            instance_id: None,
            region: None,
        }
    }

    pub fn on_ec2(instance_id: &str, region: &str) -> Self {
        Self {
            instance_id: Some(instance_id.to_string()),
            region: Some(region.to_string()),
        }
    }
}

#[async_trait]
impl InstanceMetadata for StaticMetadata {
    async fn instance_id(&self) -> Option<String> {
        self.instance_id.clone()
    }

    async fn region(&self) -> Option<String> {
        self.region.clone()
    }
}

pub fn prober(metadata: StaticMetadata) -> EnvironmentProber {
    EnvironmentProber::new(Arc::new(metadata))
}

/// The configuration used throughout the bundle tests.
pub fn test_config() -> SignalConfig {
    SignalConfig::new("autoScalingGroup", "stackName")
        .with_region("us-west-2")
        .with_instance_id("i-123")
}

pub fn expected_request(status: SignalStatus) -> SignalRequest {
    SignalRequest {
        unique_id: "i-123".to_string(),
        logical_resource_id: "autoScalingGroup".to_string(),
        stack_name: "stackName".to_string(),
        status,
    }
}
