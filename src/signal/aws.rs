use super::{ClientFactory, CloudFormationApi, SignalRequest, SignalStatus, StackMembership};
use crate::error::{Result, SignalError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::types::ResourceSignalStatus;
use std::sync::Arc;

/// [`CloudFormationApi`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsCloudFormation {
    client: Client,
}

impl AwsCloudFormation {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Load the default AWS config, pinned to `region` when given.
    pub async fn from_region(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config))
    }
}

impl From<SignalStatus> for ResourceSignalStatus {
    fn from(status: SignalStatus) -> Self {
        match status {
            SignalStatus::Success => ResourceSignalStatus::Success,
            SignalStatus::Failure => ResourceSignalStatus::Failure,
        }
    }
}

#[async_trait]
impl CloudFormationApi for AwsCloudFormation {
    async fn signal_resource(&self, request: &SignalRequest) -> Result<()> {
        self.client
            .signal_resource()
            .stack_name(&request.stack_name)
            .logical_resource_id(&request.logical_resource_id)
            .unique_id(&request.unique_id)
            .status(request.status.into())
            .send()
            .await
            .map_err(|e| {
                SignalError::remote_signal(
                    &request.logical_resource_id,
                    &request.stack_name,
                    DisplayErrorContext(&e).to_string(),
                )
            })?;
        Ok(())
    }

    async fn describe_stack_memberships(&self, instance_id: &str) -> Result<Vec<StackMembership>> {
        let output = self
            .client
            .describe_stack_resources()
            .physical_resource_id(instance_id)
            .send()
            .await
            .map_err(|e| {
                SignalError::membership_lookup(instance_id, DisplayErrorContext(&e).to_string())
            })?;

        Ok(output
            .stack_resources()
            .iter()
            .filter_map(|resource| resource.stack_name())
            .map(StackMembership::new)
            .collect())
    }
}

/// Creates an [`AwsCloudFormation`] client per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsClientFactory;

#[async_trait]
impl ClientFactory for AwsClientFactory {
    async fn create(&self, region: Option<&str>) -> Result<Arc<dyn CloudFormationApi>> {
        Ok(Arc::new(AwsCloudFormation::from_region(region).await))
    }
}
