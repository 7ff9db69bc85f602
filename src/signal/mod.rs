//! CloudFormation resource signaling
//!
//! [`SignalDispatcher`] sends the single SUCCESS or FAILURE signal for this
//! instance. The remote API sits behind [`CloudFormationApi`] so hosts and
//! tests can supply their own client; [`AwsCloudFormation`] is the SDK-backed
//! implementation.

mod aws;
mod dispatcher;

pub use aws::{AwsClientFactory, AwsCloudFormation};
pub use dispatcher::{SignalDispatcher, SignalTarget};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display};

/// Outcome reported to CloudFormation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Success,
    Failure,
}

impl From<bool> for SignalStatus {
    fn from(success: bool) -> Self {
        if success {
            SignalStatus::Success
        } else {
            SignalStatus::Failure
        }
    }
}

/// Arguments of a `SignalResource` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRequest {
    pub unique_id: String,
    pub logical_resource_id: String,
    pub stack_name: String,
    pub status: SignalStatus,
}

/// A stack the instance belongs to, as reported by the membership lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMembership {
    pub stack_name: String,
}

impl StackMembership {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
        }
    }
}

/// The slice of the CloudFormation API this crate needs.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait CloudFormationApi: Send + Sync {
    async fn signal_resource(&self, request: &SignalRequest) -> Result<()>;

    /// Stacks containing a resource whose physical id is `instance_id`.
    async fn describe_stack_memberships(&self, instance_id: &str) -> Result<Vec<StackMembership>>;

    /// Release whatever the client holds. Called once by the dispatcher on
    /// clients it created itself.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds clients for a [`SignalDispatcher`] that manages its own.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// `region` is `None` when neither config nor metadata provided one.
    async fn create(&self, region: Option<&str>) -> Result<Arc<dyn CloudFormationApi>>;
}
