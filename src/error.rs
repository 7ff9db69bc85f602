use thiserror::Error;

/// Boxed cause carried by remote failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, SignalError>;

/// Failures of a single signal attempt.
///
/// None of these ever leave [`SignalDispatcher::send_signal`]; they are
/// logged and dropped there.
///
/// [`SignalDispatcher::send_signal`]: crate::signal::SignalDispatcher::send_signal
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Expected exactly one stack for instance {instance_id}, found {matches}")]
    GroupResolutionAmbiguous { instance_id: String, matches: usize },

    #[error("Failed to signal {resource} in stack {stack}: {source}")]
    RemoteSignal {
        resource: String,
        stack: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to look up stacks for instance {instance_id}: {source}")]
    MembershipLookup {
        instance_id: String,
        #[source]
        source: BoxError,
    },

    /// Raised by `ClientFactory` implementations whose construction can fail.
    /// The SDK-backed factory never does.
    #[error("Failed to create CloudFormation client: {0}")]
    ClientConstruction(String),

    /// Raised by `CloudFormationApi` implementations that hold resources to tear
    /// down. The SDK-backed client has none.
    #[error("Failed to shut down CloudFormation client: {0}")]
    ClientTeardown(String),
}

impl SignalError {
    pub fn remote_signal(
        resource: impl Into<String>,
        stack: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::RemoteSignal {
            resource: resource.into(),
            stack: stack.into(),
            source: source.into(),
        }
    }

    pub fn membership_lookup(instance_id: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::MembershipLookup {
            instance_id: instance_id.into(),
            source: source.into(),
        }
    }

    pub fn ambiguous(instance_id: impl Into<String>, matches: usize) -> Self {
        Self::GroupResolutionAmbiguous {
            instance_id: instance_id.into(),
            matches,
        }
    }
}
