//! # Meshestra CloudFormation Signal
//!
//! Signals an EC2 auto scaling group through CloudFormation `SignalResource`
//! when a Meshestra application finishes starting, or fails to start, so that
//! a rolling update or scale-out waiting on `CreationPolicy`/`UpdatePolicy`
//! signals can continue or roll back.
//!
//! ## Features
//!
//! - **One signal per process**: SUCCESS on start, FAILURE on startup failure,
//!   nothing for failures during shutdown
//! - **Inert off EC2**: no instance id from metadata means no listener and no AWS calls
//! - **Never fails the host**: signaling errors are logged, not returned
//! - **Bring your own client**: pass an existing CloudFormation client, or let
//!   the bundle create and shut down its own
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshestra_cfn_signal::prelude::*;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = SignalConfig::new("WebServerGroup", "web-prod");
//!
//! let mut lifecycle = LifecycleEnvironment::new();
//! SignalBundle::new().run(&config, &mut lifecycle).await?;
//!
//! let listener = lifecycle
//!     .run_startup(tokio::net::TcpListener::bind("0.0.0.0:3000"))
//!     .await?;
//! // Serve with `listener`...
//! # drop(listener);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod config;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod signal;

// Re-export core types
pub use bundle::{Bundle, SignalBundle, SignalLifecycleListener};
pub use config::{ConfigError, ConfigService, HasSignalConfig, SignalConfig};
pub use environment::{EnvironmentProber, InstanceMetadata, RuntimeIdentity};
pub use error::{Result, SignalError};
pub use signal::{CloudFormationApi, SignalDispatcher, SignalStatus};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use meshestra_cfn_signal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bundle::{Bundle, SignalBundle, SignalLifecycleListener};
    pub use crate::config::{ConfigError, ConfigService, HasSignalConfig, SignalConfig};
    pub use crate::environment::{
        Ec2InstanceMetadata, EnvironmentProber, InstanceMetadata, RuntimeIdentity,
    };
    pub use crate::error::{Result, SignalError};
    pub use crate::lifecycle::{
        FailureContext, LifecycleEnvironment, LifecycleError, LifecycleListener, LifecyclePhase,
        ShutdownHandler, shutdown_signal,
    };
    pub use crate::signal::{
        AwsClientFactory, AwsCloudFormation, ClientFactory, CloudFormationApi, SignalDispatcher,
        SignalRequest, SignalStatus, SignalTarget, StackMembership,
    };
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
