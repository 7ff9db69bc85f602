use super::ConfigService;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable names read by [`SignalConfig::from_config_service`].
pub mod env_keys {
    pub const RESOURCE_NAME: &str = "CFN_SIGNAL_RESOURCE_NAME";
    pub const STACK_NAME: &str = "CFN_SIGNAL_STACK_NAME";
    pub const REGION: &str = "CFN_SIGNAL_REGION";
    pub const INSTANCE_ID: &str = "CFN_SIGNAL_INSTANCE_ID";
    pub const SKIP: &str = "CFN_SIGNAL_SKIP";
    pub const DISCOVER_STACK: &str = "CFN_SIGNAL_DISCOVER_STACK";
}

/// Invalid signal configuration. A config that fails validation never activates the bundle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration value: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Settings for signaling an auto scaling group through CloudFormation.
///
/// Deserializes from the same keys a YAML/JSON application config would carry:
///
/// ```yaml
/// cfSignal:
///   asgResourceName: WebServerGroup
///   stackName: web-prod
///   awsRegion: us-west-2      # optional, defaults to the instance's region
///   ec2InstanceId: i-0abc     # optional, defaults to instance metadata
///   skip: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalConfig {
    /// Logical id of the auto scaling group resource in the stack.
    #[serde(default, rename = "asgResourceName", alias = "resourceName")]
    pub resource_name: Option<String>,

    /// Name of the stack that contains the resource.
    #[serde(default, rename = "stackName", alias = "groupName")]
    pub group_name: Option<String>,

    #[serde(default, rename = "awsRegion", alias = "region")]
    pub region: Option<String>,

    #[serde(default, rename = "ec2InstanceId", alias = "instanceId")]
    pub instance_id: Option<String>,

    /// Disable signaling entirely. Every other field becomes optional.
    #[serde(default)]
    pub skip: bool,

    /// Look the stack name up from the instance id when `group_name` is unset.
    #[serde(default)]
    pub discover_group_name: bool,
}

impl SignalConfig {
    pub fn new(resource_name: impl Into<String>, group_name: impl Into<String>) -> Self {
        Self {
            resource_name: Some(resource_name.into()),
            group_name: Some(group_name.into()),
            ..Self::default()
        }
    }

    /// A config that turns the bundle into a no-op.
    pub fn skipped() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn with_discovered_group_name(mut self) -> Self {
        self.group_name = None;
        self.discover_group_name = true;
        self
    }

    /// Build and validate a config from `CFN_SIGNAL_*` keys.
    pub fn from_config_service(config: &ConfigService) -> Result<Self, ConfigError> {
        let signal_config = Self {
            resource_name: config.get_non_blank(env_keys::RESOURCE_NAME),
            group_name: config.get_non_blank(env_keys::STACK_NAME),
            region: config.get_non_blank(env_keys::REGION),
            instance_id: config.get_non_blank(env_keys::INSTANCE_ID),
            skip: config.get_bool(env_keys::SKIP)?.unwrap_or(false),
            discover_group_name: config.get_bool(env_keys::DISCOVER_STACK)?.unwrap_or(false),
        };
        signal_config.validate()?;
        Ok(signal_config)
    }

    /// Check that everything needed to signal is present, unless skipped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.skip {
            return Ok(());
        }
        if non_blank(&self.resource_name).is_none() {
            return Err(ConfigError::MissingField("asgResourceName"));
        }
        if non_blank(&self.group_name).is_none() && !self.discover_group_name {
            return Err(ConfigError::MissingField("stackName"));
        }
        Ok(())
    }

    pub fn resource_name(&self) -> Option<&str> {
        non_blank(&self.resource_name)
    }

    pub fn group_name(&self) -> Option<&str> {
        non_blank(&self.group_name)
    }

    pub fn region(&self) -> Option<&str> {
        non_blank(&self.region)
    }

    /// The configured instance id. An empty value counts as not configured.
    pub fn instance_id(&self) -> Option<&str> {
        non_blank(&self.instance_id)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Implemented by the host application's configuration type to expose its
/// signal settings to [`SignalBundle`](crate::bundle::SignalBundle).
pub trait HasSignalConfig {
    fn signal_config(&self) -> &SignalConfig;
}

impl HasSignalConfig for SignalConfig {
    fn signal_config(&self) -> &SignalConfig {
        self
    }
}
