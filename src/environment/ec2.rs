use super::InstanceMetadata;
use async_trait::async_trait;
use aws_config::imds::client::Client as ImdsClient;
use aws_config::imds::region::ImdsRegionProvider;
use std::time::Duration;

const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";

/// Off EC2 the metadata endpoint is unroutable; give up quickly so boot is not held up.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// [`InstanceMetadata`] backed by the EC2 instance metadata service (IMDSv2).
#[derive(Debug, Clone)]
pub struct Ec2InstanceMetadata {
    client: ImdsClient,
}

impl Default for Ec2InstanceMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Ec2InstanceMetadata {
    pub fn new() -> Self {
        let client = ImdsClient::builder()
            .max_attempts(1)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build();
        Self { client }
    }

    pub fn with_client(client: ImdsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InstanceMetadata for Ec2InstanceMetadata {
    async fn instance_id(&self) -> Option<String> {
        match self.client.get(INSTANCE_ID_PATH).await {
            Ok(id) => {
                let id: &str = id.as_ref();
                Some(id.to_string())
            }
            Err(e) => {
                tracing::debug!("Instance metadata lookup failed: {}", e);
                None
            }
        }
    }

    async fn region(&self) -> Option<String> {
        ImdsRegionProvider::builder()
            .imds_client(self.client.clone())
            .build()
            .region()
            .await
            .map(|region| region.as_ref().to_string())
    }
}
