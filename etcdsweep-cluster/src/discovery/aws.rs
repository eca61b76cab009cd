//! AWS implementation of the cloud discovery surface
//!
//! Uses the instance metadata service for the local identity and the
//! autoscaling/EC2 APIs for group and instance resolution. All calls are
//! read-only.

use async_trait::async_trait;
use aws_config::BehaviorVersion;

use super::peers::{CloudApi, NodeIdentity, PeerInstance, ScalingGroup};
use crate::error::{Error, Result};

/// Regional AWS clients owned by the reconciliation task
pub struct AwsCloud {
    autoscaling: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsCloud {
    /// Build the regional clients and resolve the local instance identity.
    ///
    /// Region detection happens once here through the default provider chain
    /// (environment, profile, instance metadata); the instance id comes from
    /// the instance metadata service.
    pub async fn connect() -> Result<(Self, NodeIdentity)> {
        let imds = aws_config::imds::Client::builder().build();
        let instance_id: String = imds
            .get("/latest/meta-data/instance-id")
            .await
            .map_err(|e| Error::DiscoveryUnavailable(format!("instance metadata: {e}")))?
            .into();

        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let region = shared
            .region()
            .ok_or_else(|| Error::Configuration("no AWS region detected".to_string()))?
            .to_string();

        let cloud = Self {
            autoscaling: aws_sdk_autoscaling::Client::new(&shared),
            ec2: aws_sdk_ec2::Client::new(&shared),
        };
        let identity = NodeIdentity { instance_id, region };

        Ok((cloud, identity))
    }
}

#[async_trait]
impl CloudApi for AwsCloud {
    async fn list_scaling_groups(&self) -> Result<Vec<ScalingGroup>> {
        let groups = self
            .autoscaling
            .describe_auto_scaling_groups()
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(|e| Error::DiscoveryUnavailable(e.to_string()))?;

        Ok(groups
            .into_iter()
            .map(|group| ScalingGroup {
                name: group.auto_scaling_group_name().unwrap_or_default().to_string(),
                instance_ids: group
                    .instances()
                    .iter()
                    .filter_map(|instance| instance.instance_id().map(str::to_string))
                    .collect(),
            })
            .collect())
    }

    async fn describe_instances(&self, ids: Vec<String>) -> Result<Vec<PeerInstance>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let reservations = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(ids))
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(|e| Error::DiscoveryUnavailable(e.to_string()))?;

        Ok(reservations
            .into_iter()
            .flat_map(|reservation| reservation.instances.unwrap_or_default())
            .map(|instance| PeerInstance {
                instance_id: instance.instance_id().unwrap_or_default().to_string(),
                private_ip: instance.private_ip_address().map(str::to_string),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires instance metadata and AWS credentials"]
    async fn test_connect() {
        // Integration test placeholder
    }
}
