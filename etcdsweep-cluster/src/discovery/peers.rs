//! Peer resolution over the cloud API seam

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Identity of the local compute instance, resolved once at startup and
/// immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub instance_id: String,
    pub region: String,
}

/// Point-in-time snapshot of one scaling group's membership
#[derive(Debug, Clone)]
pub struct ScalingGroup {
    pub name: String,
    pub instance_ids: Vec<String>,
}

/// Resolved instance record for a scaling-group member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInstance {
    pub instance_id: String,
    pub private_ip: Option<String>,
}

/// Read-only cloud provider surface the discovery logic runs against
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List every scaling group in the region
    async fn list_scaling_groups(&self) -> Result<Vec<ScalingGroup>>;

    /// Resolve full instance records for the given instance ids
    async fn describe_instances(&self, ids: Vec<String>) -> Result<Vec<PeerInstance>>;
}

/// Discovers the peer set of the scaling group the local node belongs to
pub struct PeerDiscovery<C> {
    cloud: C,
}

impl<C: CloudApi> PeerDiscovery<C> {
    pub fn new(cloud: C) -> Self {
        Self { cloud }
    }

    /// Return the full instance set of the scaling group containing `identity`.
    ///
    /// Fails with [`Error::NotInAnyGroup`] when no group lists the instance
    /// (fatal to the caller, a node outside every group has no peer concept)
    /// and with [`Error::DiscoveryUnavailable`] when the cloud API errors.
    pub async fn discover_peers(&self, identity: &NodeIdentity) -> Result<Vec<PeerInstance>> {
        let groups = self.cloud.list_scaling_groups().await?;

        let group = groups
            .into_iter()
            .find(|g| g.instance_ids.iter().any(|id| id == &identity.instance_id))
            .ok_or_else(|| Error::NotInAnyGroup(identity.instance_id.clone()))?;

        tracing::debug!(
            group = %group.name,
            instances = group.instance_ids.len(),
            "resolved owning scaling group"
        );

        self.cloud.describe_instances(group.instance_ids).await
    }
}
