//! Scaling-group peer discovery
//!
//! Resolves the authoritative set of sibling instances for the local node by
//! querying the cloud provider's autoscaling and instance APIs.

pub mod aws;
pub mod peers;

pub use aws::AwsCloud;
pub use peers::{CloudApi, NodeIdentity, PeerDiscovery, PeerInstance, ScalingGroup};
