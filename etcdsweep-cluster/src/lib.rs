pub mod discovery;
pub mod error;
pub mod health;
pub mod reconcile;
pub mod registry;

pub use discovery::{AwsCloud, CloudApi, NodeIdentity, PeerDiscovery, PeerInstance, ScalingGroup};
pub use error::{Error, Result};
pub use health::{HealthProbe, HealthVerdict, HttpHealthProbe};
pub use reconcile::{PassReport, ReconcileLoop, Reconciler};
pub use registry::{HttpMemberRegistry, Member, MemberRegistry};
