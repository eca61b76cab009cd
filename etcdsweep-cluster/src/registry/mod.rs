//! etcd membership registry access

use async_trait::async_trait;

use crate::error::Result;

pub mod http;
pub mod member;

pub use http::HttpMemberRegistry;
pub use member::Member;

/// Registry surface the reconciler runs against.
///
/// The reconciler holds transient read/delete access only; the registry's
/// state is owned by the etcd cluster itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRegistry: Send + Sync {
    /// List the currently registered members
    async fn list_members(&self) -> Result<Vec<Member>>;

    /// Remove a member by id. Removing an id that is already gone succeeds.
    async fn remove_member(&self, id: &str) -> Result<()>;
}
