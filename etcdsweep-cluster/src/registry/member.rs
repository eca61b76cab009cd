//! etcd member model

use serde::{Deserialize, Serialize};

/// A registered member of the etcd cluster, as the v2 members API returns it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "peerURLs")]
    pub peer_urls: Vec<String>,
    #[serde(default, rename = "clientURLs")]
    pub client_urls: Vec<String>,
}

impl Member {
    /// Whether the member has published any client-reachable endpoint
    #[must_use]
    pub fn has_client_urls(&self) -> bool {
        !self.client_urls.is_empty()
    }
}

/// Wire shape of `GET /v2/members`
#[derive(Debug, Deserialize)]
pub(crate) struct MemberList {
    #[serde(default)]
    pub members: Vec<Member>,
}
