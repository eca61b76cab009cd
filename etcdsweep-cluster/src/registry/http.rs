//! HTTP client for the etcd v2 members API

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::member::{Member, MemberList};
use super::MemberRegistry;
use crate::error::{Error, Result};

/// Members API client trying each configured endpoint in order
#[derive(Debug)]
pub struct HttpMemberRegistry {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl HttpMemberRegistry {
    /// Build a members client for the given endpoints.
    ///
    /// Endpoints are validated up front; a transport builder failure is a
    /// fatal configuration error.
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::Configuration("no etcd endpoints configured".to_string()));
        }
        for endpoint in &endpoints {
            url::Url::parse(endpoint)
                .map_err(|e| Error::Configuration(format!("invalid etcd endpoint '{endpoint}': {e}")))?;
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("members transport setup failed: {e}")))?;

        Ok(Self { endpoints, client })
    }

    fn members_url(endpoint: &str) -> String {
        format!("{}/v2/members", endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl MemberRegistry for HttpMemberRegistry {
    async fn list_members(&self) -> Result<Vec<Member>> {
        let mut last_error = String::new();

        for endpoint in &self.endpoints {
            let url = Self::members_url(endpoint);
            match self.client.get(&url).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => match response.json::<MemberList>().await {
                        Ok(list) => return Ok(list.members),
                        Err(e) => last_error = format!("{url}: {e}"),
                    },
                    Err(e) => last_error = format!("{url}: {e}"),
                },
                Err(e) => last_error = format!("{url}: {e}"),
            }
            tracing::warn!(endpoint = %endpoint, error = %last_error, "member listing failed on endpoint");
        }

        Err(Error::MembersUnavailable(last_error))
    }

    async fn remove_member(&self, id: &str) -> Result<()> {
        let mut last_error = String::new();

        for endpoint in &self.endpoints {
            let url = format!("{}/{}", Self::members_url(endpoint), id);
            match self.client.delete(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    // An id that is already gone counts as removed.
                    if status.is_success()
                        || status == StatusCode::NOT_FOUND
                        || status == StatusCode::GONE
                    {
                        return Ok(());
                    }
                    last_error = format!("{url}: unexpected status {status}");
                }
                Err(e) => last_error = format!("{url}: {e}"),
            }
        }

        Err(Error::RemoveRejected {
            id: id.to_string(),
            reason: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn members_body() -> serde_json::Value {
        json!({
            "members": [
                {
                    "id": "a1",
                    "name": "infra1",
                    "peerURLs": ["http://10.0.1.10:2380"],
                    "clientURLs": ["http://10.0.1.10:2379"]
                },
                {
                    "id": "b2",
                    "name": "infra2",
                    "peerURLs": ["http://10.0.1.11:2380"],
                    "clientURLs": ["http://10.0.1.11:2379"]
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_list_members() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(members_body()))
            .mount(&server)
            .await;

        let registry =
            HttpMemberRegistry::new(vec![server.uri()], Duration::from_secs(1)).unwrap();
        let members = registry.list_members().await.unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id, "a1");
        assert_eq!(members[1].client_urls, vec!["http://10.0.1.11:2379"]);
    }

    #[tokio::test]
    async fn test_list_members_falls_back_to_next_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(members_body()))
            .mount(&server)
            .await;

        // Port 1 refuses connections; the second endpoint must serve the call.
        let registry = HttpMemberRegistry::new(
            vec!["http://127.0.0.1:1".to_string(), server.uri()],
            Duration::from_secs(1),
        )
        .unwrap();
        let members = registry.list_members().await.unwrap();

        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn test_list_members_unavailable_when_all_endpoints_fail() {
        let registry = HttpMemberRegistry::new(
            vec!["http://127.0.0.1:1".to_string()],
            Duration::from_millis(200),
        )
        .unwrap();

        let err = registry.list_members().await.unwrap_err();
        assert!(matches!(err, Error::MembersUnavailable(_)));
    }

    #[tokio::test]
    async fn test_remove_member() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/members/a1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let registry =
            HttpMemberRegistry::new(vec![server.uri()], Duration::from_secs(1)).unwrap();
        registry.remove_member("a1").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_member_already_gone_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/members/a1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let registry =
            HttpMemberRegistry::new(vec![server.uri()], Duration::from_secs(1)).unwrap();
        registry.remove_member("a1").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_member_rejected_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/members/a1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let registry =
            HttpMemberRegistry::new(vec![server.uri()], Duration::from_secs(1)).unwrap();
        let err = registry.remove_member("a1").await.unwrap_err();

        assert!(matches!(err, Error::RemoveRejected { id, .. } if id == "a1"));
    }

    #[test]
    fn test_new_rejects_empty_endpoints() {
        let err = HttpMemberRegistry::new(Vec::new(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_new_rejects_malformed_endpoint() {
        let err = HttpMemberRegistry::new(
            vec!["not a url".to_string()],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
