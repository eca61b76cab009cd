//! Member health probing
//!
//! A member is healthy only when every one of its published client URLs
//! answers a /health request within the transport timeout.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::registry::Member;

/// Per-member result of one probe pass. Recomputed every pass, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthVerdict {
    /// Every published client URL answered
    Healthy,
    /// At least one client URL did not answer
    Unreachable,
    /// The member publishes no client URLs, so there is nothing to probe
    Indeterminate,
}

/// Probe surface the reconciler runs against
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, member: &Member) -> HealthVerdict;
}

/// HTTP probe against `<client-url>/health`
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    /// Build the probe transport once, with a bounded request timeout.
    /// A builder failure is a fatal configuration error, not a probe result.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("health transport setup failed: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, member: &Member) -> HealthVerdict {
        if !member.has_client_urls() {
            tracing::info!(member = %member.id, "member publishes no client urls, cannot probe");
            return HealthVerdict::Indeterminate;
        }

        // A member answering on only part of its advertised urls is treated
        // as unreachable, not partially healthy.
        for url in &member.client_urls {
            let health_url = format!("{}/health", url.trim_end_matches('/'));
            // Any response counts as alive; only transport failures mark the
            // member unreachable.
            if let Err(e) = self.client.get(&health_url).send().await {
                tracing::warn!(member = %member.id, url = %health_url, error = %e, "health check failed");
                return HealthVerdict::Unreachable;
            }
        }

        HealthVerdict::Healthy
    }
}
