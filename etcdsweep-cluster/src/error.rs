//! Error types for the reconciliation library

use thiserror::Error;

/// Reconciliation error types
#[derive(Debug, Error)]
pub enum Error {
    /// The local instance does not belong to any scaling group. There is no
    /// peer concept for such a node, so callers must not retry.
    #[error("instance {0} is not a member of any scaling group")]
    NotInAnyGroup(String),

    /// The cloud API itself failed (network, auth, throttling). Fails the
    /// whole pass.
    #[error("scaling group discovery unavailable: {0}")]
    DiscoveryUnavailable(String),

    /// The etcd members API could not be reached on any configured endpoint.
    /// Fails the whole pass before any removal is attempted.
    #[error("member listing unavailable: {0}")]
    MembersUnavailable(String),

    /// A single member removal was rejected. Non-fatal to the pass; the
    /// member is re-evaluated on the next one.
    #[error("failed to remove member {id}: {reason}")]
    RemoveRejected { id: String, reason: String },

    /// Invalid configuration or transport setup. Process-fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;
