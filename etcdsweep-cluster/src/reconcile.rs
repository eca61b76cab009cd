//! Membership reconciliation: one compare-and-correct pass, and the loop
//! that drives it on a fixed interval until cancelled.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::discovery::{CloudApi, NodeIdentity, PeerDiscovery};
use crate::error::Result;
use crate::health::{HealthProbe, HealthVerdict};
use crate::registry::{Member, MemberRegistry};

/// Summary of one reconciliation pass. Derived from that pass's snapshots
/// only and dropped when the pass ends.
#[derive(Debug, Default, Clone)]
pub struct PassReport {
    /// Instances currently in the scaling group
    pub peers: usize,
    /// Members registered at the time of the pass, when the check ran
    pub members: usize,
    /// Members probed unreachable and slated for removal
    pub unreachable: Vec<String>,
    /// Members actually removed this pass
    pub removed: Vec<String>,
    /// Members with no client urls, skipped
    pub indeterminate: usize,
    /// Healthy members whose urls match no current peer instance
    pub stale: usize,
}

/// Orchestrates one pass between the scaling group and the etcd member list
pub struct Reconciler<C, R, P> {
    discovery: PeerDiscovery<C>,
    registry: R,
    probe: P,
    identity: NodeIdentity,
    membership_check: bool,
}

impl<C, R, P> Reconciler<C, R, P>
where
    C: CloudApi,
    R: MemberRegistry,
    P: HealthProbe,
{
    pub fn new(
        cloud: C,
        registry: R,
        probe: P,
        identity: NodeIdentity,
        membership_check: bool,
    ) -> Self {
        Self {
            discovery: PeerDiscovery::new(cloud),
            registry,
            probe,
            identity,
            membership_check,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Discovery and member-listing failures abort the pass before any
    /// removal is attempted. Individual probe and removal failures do not:
    /// those members are simply re-evaluated on the next pass.
    pub async fn run_once(&self) -> Result<PassReport> {
        let peers = self.discovery.discover_peers(&self.identity).await?;

        let mut report = PassReport {
            peers: peers.len(),
            ..PassReport::default()
        };

        if !self.membership_check {
            tracing::debug!(peers = report.peers, "membership check disabled, discovery-only pass");
            return Ok(report);
        }

        let members = self.registry.list_members().await?;
        report.members = members.len();

        let peer_ips: HashSet<&str> = peers
            .iter()
            .filter_map(|peer| peer.private_ip.as_deref())
            .collect();

        // Verdicts for the whole snapshot are collected before any removal
        // is issued.
        let mut removal_set = Vec::new();
        for member in &members {
            match self.probe.probe(member).await {
                HealthVerdict::Unreachable => {
                    tracing::warn!(
                        member = %member.id,
                        name = %member.name,
                        "member unreachable, scheduling removal"
                    );
                    removal_set.push(member.clone());
                }
                HealthVerdict::Indeterminate => {
                    report.indeterminate += 1;
                }
                HealthVerdict::Healthy => {
                    // Eviction stays probe-driven: absence from the scaling
                    // group is surfaced in the logs, never acted on alone.
                    if !peer_ips.is_empty() && !advertised_on_peer(member, &peer_ips) {
                        report.stale += 1;
                        tracing::warn!(
                            member = %member.id,
                            name = %member.name,
                            "healthy member matches no scaling-group instance"
                        );
                    }
                }
            }
        }

        for member in removal_set {
            match self.registry.remove_member(&member.id).await {
                Ok(()) => {
                    tracing::info!(member = %member.id, "removed unreachable member");
                    report.removed.push(member.id.clone());
                }
                Err(e) => {
                    // Best-effort: a failed removal is retried by the next
                    // pass's own snapshot.
                    tracing::warn!(member = %member.id, error = %e, "member removal failed");
                }
            }
            report.unreachable.push(member.id);
        }

        Ok(report)
    }
}

/// Whether any of the member's advertised urls points at a known peer ip
fn advertised_on_peer(member: &Member, peer_ips: &HashSet<&str>) -> bool {
    member
        .peer_urls
        .iter()
        .chain(&member.client_urls)
        .filter_map(|raw| url::Url::parse(raw).ok())
        .filter_map(|url| url.host_str().map(str::to_string))
        .any(|host| peer_ips.contains(host.as_str()))
}

/// Drives the reconciler until cancelled. Passes are strictly sequential;
/// the next one never starts before the previous one has returned.
pub struct ReconcileLoop<C, R, P> {
    reconciler: Reconciler<C, R, P>,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl<C, R, P> ReconcileLoop<C, R, P>
where
    C: CloudApi,
    R: MemberRegistry,
    P: HealthProbe,
{
    pub fn new(
        reconciler: Reconciler<C, R, P>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            reconciler,
            interval,
            cancel_token,
        }
    }

    /// Run passes until cancellation. The first pass starts immediately.
    ///
    /// Pass errors propagate to the caller; the loop does not retry.
    /// Cancellation is observed at the wait point only, so a pass already in
    /// flight completes before the loop returns.
    pub async fn run(self) -> Result<()> {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::info!("reconcile loop shutting down");
                    return Ok(());
                }
                _ = timer.tick() => {
                    let report = self.reconciler.run_once().await?;
                    tracing::info!(
                        peers = report.peers,
                        members = report.members,
                        removed = report.removed.len(),
                        indeterminate = report.indeterminate,
                        stale = report.stale,
                        "reconciliation pass complete"
                    );
                }
            }
        }
    }
}
