//! Sidecar runtime
//!
//! Wires the cloud, registry and probe clients into the reconcile loop,
//! supervises the loop task and owns the shutdown path. Exit code policy:
//! clean signal shutdown returns `Ok` (exit 0), every fatal error bubbles
//! out of `main` (exit 1) and restart is left to the process supervisor.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use etcdsweep_cluster::{
    AwsCloud, HttpHealthProbe, HttpMemberRegistry, ReconcileLoop, Reconciler,
};
use etcdsweep_core::Config;

pub struct Sidecar {
    config: Config,
}

impl Sidecar {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the reconcile loop and wait for it to fail or for a shutdown
    /// signal, whichever comes first.
    pub async fn start(self) -> Result<()> {
        // Region detection and identity resolution happen once, up front.
        let (cloud, identity) = AwsCloud::connect().await?;
        info!(
            instance = %identity.instance_id,
            region = %identity.region,
            "resolved local instance identity"
        );

        let registry = HttpMemberRegistry::new(
            self.config.etcd.endpoints.clone(),
            self.config.probe_timeout(),
        )?;
        let probe = HttpHealthProbe::new(self.config.probe_timeout())?;

        if !self.config.etcd.enabled {
            info!("membership check disabled, running discovery-only passes");
        }

        let reconciler = Reconciler::new(
            cloud,
            registry,
            probe,
            identity,
            self.config.etcd.enabled,
        );

        let cancel_token = CancellationToken::new();
        let reconcile_loop = ReconcileLoop::new(
            reconciler,
            self.config.poll_interval(),
            cancel_token.clone(),
        );
        let mut loop_handle = tokio::spawn(reconcile_loop.run());

        tokio::select! {
            result = &mut loop_handle => {
                match result {
                    Ok(Ok(())) => info!("reconcile loop stopped"),
                    Ok(Err(e)) => {
                        error!(error = %e, "reconcile loop failed");
                        return Err(e.into());
                    }
                    Err(e) => {
                        error!(error = %e, "reconcile task panicked");
                        return Err(e.into());
                    }
                }
            }
            () = shutdown_signal() => {
                info!("shutdown signal received, stopping reconcile loop");
                cancel_token.cancel();
                // A pass already in flight is allowed to finish.
                match loop_handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(error = %e, "reconcile loop failed during shutdown");
                        return Err(e.into());
                    }
                    Err(e) => {
                        error!(error = %e, "reconcile task panicked during shutdown");
                        return Err(e.into());
                    }
                }
            }
        }

        info!("etcdsweep stopped");
        Ok(())
    }
}

/// Completes when the process receives Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C signal"),
            Err(e) => error!("failed to install Ctrl+C handler: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("received SIGTERM signal");
            }
            Err(e) => error!("failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
