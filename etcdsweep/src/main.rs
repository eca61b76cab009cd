mod sidecar;

use anyhow::Result;
use tracing::info;

use etcdsweep_core::{load_config, logging};

use sidecar::Sidecar;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = load_config()?;

    // 2. Validate configuration (fail fast on misconfigurations)
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 3. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("etcdsweep starting...");
    info!(
        poll_interval_seconds = config.reconcile.poll_interval_seconds,
        membership_check = config.etcd.enabled,
        "configuration loaded"
    );

    // 4. Run until a fatal error or a shutdown signal
    Sidecar::new(config).start().await
}
