use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sidecar configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reconcile: ReconcileConfig,
    pub etcd: EtcdConfig,
    pub probe: ProbeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Seconds between reconciliation passes
    pub poll_interval_seconds: u64,
    /// Back-off after a failed pass. Accepted and validated, but the loop
    /// currently fails fast and delegates restart to the process supervisor;
    /// see DESIGN.md.
    pub err_backoff_seconds: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 60,
            err_backoff_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdConfig {
    /// Enable the membership check. When off, the sidecar still discovers
    /// scaling-group peers every pass but never touches the etcd member list.
    pub enabled: bool,
    /// Client endpoints of the etcd cluster
    pub endpoints: Vec<String>,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoints: vec!["http://127.0.0.1:2379".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Transport timeout for member health requests, in seconds
    pub timeout_seconds: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Load config file if provided
        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (ETCDSWEEP_ETCD_ENABLED, etc.)
        builder = builder.add_source(
            Environment::with_prefix("ETCDSWEEP")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Validate the configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.reconcile.poll_interval_seconds == 0 {
            errors.push("reconcile.poll_interval_seconds must be greater than zero".to_string());
        }
        if self.probe.timeout_seconds == 0 {
            errors.push("probe.timeout_seconds must be greater than zero".to_string());
        }
        if self.etcd.enabled && self.etcd.endpoints.is_empty() {
            errors.push("etcd.endpoints must not be empty when the membership check is enabled".to_string());
        }
        for endpoint in &self.etcd.endpoints {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                errors.push(format!("etcd endpoint '{endpoint}' must be an http(s) URL"));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Poll interval as a `Duration`
    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reconcile.poll_interval_seconds)
    }

    /// Probe transport timeout as a `Duration`
    #[must_use]
    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe.timeout_seconds)
    }
}

/// Resolve and load the configuration file.
///
/// Lookup order: `ETCDSWEEP_CONFIG_PATH`, then `etcdsweep.toml` in the working
/// directory, then the `/config` mount. Missing files fall back to environment
/// variables, then defaults.
pub fn load_config() -> anyhow::Result<Config> {
    let config_path = std::env::var("ETCDSWEEP_CONFIG_PATH")
        .ok()
        .filter(|p| Path::new(p).exists())
        .or_else(|| {
            let cwd = "etcdsweep.toml";
            Path::new(cwd).exists().then(|| cwd.to_string())
        })
        .or_else(|| {
            let mounted = "/config/etcdsweep.toml";
            Path::new(mounted).exists().then(|| mounted.to_string())
        });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        match Config::from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                eprintln!("Falling back to environment variables");
                Config::from_env().unwrap_or_default()
            }
        }
    } else {
        Config::from_env().unwrap_or_else(|e| {
            eprintln!("Failed to load config from environment: {e}");
            Config::default()
        })
    };

    Ok(config)
}
