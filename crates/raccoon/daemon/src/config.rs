//! Configuration for the raccoon daemon

use std::path::{Path, PathBuf};
use std::time::Duration;

use raccoon_core::{PacingPolicy, Settings, DEFAULT_TTL_ANNOTATION};
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{DaemonError, DaemonResult};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaccoonConfig {
    /// Metrics server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Cluster connection
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Garbage collection of aged pods
    #[serde(default)]
    pub garbage: GarbageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metrics server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port serving `/metrics`
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Cluster connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// `in` for in-cluster credentials, `out` for a kubeconfig file
    #[serde(default = "default_location")]
    pub location: String,

    /// Kubeconfig used out of cluster when `KUBECONFIG` is unset
    #[serde(default = "default_kubeconfig")]
    pub kubeconfig: Option<PathBuf>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            kubeconfig: default_kubeconfig(),
        }
    }
}

/// Garbage collection of aged pods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarbageConfig {
    /// Namespace to watch, empty for all
    #[serde(default)]
    pub namespace: String,

    /// Label selector pods must match
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Minimum age before a pod is evicted
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Annotation overriding the TTL per pod
    #[serde(default = "default_ttl_annotation")]
    pub ttl_annotation: String,

    /// Seconds between two discovery passes
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Upper bound in seconds of the delay between two evictions
    #[serde(default = "default_randomized_delay")]
    pub randomized_delay_secs: u64,

    /// Log evictions without performing them
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for GarbageConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            selector: default_selector(),
            ttl: default_ttl(),
            ttl_annotation: default_ttl_annotation(),
            check_interval_secs: default_check_interval(),
            randomized_delay_secs: default_randomized_delay(),
            dry_run: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default = "default_true")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: true,
        }
    }
}

impl LoggingConfig {
    /// Filter from `RUST_LOG`, falling back to the configured level.
    ///
    /// The configured level must name a level even when `RUST_LOG` is set.
    pub fn env_filter(&self) -> DaemonResult<EnvFilter> {
        let level: LevelFilter = self
            .level
            .parse()
            .map_err(|_| DaemonError::Config(format!("unknown log level {:?}", self.level)))?;

        Ok(EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy())
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    2112
}

fn default_location() -> String {
    "in".to_string()
}

fn default_kubeconfig() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}

fn default_selector() -> String {
    "backmarket.com/raccoon=true".to_string()
}

fn default_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_ttl_annotation() -> String {
    DEFAULT_TTL_ANNOTATION.to_string()
}

fn default_check_interval() -> u64 {
    120
}

fn default_randomized_delay() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RaccoonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `RACCOON_` environment variables (`__` separates nested keys, e.g.
    /// `RACCOON_GARBAGE__DRY_RUN=true`).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&RaccoonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RACCOON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Settings handed to the scheduling core
    pub fn settings(&self) -> Settings {
        Settings {
            namespace: self.garbage.namespace.clone(),
            selector: self.garbage.selector.clone(),
            default_ttl: self.garbage.ttl,
            dry_run: self.garbage.dry_run,
            ttl_annotation: self.garbage.ttl_annotation.clone(),
        }
    }

    /// Pacing between evictions
    pub fn pacing(&self) -> PacingPolicy {
        PacingPolicy::from_secs(self.garbage.randomized_delay_secs)
    }

    /// Interval between discovery passes
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.garbage.check_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RaccoonConfig::default();
        assert_eq!(config.server.port, 2112);
        assert_eq!(config.cluster.location, "in");
        assert_eq!(config.garbage.ttl, Duration::from_secs(86_400));
        assert_eq!(config.garbage.check_interval_secs, 120);
        assert_eq!(config.garbage.randomized_delay_secs, 120);
        assert!(!config.garbage.dry_run);
        assert!(config.logging.json);
    }

    #[test]
    fn test_settings_projection() {
        let mut config = RaccoonConfig::default();
        config.garbage.namespace = "jobs".to_string();
        config.garbage.dry_run = true;

        let settings = config.settings();
        assert_eq!(settings.namespace, "jobs");
        assert_eq!(settings.selector, "backmarket.com/raccoon=true");
        assert!(settings.dry_run);
        assert_eq!(config.pacing().max_delay(), Duration::from_secs(120));
        assert_eq!(config.check_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[garbage]
namespace = "batch"
ttl = "2h 30m"
randomized_delay_secs = 30

[cluster]
location = "out"
"#
        )
        .unwrap();

        let config = RaccoonConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.garbage.namespace, "batch");
        assert_eq!(config.garbage.ttl, Duration::from_secs(9_000));
        assert_eq!(config.garbage.randomized_delay_secs, 30);
        assert_eq!(config.garbage.selector, "backmarket.com/raccoon=true");
        assert_eq!(config.cluster.location, "out");
        assert_eq!(config.server.port, 2112);
    }

    #[test]
    fn test_nested_env_overrides() {
        std::env::set_var("RACCOON_GARBAGE__DRY_RUN", "true");
        std::env::set_var("RACCOON_GARBAGE__TTL_ANNOTATION", "example.com/ttl");
        let loaded = RaccoonConfig::load(None);
        std::env::remove_var("RACCOON_GARBAGE__DRY_RUN");
        std::env::remove_var("RACCOON_GARBAGE__TTL_ANNOTATION");

        let config = loaded.unwrap();
        assert!(config.garbage.dry_run);
        assert_eq!(config.garbage.ttl_annotation, "example.com/ttl");
        assert_eq!(config.garbage.check_interval_secs, 120);
    }

    #[test]
    fn test_log_level_validation() {
        let mut logging = LoggingConfig::default();
        assert!(logging.env_filter().is_ok());

        logging.level = "debug".to_string();
        assert!(logging.env_filter().is_ok());

        logging.level = "verbose".to_string();
        let err = logging.env_filter().unwrap_err();
        assert!(matches!(err, DaemonError::Config(ref msg) if msg.contains("verbose")));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RaccoonConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
