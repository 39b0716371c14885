//! Command line interface
//!
//! Every flag can also be set through a `RACCOON_<FLAG>` environment
//! variable (dashes become underscores). Flags override the configuration
//! file and the nested `RACCOON_SECTION__KEY` variables.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::RaccoonConfig;

/// Raccoon CLI
#[derive(Debug, Parser)]
#[command(name = "raccoon")]
#[command(about = "Raccoon marks and evicts pods based on their age", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RACCOON_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "RACCOON_LEVEL", global = true)]
    pub level: Option<String>,

    /// Log output format
    #[arg(long, env = "RACCOON_LOG_FORMAT", value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// HTTP port serving /metrics
    #[arg(short, long, env = "RACCOON_PORT", global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the raccoon daemon
    Garbage(GarbageArgs),
}

#[derive(Debug, Default, Args)]
pub struct GarbageArgs {
    /// Namespace to raccoon, all namespaces when empty
    #[arg(short, long, env = "RACCOON_NAMESPACE")]
    pub namespace: Option<String>,

    /// Label selector to filter on, supports '=', '==' and '!=' (e.g. key1=value1,key2=value2)
    #[arg(short, long, env = "RACCOON_SELECTOR")]
    pub selector: Option<String>,

    /// Minimum age after which a pod is evicted (e.g. 24h, 90m)
    #[arg(long, env = "RACCOON_TTL", value_parser = humantime::parse_duration)]
    pub ttl: Option<Duration>,

    /// Annotation overriding the TTL of a single pod
    #[arg(long, env = "RACCOON_TTL_ANNOTATION")]
    pub ttl_annotation: Option<String>,

    /// Seconds between two raccoon checks
    #[arg(long, env = "RACCOON_CHECK_INTERVAL")]
    pub check_interval: Option<u64>,

    /// Delay between evictions, drawn at random in [value/2, value] seconds
    #[arg(long, env = "RACCOON_RANDOMIZED_DELAY")]
    pub randomized_delay: Option<u64>,

    /// Run the whole process without evicting anything
    #[arg(long, env = "RACCOON_DRY_RUN")]
    pub dry_run: bool,

    /// Connection mode to the Kubernetes API (in or out)
    #[arg(long, env = "RACCOON_KUBE_LOCATION")]
    pub kube_location: Option<String>,

    /// Path to a kubeconfig file, ignored if KUBECONFIG is set
    #[arg(long, env = "RACCOON_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut RaccoonConfig) {
        if let Some(level) = &self.level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.json = format == LogFormat::Json;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let Command::Garbage(args) = &self.command;
        args.apply(config);
    }
}

impl GarbageArgs {
    fn apply(&self, config: &mut RaccoonConfig) {
        let garbage = &mut config.garbage;
        if let Some(namespace) = &self.namespace {
            garbage.namespace = namespace.clone();
        }
        if let Some(selector) = &self.selector {
            garbage.selector = selector.clone();
        }
        if let Some(ttl) = self.ttl {
            garbage.ttl = ttl;
        }
        if let Some(annotation) = &self.ttl_annotation {
            garbage.ttl_annotation = annotation.clone();
        }
        if let Some(interval) = self.check_interval {
            garbage.check_interval_secs = interval;
        }
        if let Some(delay) = self.randomized_delay {
            garbage.randomized_delay_secs = delay;
        }
        if self.dry_run {
            garbage.dry_run = true;
        }

        if let Some(location) = &self.kube_location {
            config.cluster.location = location.clone();
        }
        if let Some(path) = &self.kubeconfig {
            config.cluster.kubeconfig = Some(path.clone());
        }
    }
}
