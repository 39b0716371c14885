//! Raccoon - evicts pods older than their TTL
//!
//! The daemon lists pods matching a label selector on a fixed interval,
//! marks those older than their TTL and evicts them one at a time with a
//! randomized delay in between. Eviction counts are exposed on `/metrics`.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use prometheus::Registry;
use raccoon_core::{CancellationToken, Daemon, EvictionMetrics};
use raccoon_daemon::error::{DaemonError, DaemonResult};
use raccoon_daemon::{server, Cli, RaccoonConfig};
use raccoon_kube::{ClusterLocation, KubeDirectory};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = RaccoonConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Initialize tracing
    let env_filter = config.logging.env_filter()?;

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let result = run(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "raccoon stopped");
    }
    result
}

async fn run(config: RaccoonConfig) -> DaemonResult<()> {
    let location: ClusterLocation = config.cluster.location.parse()?;
    let client = raccoon_kube::connect(location, config.cluster.kubeconfig.as_deref()).await?;

    let cancel = CancellationToken::new();
    tokio::spawn(server::cancel_on_signal(cancel.clone()));

    let registry = Arc::new(Registry::new());
    let metrics = EvictionMetrics::new(&registry)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    let metrics_server = tokio::spawn(server::serve_metrics(listener, registry, cancel.clone()));

    let settings = config.settings();
    tracing::info!(
        namespace = %settings.namespace,
        selector = %settings.selector,
        ttl = %humantime::format_duration(settings.default_ttl),
        dry_run = settings.dry_run,
        "starting raccoon"
    );

    let mut daemon = Daemon::new(
        settings,
        config.pacing(),
        Arc::new(KubeDirectory::new(client)),
        Arc::new(metrics),
        cancel.clone(),
    );

    let result = daemon.run(config.check_interval()).await;
    daemon.shutdown().await;

    match metrics_server.await {
        Ok(served) => served?,
        Err(e) => return Err(DaemonError::Server(e.to_string())),
    }

    result.map_err(DaemonError::from)
}
