//! Metrics endpoint and process signals

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::{DaemonError, DaemonResult};

/// Export metrics in Prometheus text format
pub fn export_metrics(registry: &Registry) -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Metrics endpoint state
#[derive(Clone)]
pub struct MetricsState {
    pub registry: Arc<Registry>,
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<MetricsState>) -> Response {
    match export_metrics(&state.registry) {
        Ok(metrics) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Create an axum router for metrics
pub fn metrics_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(MetricsState { registry })
}

/// Serve `/metrics` until the token is cancelled.
pub async fn serve_metrics(
    listener: TcpListener,
    registry: Arc<Registry>,
    cancel: CancellationToken,
) -> DaemonResult<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "serving metrics");
    }

    axum::serve(listener, metrics_router(registry))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| DaemonError::Server(e.to_string()))
}

/// Cancel the token on SIGINT or SIGTERM.
pub async fn cancel_on_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = shutdown_signal() => cancel.cancel(),
        _ = cancel.cancelled() => {}
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("received terminate signal, shutting down");
        }
    }
}
