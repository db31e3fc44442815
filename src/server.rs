//! HTTP Server and Metrics Collection
//!
//! This module implements the Prometheus exporter HTTP server and the metric collection loop.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing metrics, health and workload actions
//! - **Collection Loop**: Background task that periodically runs the collectors over SSH
//! - **State Management**: Shared state (config, metrics, client) using Arc for thread-safety
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Health check (returns 200 if Unraid is reachable, 503 otherwise)
//! - `POST /containers/{name}/{action}` - start, stop, pause, unpause or restart a container
//! - `POST /vms/{name}/{action}` - start, shutdown, reboot, suspend, resume or destroy a VM
//! - `POST /userscripts/{name}/{action}` - run, background or stop a User Scripts plugin script
//!
//! Action endpoints answer 200 on success, 400 for an unknown action or empty name,
//! and 502 when the remote command fails.
//!
//! # Metrics Collection
//!
//! The collection loop runs every N seconds (configured via `scrape_interval_seconds`) and:
//! 1. Runs all enabled collectors
//! 2. Updates Prometheus metrics with the latest values
//! 3. Sets `unraid_up` to 1 if any collector succeeds, 0 if all fail
//!
//! # Shutdown
//!
//! Ctrl-C stops the listener, the collection task, and then the SSH pool.

use crate::collectors::{self, CollectionContext, CollectionStatus};
use crate::config::Config;
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::unraid::operations::{ContainerAction, UserScriptAction, VmAction};
use crate::unraid::UnraidClient;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    config: Config,
    metrics: MetricsCollector,
    client: Arc<UnraidClient>,
}

impl AppState {
    pub fn new(config: Config, metrics: MetricsCollector, client: Arc<UnraidClient>) -> Self {
        Self {
            config,
            metrics,
            client,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn client(&self) -> &Arc<UnraidClient> {
        &self.client
    }
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;
    let client = Arc::new(UnraidClient::new(&config.unraid, &config.pool));

    // A failed first connection is retried by the collection loop
    match client.connect().await {
        Ok(()) => info!(host = %client.host(), "Connected to Unraid"),
        Err(e) => warn!(host = %client.host(), "Initial connection failed: {}", e),
    }

    let state = AppState::new(config.clone(), metrics, Arc::clone(&client));

    // Start background metrics collection
    let collection_state = state.clone();
    let collection = tokio::spawn(async move {
        collect_metrics_loop(collection_state).await;
    });

    let app = router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::Server(format!("failed to bind {addr}: {e}")))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    collection.abort();
    client.shutdown().await;
    info!("Connection pool shut down");

    served.map_err(|e| ExporterError::Server(e.to_string()))?;
    Ok(())
}

/// Build the HTTP router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/containers/{name}/{action}", post(container_action_handler))
        .route("/vms/{name}/{action}", post(vm_action_handler))
        .route("/userscripts/{name}/{action}", post(userscript_action_handler))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn collect_metrics_loop(state: AppState) {
    let mut ticker = interval(Duration::from_secs(
        state.config.metrics.scrape_interval_seconds,
    ));

    loop {
        ticker.tick().await;

        if let Err(e) = collect_metrics(&state).await {
            error!("Failed to collect metrics: {}", e);
            state.metrics.up.set(0.0);
        } else {
            state.metrics.up.set(1.0);
        }
    }
}

/// Run every enabled collector once.
///
/// Fails only when no collector that talks to the host succeeded.
pub async fn collect_metrics(state: &AppState) -> anyhow::Result<()> {
    info!("Collecting metrics from Unraid");

    let ctx = CollectionContext {
        client: &state.client,
        metrics: &state.metrics,
        config: &state.config.metrics,
    };

    let mut any_success = false;

    // Helper macro to track success
    macro_rules! collect {
        ($name:expr, $collector:expr) => {
            let status = $collector.await?;
            state
                .metrics
                .collector_success
                .with_label_values(&[$name])
                .set(crate::metrics::bool_value(status.is_success()));
            match status {
                CollectionStatus::Success => any_success = true,
                CollectionStatus::Failed => { /* Already logged */ }
            }
        };
    }

    // Storage
    collect!("array", collectors::collect_array_metrics(&ctx));
    collect!("filesystem", collectors::collect_filesystem_metrics(&ctx));
    if ctx.config.collect_smart_metrics {
        collect!("smart", collectors::collect_smart_metrics(&ctx));
    }

    // Workloads
    if ctx.config.collect_docker_metrics {
        collect!("docker", collectors::collect_docker_metrics(&ctx));
    }
    if ctx.config.collect_vm_metrics {
        collect!("vm", collectors::collect_vm_metrics(&ctx));
    }

    // System health
    collect!("system", collectors::collect_system_metrics(&ctx));
    collect!("temperature", collectors::collect_temperature_metrics(&ctx));
    collect!("network", collectors::collect_network_metrics(&ctx));
    if ctx.config.collect_ups_metrics {
        collect!("ups", collectors::collect_ups_metrics(&ctx));
    }
    if ctx.config.collect_userscript_metrics {
        collect!("userscripts", collectors::collect_userscript_metrics(&ctx));
    }

    // Pool state is local and says nothing about reachability
    collectors::collect_connection_metrics(&ctx).await?;

    // If all collectors failed, return error so unraid_up is set to 0
    if !any_success {
        anyhow::bail!("Failed to collect any metrics from Unraid - check SSH access");
    }

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    r#"<html>
<head><title>Unraid Exporter</title></head>
<body>
<h1>Unraid Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let up_value = state.metrics.up.get();

    if up_value > 0.0 {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Unraid host unreachable")
    }
}

/// 400 for requests we refuse before running anything, 502 for remote failures.
fn action_error(kind: &str, name: &str, action: &str, e: ExporterError) -> Response {
    let status = match e {
        ExporterError::Parse(_) => StatusCode::BAD_REQUEST,
        _ => {
            warn!("{} action {} on {} failed: {}", kind, action, name, e);
            StatusCode::BAD_GATEWAY
        }
    };
    (
        status,
        Json(json!({
            "kind": kind,
            "name": name,
            "action": action,
            "error": e.to_string(),
        })),
    )
        .into_response()
}

fn action_ok(kind: &str, name: &str, action: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "kind": kind,
            "name": name,
            "action": action,
            "status": "ok",
        })),
    )
        .into_response()
}

async fn container_action_handler(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
) -> Response {
    let parsed = match ContainerAction::from_str(&action) {
        Ok(parsed) => parsed,
        Err(e) => return action_error("container", &name, &action, e),
    };

    match state.client.docker().apply(&name, parsed).await {
        Ok(()) => action_ok("container", &name, parsed.as_str()),
        Err(e) => action_error("container", &name, parsed.as_str(), e),
    }
}

async fn vm_action_handler(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
) -> Response {
    let parsed = match VmAction::from_str(&action) {
        Ok(parsed) => parsed,
        Err(e) => return action_error("vm", &name, &action, e),
    };

    match state.client.vm().apply(&name, parsed).await {
        Ok(()) => action_ok("vm", &name, parsed.as_str()),
        Err(e) => action_error("vm", &name, parsed.as_str(), e),
    }
}

async fn userscript_action_handler(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
) -> Response {
    let parsed = match UserScriptAction::from_str(&action) {
        Ok(parsed) => parsed,
        Err(e) => return action_error("userscript", &name, &action, e),
    };

    match state.client.userscripts().apply(&name, parsed).await {
        Ok(()) => action_ok("userscript", &name, parsed.as_str()),
        Err(e) => action_error("userscript", &name, parsed.as_str(), e),
    }
}
