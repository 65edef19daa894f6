//! Admin HTTP Surface
//!
//! Read-only operator endpoints served with axum next to the line protocol:
//! - `GET /health`  -> `{"status":"ok"}`
//! - `GET /servers` -> the routing table
//! - `GET /fanout`  -> per-shard fan-out success/failure counters
//!
//! The catalog itself is not reachable over HTTP.

use super::fanout::ShardHealth;
use super::service::Coordinator;
use super::types::ShardRoute;

use anyhow::{Context, Result};
use axum::{Extension, Json, Router, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

pub const ENDPOINT_HEALTH: &str = "/health";
pub const ENDPOINT_SERVERS: &str = "/servers";
pub const ENDPOINT_FANOUT: &str = "/fanout";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServersResponse {
    pub servers: Vec<ShardRoute>,
}

#[derive(Debug, Serialize)]
pub struct ShardHealthEntry {
    pub shard_id: String,
    #[serde(flatten)]
    pub health: ShardHealth,
}

#[derive(Debug, Serialize)]
pub struct FanoutResponse {
    pub shards: Vec<ShardHealthEntry>,
}

pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_SERVERS, get(handle_servers))
        .route(ENDPOINT_FANOUT, get(handle_fanout))
        .layer(Extension(coordinator))
}

/// Binds `addr` and serves the admin router until the process exits.
pub async fn serve(coordinator: Arc<Coordinator>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding admin listener on {}", addr))?;
    tracing::info!("Admin HTTP listening on {}", listener.local_addr()?);
    axum::serve(listener, router(coordinator)).await?;
    Ok(())
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn handle_servers(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> Json<ServersResponse> {
    Json(ServersResponse {
        servers: coordinator.routes().routes().to_vec(),
    })
}

async fn handle_fanout(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> Json<FanoutResponse> {
    let shards = coordinator
        .routes()
        .routes()
        .iter()
        .map(|route| ShardHealthEntry {
            shard_id: route.shard_id.clone(),
            health: coordinator.health().get(&route.shard_id),
        })
        .collect();

    Json(FanoutResponse { shards })
}
