use super::service::Coordinator;
use super::types::CoordinatorConfig;
use crate::protocol::session::serve_connection;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

/// TCP front end of the coordinator: one task per accepted connection.
pub struct CoordinatorServer {
    coordinator: Arc<Coordinator>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl CoordinatorServer {
    pub async fn bind(config: &CoordinatorConfig) -> Result<Arc<Self>> {
        let coordinator = Coordinator::new(config.routes.clone(), config.timeouts);
        Self::with_coordinator(coordinator, config.bind_addr).await
    }

    pub async fn with_coordinator(
        coordinator: Arc<Coordinator>,
        bind_addr: SocketAddr,
    ) -> Result<Arc<Self>> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("binding coordinator listener on {}", bind_addr))?;
        let local_addr = listener.local_addr()?;

        Ok(Arc::new(Self {
            coordinator,
            listener,
            local_addr,
        }))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub async fn run(self: Arc<Self>) -> Result<()> {
        tracing::info!(
            "Coordinator listening on {} with {} shard route(s)",
            self.local_addr,
            self.coordinator.routes().len()
        );
        for route in self.coordinator.routes().routes() {
            tracing::info!("  - {}", route);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let coordinator = self.coordinator.clone();
                    tokio::spawn(async move {
                        handle_connection(coordinator, stream, peer).await;
                    });
                }
                Err(e) => {
                    tracing::error!("Coordinator accept failed: {}", e);
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
            }
        }
    }
}

async fn handle_connection(coordinator: Arc<Coordinator>, stream: TcpStream, peer: SocketAddr) {
    let conn_id = Uuid::new_v4().to_string();
    tracing::debug!("[{}] client connected from {}", conn_id, peer);

    let result = serve_connection(stream, &conn_id, |command| {
        let coordinator = coordinator.clone();
        async move { coordinator.execute(command).await }
    })
    .await;

    if let Err(e) = result {
        tracing::debug!("[{}] connection error: {}", conn_id, e);
    }
    tracing::debug!("[{}] client disconnected", conn_id);
}
