//! Shard TCP Server
//!
//! Accepts connections and spawns one task per connection. Each connection may
//! issue any number of commands until it disconnects or sends `QUIT`.

use super::catalog::Catalog;
use super::types::ShardConfig;
use crate::protocol::session::serve_connection;
use crate::protocol::{Command, ErrorReason, Reply};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

pub struct ShardServer {
    catalog: Arc<Catalog>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl ShardServer {
    /// Opens (or seeds) the catalog and binds the listening socket.
    pub async fn bind(config: &ShardConfig) -> Result<Arc<Self>> {
        let catalog = Catalog::open(&config.shard_id, &config.storage_path).await?;
        Self::with_catalog(catalog, config.bind_addr).await
    }

    pub async fn with_catalog(catalog: Arc<Catalog>, bind_addr: SocketAddr) -> Result<Arc<Self>> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("binding shard listener on {}", bind_addr))?;
        let local_addr = listener.local_addr()?;

        Ok(Arc::new(Self {
            catalog,
            listener,
            local_addr,
        }))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept loop. Runs until the process is terminated.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        tracing::info!(
            "Shard {} listening on {}",
            self.catalog.shard_id(),
            self.local_addr
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, peer).await;
                    });
                }
                Err(e) => {
                    tracing::error!("Shard {} accept failed: {}", self.catalog.shard_id(), e);
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let conn_id = Uuid::new_v4().to_string();
        tracing::debug!("[{}] accepted connection from {}", conn_id, peer);

        let result = serve_connection(stream, &conn_id, |command| {
            let server = self.clone();
            async move { server.execute(command).await }
        })
        .await;

        if let Err(e) = result {
            tracing::debug!("[{}] connection error: {}", conn_id, e);
        }
        tracing::debug!("[{}] connection closed", conn_id);
    }

    /// Runs one command against the catalog.
    pub async fn execute(&self, command: Command) -> Reply {
        match command {
            Command::Search(keyword) => Reply::Rows(
                self.catalog
                    .search(&keyword)
                    .await
                    .iter()
                    .map(|record| record.to_wire_line())
                    .collect(),
            ),
            Command::List => Reply::Rows(
                self.catalog
                    .list_available()
                    .await
                    .iter()
                    .map(|record| record.to_wire_line())
                    .collect(),
            ),
            Command::Lease(id) => Reply::outcome(self.catalog.lease(&id).await),
            Command::Return(id) => Reply::outcome(self.catalog.return_record(&id).await),
            Command::Stats => Reply::Rows(
                self.catalog
                    .stats()
                    .iter()
                    .map(|entry| entry.to_line())
                    .collect(),
            ),
            Command::Quit => Reply::Close,
            Command::Servers | Command::Unknown(_) => {
                tracing::debug!(
                    "Shard {} rejected command '{}'",
                    self.catalog.shard_id(),
                    command
                );
                Reply::error(ErrorReason::UnknownCommand)
            }
        }
    }
}
