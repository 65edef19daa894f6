use crate::protocol::Timeouts;
use crate::record::types::owning_shard;

use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Static route to one shard: `shardId@host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShardRoute {
    pub shard_id: String,
    pub host: String,
    pub port: u16,
}

impl ShardRoute {
    pub fn new(shard_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            shard_id: shard_id.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ShardRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.shard_id, self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route '{0}' is not of the form shardId@host:port")]
    Malformed(String),
    #[error("route '{0}' has an invalid port")]
    InvalidPort(String),
    #[error("shard id '{0}' is routed more than once")]
    Duplicate(String),
}

impl FromStr for ShardRoute {
    type Err = RouteError;

    /// Shard id before the first `@`, port after the last `:`, host in between.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let at = s.find('@').filter(|&at| at > 0);
        let colon = s.rfind(':');

        let (at, colon) = match (at, colon) {
            (Some(at), Some(colon)) if colon > at + 1 => (at, colon),
            _ => return Err(RouteError::Malformed(s.to_string())),
        };

        let port = s[colon + 1..]
            .parse::<u16>()
            .map_err(|_| RouteError::InvalidPort(s.to_string()))?;

        Ok(ShardRoute::new(&s[..at], &s[at + 1..colon], port))
    }
}

/// Ordered, immutable shard-id -> address table.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<ShardRoute>,
}

impl RoutingTable {
    pub fn new(routes: Vec<ShardRoute>) -> Result<Self, RouteError> {
        for (i, route) in routes.iter().enumerate() {
            if routes[..i].iter().any(|r| r.shard_id == route.shard_id) {
                return Err(RouteError::Duplicate(route.shard_id.clone()));
            }
        }
        Ok(Self { routes })
    }

    pub fn routes(&self) -> &[ShardRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, shard_id: &str) -> Option<&ShardRoute> {
        self.routes.iter().find(|route| route.shard_id == shard_id)
    }

    /// Route owning `record_id`, by its prefix before the first `-`.
    pub fn route_for(&self, record_id: &str) -> Option<&ShardRoute> {
        let shard_id = owning_shard(record_id);
        if shard_id.is_empty() {
            return None;
        }
        self.get(shard_id)
    }
}

/// Startup parameters for the coordinator process.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub bind_addr: SocketAddr,
    pub routes: RoutingTable,
    pub timeouts: Timeouts,
    /// Address for the admin HTTP surface; disabled when `None`.
    pub admin_addr: Option<SocketAddr>,
}
