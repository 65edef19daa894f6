use std::net::SocketAddr;
use std::path::PathBuf;

/// Startup parameters for one shard process.
#[derive(Debug, Clone)]
pub struct ShardConfig {
    /// Shard id; also the id prefix of every record this shard owns.
    pub shard_id: String,
    pub bind_addr: SocketAddr,
    /// Storage file. Created and seeded if missing.
    pub storage_path: PathBuf,
}
