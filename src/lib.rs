//! Sharded Catalog Library
//!
//! Core modules for the sharded book catalog. The binary (`main.rs`) runs either a
//! library shard or the coordinator on top of them.
//!
//! ## Architecture Modules
//! - **`record`**: The catalog entry, keyword matching and its storage/wire encodings.
//! - **`protocol`**: The newline-delimited command protocol: typed commands, per-command
//!   response framing, error reasons, and an outbound client with timeouts.
//! - **`shard`**: A library server owning one partition of the catalog. Serialises
//!   lease/return against concurrent connections and rewrites its storage file on
//!   every mutation.
//! - **`coordinator`**: The single entry point. Routes point operations to the owning
//!   shard and scatter-gathers aggregate queries, tolerating per-shard failures.

pub mod coordinator;
pub mod protocol;
pub mod record;
pub mod shard;
