//! Library Shard Module
//!
//! A shard owns one disjoint partition of the catalog: every record whose id is
//! prefixed with this shard's id.
//!
//! ## Core Concepts
//! - **Catalog**: The in-memory record set plus query counters, backed by one storage
//!   file that is rewritten in full on every mutation.
//! - **Lease state machine**: Each record is `Available` or `Leased`. `LEASE`/`RETURN`
//!   perform the check-then-set and the file rewrite under one exclusive lock, so a
//!   record never has two holders. `SEARCH`/`LIST` take a shared lock and may interleave.
//! - **Counters**: Per-keyword and per-record hit counts, in memory only.
//!
//! ## Submodules
//! - **`catalog`**: Record set, lease/return, counters and persistence.
//! - **`seed`**: Built-in bootstrap records for a fresh shard.
//! - **`server`**: TCP accept loop and per-connection command handling.
//! - **`types`**: Shard configuration.

pub mod catalog;
pub mod seed;
pub mod server;
pub mod types;

pub use catalog::Catalog;
pub use server::ShardServer;
pub use types::ShardConfig;
