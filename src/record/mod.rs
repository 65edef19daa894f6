//! Catalog Record Module
//!
//! Defines the catalog entry (`Record`) shared by shards and the coordinator.
//!
//! ## Core Concepts
//! - **Ownership**: A record id has the form `<shardId>-<suffix>`. The prefix names the
//!   owning shard and is the only routing input the coordinator needs.
//! - **Matching**: Case-insensitive substring search over title, author and keywords.
//! - **Two encodings**: A lossless, escaped storage line for the per-shard file and a
//!   lossy, display-oriented wire line (`BOOK ...`) for the protocol.

pub mod codec;
pub mod types;

pub use types::Record;
