//! Coordinator Module
//!
//! Presents one endpoint that spans every shard. The coordinator is the only
//! component that knows the full topology; shards never talk to each other.
//!
//! ## Request Routing
//! - **Point operations** (`LEASE`, `RETURN`): the shard id is the record id's prefix
//!   before the first `-`. The command goes to exactly that shard and its single reply
//!   line is relayed unchanged. An unknown prefix yields `ERROR UnknownServer` without
//!   any network call.
//! - **Aggregate operations** (`SEARCH`, `LIST`, `STATS`): scatter-gather. The command
//!   is sent to every shard concurrently under connect/read timeouts and a shared
//!   deadline. A shard that fails contributes nothing; the client never sees the failure.
//!   Failures are logged and counted in `FanoutHealth`.
//! - **Local** (`SERVERS`): answered from the static routing table.
//!
//! ## Submodules
//! - **`types`**: `ShardRoute`, `RoutingTable`, `CoordinatorConfig`.
//! - **`fanout`**: Concurrent scatter-gather and per-shard health counters.
//! - **`service`**: Command execution and result merging.
//! - **`server`**: TCP accept loop.
//! - **`admin`**: Optional read-only HTTP surface (health, routes, fan-out counters).

pub mod admin;
pub mod fanout;
pub mod server;
pub mod service;
pub mod types;

pub use fanout::{FanoutHealth, ShardHealth};
pub use server::CoordinatorServer;
pub use service::Coordinator;
pub use types::{CoordinatorConfig, RoutingTable, ShardRoute};
