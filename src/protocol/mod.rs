//! Line Protocol Module
//!
//! The newline-delimited, UTF-8 text protocol spoken by shards, the coordinator and clients.
//!
//! ## Framing
//! Every request is one line. The response shape depends only on the command verb:
//! - **Multi-line** (`SEARCH`, `LIST`, `STATS`, `SERVERS`): zero or more data lines,
//!   then the sentinel line `END`.
//! - **Single-line** (`LEASE`, `RETURN`, unknown verbs): exactly one line, `OK` or
//!   `ERROR <Reason>`, with no sentinel.
//! - **Close** (`QUIT`): no response; the connection is closed.
//!
//! `Command::framing` exposes this per-verb contract so readers never guess.
//!
//! ## Submodules
//! - **`types`**: `Command`, `Framing`, `Reply`, `ErrorReason`, `StatEntry`.
//! - **`client`**: Outbound request helper with connect and read timeouts.
//! - **`session`**: Inbound per-connection command loop.

pub mod client;
pub mod session;
pub mod types;

pub use client::{ClientError, Timeouts};
pub use types::{Command, ErrorReason, Framing, Reply, StatEntry, END_SENTINEL};

#[cfg(test)]
mod tests;
