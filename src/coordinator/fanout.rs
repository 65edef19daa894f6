//! Scatter-Gather
//!
//! Sends one command to every shard concurrently and yields per-shard outcomes in
//! completion order. Each sub-call is bounded by the client's connect/read timeouts
//! and by a deadline shared by the whole round; a sub-call still running at the
//! deadline is dropped, which closes its connection. Nothing is retried.

use super::types::ShardRoute;
use crate::protocol::client::request_rows;
use crate::protocol::{ClientError, Command, Timeouts};

use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::time::{Instant, timeout_at};

#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Outcome of one sub-call, tagged with the shard it came from.
#[derive(Debug)]
pub struct ShardOutcome {
    pub shard_id: String,
    pub result: Result<Vec<String>, FanoutError>,
}

/// Issues `command` to every route and collects the outcomes as they complete.
pub async fn scatter(
    routes: &[ShardRoute],
    command: &Command,
    timeouts: &Timeouts,
) -> Vec<ShardOutcome> {
    let deadline = Instant::now() + timeouts.deadline;

    let mut pending: FuturesUnordered<_> = routes
        .iter()
        .map(|route| async move {
            let addr = route.addr();
            let result = match timeout_at(deadline, request_rows(&addr, command, timeouts)).await
            {
                Ok(Ok(rows)) => Ok(rows),
                Ok(Err(e)) => Err(FanoutError::Client(e)),
                Err(_) => Err(FanoutError::DeadlineExceeded),
            };
            ShardOutcome {
                shard_id: route.shard_id.clone(),
                result,
            }
        })
        .collect();

    let mut outcomes = Vec::with_capacity(routes.len());
    while let Some(outcome) = pending.next().await {
        outcomes.push(outcome);
    }
    outcomes
}

/// Per-shard sub-call counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShardHealth {
    pub successes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

/// Success/failure bookkeeping for fan-out sub-calls, keyed by shard id.
#[derive(Debug, Default)]
pub struct FanoutHealth {
    shards: DashMap<String, ShardHealth>,
}

impl FanoutHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, shard_id: &str) {
        self.shards.entry(shard_id.to_string()).or_default().successes += 1;
    }

    pub fn record_failure(&self, shard_id: &str, error: &FanoutError) {
        let mut health = self.shards.entry(shard_id.to_string()).or_default();
        health.failures += 1;
        health.last_error = Some(error.to_string());
    }

    pub fn get(&self, shard_id: &str) -> ShardHealth {
        self.shards
            .get(shard_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
