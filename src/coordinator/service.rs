use super::fanout::{FanoutHealth, scatter};
use super::types::RoutingTable;
use crate::protocol::client::request_line;
use crate::protocol::{ClientError, Command, ErrorReason, Reply, StatEntry, Timeouts};
use crate::record::Record;

use std::collections::HashMap;
use std::sync::Arc;

/// Number of entries per category in the aggregated `STATS` reply.
pub const STATS_TOP_N: usize = 5;

/// Cluster-wide `STATS` after merging and truncation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedStats {
    pub keywords: Vec<(String, u64)>,
    pub records: Vec<(String, u64)>,
}

impl AggregatedStats {
    pub fn to_lines(&self) -> Vec<String> {
        let keywords = self.keywords.iter().map(|(keyword, count)| StatEntry::Keyword {
            keyword: keyword.clone(),
            count: *count,
        });
        let records = self.records.iter().map(|(record_id, count)| StatEntry::BookSearch {
            record_id: record_id.clone(),
            count: *count,
        });
        keywords.chain(records).map(|entry| entry.to_line()).collect()
    }
}

/// Routing and aggregation logic behind the coordinator endpoint.
pub struct Coordinator {
    routes: RoutingTable,
    timeouts: Timeouts,
    health: FanoutHealth,
}

impl Coordinator {
    pub fn new(routes: RoutingTable, timeouts: Timeouts) -> Arc<Self> {
        Arc::new(Self {
            routes,
            timeouts,
            health: FanoutHealth::new(),
        })
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn health(&self) -> &FanoutHealth {
        &self.health
    }

    pub async fn execute(&self, command: Command) -> Reply {
        match command {
            Command::Search(ref keyword) => {
                tracing::debug!("Broadcasting SEARCH '{}'", keyword);
                Reply::Rows(wire_lines(self.search(keyword).await))
            }
            Command::List => Reply::Rows(wire_lines(self.list().await)),
            Command::Lease(ref id) | Command::Return(ref id) => {
                Reply::Line(self.forward(&command, id).await)
            }
            Command::Stats => Reply::Rows(self.stats().await.to_lines()),
            Command::Servers => Reply::Rows(self.servers()),
            Command::Quit => Reply::Close,
            Command::Unknown(ref raw) => {
                tracing::debug!("Unknown command '{}'", raw);
                Reply::error(ErrorReason::UnknownCommand)
            }
        }
    }

    /// One `SERVER <id> <host:port>` line per route.
    pub fn servers(&self) -> Vec<String> {
        self.routes
            .routes()
            .iter()
            .map(|route| format!("SERVER {} {}", route.shard_id, route.addr()))
            .collect()
    }

    pub async fn search(&self, keyword: &str) -> Vec<Record> {
        self.gather_records(&Command::Search(keyword.to_string())).await
    }

    pub async fn list(&self) -> Vec<Record> {
        self.gather_records(&Command::List).await
    }

    /// Sends a point operation to the shard owning `record_id` and returns its
    /// reply line verbatim, or a locally generated `ERROR` line.
    pub async fn forward(&self, command: &Command, record_id: &str) -> String {
        let Some(route) = self.routes.route_for(record_id) else {
            tracing::debug!("No route for record '{}'", record_id);
            return format!("ERROR {}", ErrorReason::UnknownServer);
        };

        match request_line(&route.addr(), command, &self.timeouts).await {
            Ok(line) => {
                tracing::debug!("Shard {} answered '{}' with '{}'", route.shard_id, command, line);
                line
            }
            Err(ClientError::Closed { .. }) => {
                tracing::warn!("Shard {} closed without replying to '{}'", route.shard_id, command);
                format!("ERROR {}", ErrorReason::NoResponse)
            }
            Err(e) => {
                tracing::warn!("Shard {} unreachable for '{}': {}", route.shard_id, command, e);
                format!("ERROR {}", ErrorReason::Unreachable)
            }
        }
    }

    /// Sums `STATS` across shards and keeps the top entries of each category.
    pub async fn stats(&self) -> AggregatedStats {
        let mut keywords: HashMap<String, u64> = HashMap::new();
        let mut records: HashMap<String, u64> = HashMap::new();

        for row in self.gather_rows(&Command::Stats).await {
            match StatEntry::parse(&row) {
                Some(StatEntry::Keyword { keyword, count }) => {
                    let total = keywords.entry(keyword).or_insert(0);
                    *total = total.saturating_add(count);
                }
                Some(StatEntry::BookSearch { record_id, count }) => {
                    let total = records.entry(record_id).or_insert(0);
                    *total = total.saturating_add(count);
                }
                None => tracing::trace!("Ignoring stats row '{}'", row),
            }
        }

        AggregatedStats {
            keywords: top_entries(keywords, STATS_TOP_N),
            records: top_entries(records, STATS_TOP_N),
        }
    }

    async fn gather_records(&self, command: &Command) -> Vec<Record> {
        self.gather_rows(command)
            .await
            .iter()
            .filter_map(|row| Record::from_wire_line(row))
            .collect()
    }

    /// Fans `command` out and concatenates rows from every shard that answered,
    /// in completion order. Failed shards are logged, counted and skipped.
    async fn gather_rows(&self, command: &Command) -> Vec<String> {
        let outcomes = scatter(self.routes.routes(), command, &self.timeouts).await;

        let mut rows = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(shard_rows) => {
                    self.health.record_success(&outcome.shard_id);
                    tracing::trace!(
                        "Shard {} returned {} rows for '{}'",
                        outcome.shard_id,
                        shard_rows.len(),
                        command
                    );
                    rows.extend(shard_rows);
                }
                Err(e) => {
                    tracing::warn!(
                        "Shard {} skipped for '{}': {}",
                        outcome.shard_id,
                        command,
                        e
                    );
                    self.health.record_failure(&outcome.shard_id, &e);
                }
            }
        }
        rows
    }
}

fn wire_lines(records: Vec<Record>) -> Vec<String> {
    records.iter().map(|record| record.to_wire_line()).collect()
}

/// Sorts by count descending, then key ascending, and keeps the first `limit`.
pub fn top_entries(counts: HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}
