//! Cluster Integration Tests
//!
//! Boots three library shards and a coordinator in-process on ephemeral ports and
//! drives them through the coordinator's line protocol and admin HTTP surface.

use sharded_catalog::coordinator::{
    Coordinator, CoordinatorServer, RoutingTable, ShardRoute, admin,
};
use sharded_catalog::protocol::client::{request_line, request_rows};
use sharded_catalog::protocol::{Command, Framing, Timeouts};
use sharded_catalog::shard::{ShardConfig, ShardServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

struct Cluster {
    coordinator_addr: SocketAddr,
    coordinator: Arc<Coordinator>,
    _dir: tempfile::TempDir,
}

async fn start_shard(shard_id: &str, dir: &tempfile::TempDir) -> SocketAddr {
    let config = ShardConfig {
        shard_id: shard_id.to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        storage_path: dir.path().join(format!("{}.txt", shard_id.to_lowercase())),
    };
    let server = ShardServer::bind(&config).await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run());
    addr
}

async fn start_cluster() -> Cluster {
    let dir = tempfile::tempdir().unwrap();

    let mut routes = Vec::new();
    for shard_id in ["LIB1", "LIB2", "LIB3"] {
        let addr = start_shard(shard_id, &dir).await;
        routes.push(ShardRoute::new(shard_id, "127.0.0.1", addr.port()));
    }

    let coordinator = Coordinator::new(RoutingTable::new(routes).unwrap(), Timeouts::default());
    let server =
        CoordinatorServer::with_coordinator(coordinator.clone(), "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
    let coordinator_addr = server.local_addr();
    tokio::spawn(server.run());

    Cluster {
        coordinator_addr,
        coordinator,
        _dir: dir,
    }
}

/// A persistent client connection to the coordinator.
struct Session {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Session {
    async fn connect(addr: SocketAddr) -> Self {
        let (read_half, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) -> Vec<String> {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();

        match Command::parse(line).framing() {
            Framing::Multi => {
                let mut rows = Vec::new();
                loop {
                    let row = self.lines.next_line().await.unwrap().unwrap();
                    if row == "END" {
                        return rows;
                    }
                    rows.push(row);
                }
            }
            Framing::Single => vec![self.lines.next_line().await.unwrap().unwrap()],
            Framing::Close => Vec::new(),
        }
    }
}

#[tokio::test]
async fn test_lease_return_scenario_through_coordinator() {
    let cluster = start_cluster().await;
    let mut session = Session::connect(cluster.coordinator_addr).await;

    assert_eq!(session.send("LEASE LIB1-001").await, vec!["OK"]);
    assert_eq!(
        session.send("LEASE LIB1-001").await,
        vec!["ERROR NotAvailable"]
    );

    let listed = session.send("LIST").await;
    assert_eq!(listed.len(), 5);
    assert!(!listed.iter().any(|row| row.starts_with("BOOK LIB1-001|")));

    assert_eq!(session.send("RETURN LIB1-001").await, vec!["OK"]);
    assert_eq!(
        session.send("RETURN LIB1-001").await,
        vec!["ERROR AlreadyAvailable"]
    );

    let listed = session.send("LIST").await;
    assert_eq!(listed.len(), 6);
    assert!(listed.contains(
        &"BOOK LIB1-001|Distributed Systems|Andrew Tanenbaum|LIB1|available".to_string()
    ));
}

#[tokio::test]
async fn test_point_operation_errors_through_coordinator() {
    let cluster = start_cluster().await;
    let mut session = Session::connect(cluster.coordinator_addr).await;

    assert_eq!(session.send("LEASE LIB9-001").await, vec!["ERROR UnknownServer"]);
    assert_eq!(session.send("LEASE nodash").await, vec!["ERROR UnknownServer"]);
    assert_eq!(session.send("LEASE LIB2-999").await, vec!["ERROR NotFound"]);
    assert_eq!(session.send("HELLO").await, vec!["ERROR UnknownCommand"]);
}

#[tokio::test]
async fn test_search_spans_all_shards() {
    let cluster = start_cluster().await;
    let mut session = Session::connect(cluster.coordinator_addr).await;

    let mut rows = session.send("SEARCH robert").await;
    rows.sort();

    assert_eq!(
        rows,
        vec![
            "BOOK LIB2-001|Algorithms|Robert Sedgewick|LIB2|available".to_string(),
            "BOOK LIB3-001|Clean Code|Robert Martin|LIB3|available".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_servers_and_stats_through_coordinator() {
    let cluster = start_cluster().await;
    let mut session = Session::connect(cluster.coordinator_addr).await;

    let servers = session.send("SERVERS").await;
    assert_eq!(servers.len(), 3);
    assert!(servers[0].starts_with("SERVER LIB1 127.0.0.1:"));

    session.send("SEARCH threads").await;
    session.send("SEARCH threads").await;
    session.send("SEARCH kernel").await;

    let stats = session.send("STATS").await;
    assert_eq!(
        stats,
        vec![
            "KEYWORD threads|6".to_string(),
            "KEYWORD kernel|3".to_string(),
            "BOOKSEARCH LIB1-002|3".to_string(),
            "BOOKSEARCH LIB2-002|2".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let cluster = start_cluster().await;
    let mut session = Session::connect(cluster.coordinator_addr).await;

    assert!(session.send("QUIT").await.is_empty());
    assert!(session.lines.next_line().await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_leases_through_coordinator() {
    let cluster = start_cluster().await;
    let addr = cluster.coordinator_addr.to_string();
    let lease = Command::Lease("LIB3-002".to_string());

    let mut handles = Vec::new();
    for _ in 0..12 {
        let addr = addr.clone();
        let lease = lease.clone();
        handles.push(tokio::spawn(async move {
            request_line(&addr, &lease, &Timeouts::default()).await.unwrap()
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert_eq!(outcomes.iter().filter(|o| *o == "OK").count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| *o == "ERROR NotAvailable")
            .count(),
        11
    );

    let rows = request_rows(&addr, &Command::List, &Timeouts::default())
        .await
        .unwrap();
    assert!(!rows.iter().any(|row| row.starts_with("BOOK LIB3-002|")));
}

#[tokio::test]
async fn test_admin_http_surface() {
    let cluster = start_cluster().await;
    let mut session = Session::connect(cluster.coordinator_addr).await;
    session.send("LIST").await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = listener.local_addr().unwrap();
    let router = admin::router(cluster.coordinator.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", admin_addr);

    let health: serde_json::Value = client
        .get(format!("{}{}", base, admin::ENDPOINT_HEALTH))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let servers: serde_json::Value = client
        .get(format!("{}{}", base, admin::ENDPOINT_SERVERS))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(servers["servers"].as_array().unwrap().len(), 3);
    assert_eq!(servers["servers"][0]["shard_id"], "LIB1");

    let fanout: serde_json::Value = client
        .get(format!("{}{}", base, admin::ENDPOINT_FANOUT))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let shards = fanout["shards"].as_array().unwrap();
    assert_eq!(shards.len(), 3);
    for shard in shards {
        assert_eq!(shard["successes"], 1);
        assert_eq!(shard["failures"], 0);
    }
}
