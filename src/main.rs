use clap::{Args, Parser, Subcommand};
use sharded_catalog::coordinator::{
    CoordinatorConfig, CoordinatorServer, RoutingTable, ShardRoute, admin,
};
use sharded_catalog::protocol::Timeouts;
use sharded_catalog::shard::{ShardConfig, ShardServer};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sharded-catalog", about = "Sharded book catalog: library shards and coordinator")]
struct Cli {
    /// Maximum log level (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "CATALOG_LOG_LEVEL", default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run a library shard owning one partition of the catalog.
    Shard(ShardArgs),
    /// Run the coordinator in front of a static set of shards.
    Coordinator(CoordinatorArgs),
}

#[derive(Args)]
struct ShardArgs {
    /// Shard id, also the id prefix of every record it owns (e.g. LIB1).
    #[arg(long, env = "CATALOG_SHARD_ID")]
    id: String,

    #[arg(long, env = "CATALOG_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, env = "CATALOG_PORT")]
    port: u16,

    /// Storage file; created and seeded if missing.
    #[arg(long, env = "CATALOG_FILE")]
    file: PathBuf,
}

#[derive(Args)]
struct CoordinatorArgs {
    #[arg(long, env = "CATALOG_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, env = "CATALOG_PORT")]
    port: u16,

    /// Shard route as shardId@host:port. Repeatable.
    #[arg(long = "route", env = "CATALOG_ROUTES", value_delimiter = ',', required = true)]
    routes: Vec<ShardRoute>,

    #[arg(long, default_value_t = 1000)]
    connect_timeout_ms: u64,

    #[arg(long, default_value_t = 1500)]
    read_timeout_ms: u64,

    /// Deadline for one scatter-gather round.
    #[arg(long, default_value_t = 2000)]
    deadline_ms: u64,

    /// Port for the read-only admin HTTP endpoints. Disabled when unset.
    #[arg(long, env = "CATALOG_ADMIN_PORT")]
    admin_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    match cli.mode {
        Mode::Shard(args) => run_shard(args).await,
        Mode::Coordinator(args) => run_coordinator(args).await,
    }
}

async fn run_shard(args: ShardArgs) -> anyhow::Result<()> {
    let config = ShardConfig {
        shard_id: args.id,
        bind_addr: SocketAddr::new(args.host, args.port),
        storage_path: args.file,
    };

    tracing::info!(
        "Starting shard {} on {} (storage: {})",
        config.shard_id,
        config.bind_addr,
        config.storage_path.display()
    );

    let server = ShardServer::bind(&config).await?;
    server.run().await
}

async fn run_coordinator(args: CoordinatorArgs) -> anyhow::Result<()> {
    let config = CoordinatorConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        routes: RoutingTable::new(args.routes)?,
        timeouts: Timeouts {
            connect: Duration::from_millis(args.connect_timeout_ms),
            read: Duration::from_millis(args.read_timeout_ms),
            deadline: Duration::from_millis(args.deadline_ms),
        },
        admin_addr: args.admin_port.map(|port| SocketAddr::new(args.host, port)),
    };

    tracing::info!("Starting coordinator on {}", config.bind_addr);

    let server = CoordinatorServer::bind(&config).await?;

    if let Some(admin_addr) = config.admin_addr {
        let coordinator = server.coordinator().clone();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(coordinator, admin_addr).await {
                tracing::error!("Admin HTTP server stopped: {}", e);
            }
        });
    }

    tracing::info!("Press Ctrl+C to shutdown");
    server.run().await
}
