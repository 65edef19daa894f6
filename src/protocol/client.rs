//! Outbound Protocol Client
//!
//! Opens one TCP connection per request, writes the command line and reads the
//! response according to the command's `Framing`. Every call is bounded by a
//! connect timeout and a per-line read timeout. No retries.

use super::types::{Command, END_SENTINEL, Framing, Reply};

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::time::timeout;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(2000);

/// Time limits applied to calls made to a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit on establishing the TCP connection.
    pub connect: Duration,
    /// Limit on each individual line read.
    pub read: Duration,
    /// Overall limit for a scatter-gather round.
    pub deadline: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connect to {addr} timed out")]
    ConnectTimeout { addr: String },
    #[error("read from {addr} timed out")]
    ReadTimeout { addr: String },
    #[error("i/o error talking to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{addr} closed the connection without replying")]
    Closed { addr: String },
}

/// Sends `command` to `addr` and reads the reply the command's framing calls for.
///
/// For multi-line replies, a peer that closes before `END` yields the rows read so far.
pub async fn request(
    addr: &str,
    command: &Command,
    timeouts: &Timeouts,
) -> Result<Reply, ClientError> {
    let stream = match timeout(timeouts.connect, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            return Err(ClientError::Connect {
                addr: addr.to_string(),
                source,
            });
        }
        Err(_) => {
            return Err(ClientError::ConnectTimeout {
                addr: addr.to_string(),
            });
        }
    };

    let (read_half, mut write_half) = stream.into_split();
    let line = format!("{}\n", command.to_line());
    write_half
        .write_all(line.as_bytes())
        .await
        .map_err(|source| ClientError::Io {
            addr: addr.to_string(),
            source,
        })?;

    let mut lines = BufReader::new(read_half).lines();

    match command.framing() {
        Framing::Multi => {
            let mut rows = Vec::new();
            while let Some(row) = next_line(&mut lines, addr, timeouts.read).await? {
                if row == END_SENTINEL {
                    break;
                }
                rows.push(row);
            }
            Ok(Reply::Rows(rows))
        }
        Framing::Single => match next_line(&mut lines, addr, timeouts.read).await? {
            Some(line) => Ok(Reply::Line(line)),
            None => Err(ClientError::Closed {
                addr: addr.to_string(),
            }),
        },
        Framing::Close => Ok(Reply::Close),
    }
}

/// Multi-line request; returns the data rows without the sentinel.
pub async fn request_rows(
    addr: &str,
    command: &Command,
    timeouts: &Timeouts,
) -> Result<Vec<String>, ClientError> {
    match request(addr, command, timeouts).await? {
        Reply::Rows(rows) => Ok(rows),
        Reply::Line(line) => Ok(vec![line]),
        Reply::Close => Ok(Vec::new()),
    }
}

/// Single-line request; returns the one response line.
pub async fn request_line(
    addr: &str,
    command: &Command,
    timeouts: &Timeouts,
) -> Result<String, ClientError> {
    match request(addr, command, timeouts).await? {
        Reply::Line(line) => Ok(line),
        Reply::Rows(rows) => rows.into_iter().next().ok_or_else(|| ClientError::Closed {
            addr: addr.to_string(),
        }),
        Reply::Close => Err(ClientError::Closed {
            addr: addr.to_string(),
        }),
    }
}

async fn next_line(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    addr: &str,
    read_timeout: Duration,
) -> Result<Option<String>, ClientError> {
    match timeout(read_timeout, lines.next_line()).await {
        Ok(Ok(line)) => Ok(line.map(|l| l.trim_end_matches('\r').to_string())),
        Ok(Err(source)) => Err(ClientError::Io {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(ClientError::ReadTimeout {
            addr: addr.to_string(),
        }),
    }
}
