//! Server-side connection loop shared by shards and the coordinator.

use super::types::{Command, Reply};

use std::future::Future;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Serves commands on `stream` until the peer disconnects or a handler returns
/// `Reply::Close`. Each request line is parsed and passed to `handle`; the rendered
/// reply is written and flushed before the next line is read.
pub async fn serve_connection<F, Fut>(
    stream: TcpStream,
    conn_id: &str,
    mut handle: F,
) -> std::io::Result<()>
where
    F: FnMut(Command) -> Fut,
    Fut: Future<Output = Reply>,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let command = Command::parse(&line);
        tracing::trace!("[{}] <- {}", conn_id, command);

        let reply = handle(command).await;
        match reply.render() {
            Some(text) => {
                write_half.write_all(text.as_bytes()).await?;
                write_half.flush().await?;
            }
            None => {
                tracing::debug!("[{}] peer sent QUIT", conn_id);
                break;
            }
        }
    }

    Ok(())
}
