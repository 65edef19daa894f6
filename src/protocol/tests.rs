//! Protocol Module Tests
//!
//! ## Test Scopes
//! - **Parsing**: Request lines map onto the closed `Command` set.
//! - **Framing**: Each verb declares whether its reply is multi-line, single-line or none.
//! - **Rendering**: Replies carry the sentinel only when multi-line.
//! - **Client**: Timeouts, refused connections and early closes against a scripted peer.

#[cfg(test)]
mod tests {
    use crate::protocol::client::{request, request_line, request_rows};
    use crate::protocol::{
        ClientError, Command, ErrorReason, Framing, Reply, StatEntry, Timeouts,
    };
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Accepts one connection, records the request line, writes `response` and closes.
    async fn scripted_peer(
        response: &'static str,
    ) -> (SocketAddr, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut request = String::new();
            BufReader::new(read_half)
                .read_line(&mut request)
                .await
                .unwrap();
            write_half.write_all(response.as_bytes()).await.unwrap();
            request
        });

        (addr, handle)
    }

    fn fast_timeouts() -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(200),
            read: Duration::from_millis(200),
            deadline: Duration::from_millis(500),
        }
    }

    // ============================================================
    // COMMAND PARSING TESTS
    // ============================================================

    #[test]
    fn test_parse_argument_commands_trim_argument() {
        assert_eq!(
            Command::parse("SEARCH  threads "),
            Command::Search("threads".to_string())
        );
        assert_eq!(
            Command::parse("LEASE LIB1-001"),
            Command::Lease("LIB1-001".to_string())
        );
        assert_eq!(
            Command::parse("RETURN LIB1-001\r"),
            Command::Return("LIB1-001".to_string())
        );
    }

    #[test]
    fn test_parse_bare_commands_exact() {
        assert_eq!(Command::parse("LIST"), Command::List);
        assert_eq!(Command::parse("STATS"), Command::Stats);
        assert_eq!(Command::parse("SERVERS"), Command::Servers);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
    }

    #[test]
    fn test_parse_unknown_commands() {
        assert_eq!(
            Command::parse("list"),
            Command::Unknown("list".to_string())
        );
        assert_eq!(
            Command::parse("SEARCH"),
            Command::Unknown("SEARCH".to_string())
        );
        assert_eq!(
            Command::parse("LIST extra"),
            Command::Unknown("LIST extra".to_string())
        );
    }

    #[test]
    fn test_framing_per_verb() {
        assert_eq!(Command::Search("x".into()).framing(), Framing::Multi);
        assert_eq!(Command::List.framing(), Framing::Multi);
        assert_eq!(Command::Stats.framing(), Framing::Multi);
        assert_eq!(Command::Servers.framing(), Framing::Multi);
        assert_eq!(Command::Lease("x".into()).framing(), Framing::Single);
        assert_eq!(Command::Return("x".into()).framing(), Framing::Single);
        assert_eq!(Command::Unknown("x".into()).framing(), Framing::Single);
        assert_eq!(Command::Quit.framing(), Framing::Close);
    }

    #[test]
    fn test_command_line_round_trip() {
        for line in [
            "SEARCH rust",
            "LIST",
            "LEASE S1-7",
            "RETURN S1-7",
            "STATS",
            "SERVERS",
            "QUIT",
        ] {
            assert_eq!(Command::parse(line).to_line(), line);
        }
    }

    // ============================================================
    // REPLY & ERROR TESTS
    // ============================================================

    #[test]
    fn test_render_rows_appends_sentinel() {
        let reply = Reply::Rows(vec!["BOOK a".to_string(), "BOOK b".to_string()]);
        assert_eq!(reply.render().unwrap(), "BOOK a\nBOOK b\nEND\n");

        assert_eq!(Reply::Rows(Vec::new()).render().unwrap(), "END\n");
    }

    #[test]
    fn test_render_single_line_has_no_sentinel() {
        assert_eq!(Reply::ok().render().unwrap(), "OK\n");
        assert_eq!(
            Reply::error(ErrorReason::NotAvailable).render().unwrap(),
            "ERROR NotAvailable\n"
        );
        assert!(Reply::Close.render().is_none());
    }

    #[test]
    fn test_error_reason_wire_tokens() {
        let expected = [
            (ErrorReason::NotFound, "NotFound"),
            (ErrorReason::NotAvailable, "NotAvailable"),
            (ErrorReason::AlreadyAvailable, "AlreadyAvailable"),
            (ErrorReason::UnknownServer, "UnknownServer"),
            (ErrorReason::UnknownCommand, "UnknownCommand"),
            (ErrorReason::Unreachable, "Unreachable"),
            (ErrorReason::NoResponse, "NoResponse"),
            (ErrorReason::PersistFailed, "PersistFailed"),
        ];
        for (reason, token) in expected {
            assert_eq!(reason.to_string(), token);
        }
    }

    // ============================================================
    // STAT LINE TESTS
    // ============================================================

    #[test]
    fn test_stat_entry_parse() {
        assert_eq!(
            StatEntry::parse("KEYWORD foo|2"),
            Some(StatEntry::Keyword {
                keyword: "foo".to_string(),
                count: 2
            })
        );
        assert_eq!(
            StatEntry::parse("BOOKSEARCH LIB1-001|7"),
            Some(StatEntry::BookSearch {
                record_id: "LIB1-001".to_string(),
                count: 7
            })
        );
    }

    #[test]
    fn test_stat_entry_key_may_contain_delimiter() {
        assert_eq!(
            StatEntry::parse("KEYWORD a|b|3"),
            Some(StatEntry::Keyword {
                keyword: "a|b".to_string(),
                count: 3
            })
        );
    }

    #[test]
    fn test_stat_entry_rejects_malformed() {
        assert!(StatEntry::parse("KEYWORD foo").is_none());
        assert!(StatEntry::parse("KEYWORD foo|many").is_none());
        assert!(StatEntry::parse("BOOK LIB1-001|x").is_none());
    }

    // ============================================================
    // CLIENT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_request_rows_reads_until_sentinel() {
        let (addr, peer) = scripted_peer("BOOK a\nBOOK b\nEND\nBOOK ignored\n").await;

        let rows = request_rows(&addr.to_string(), &Command::List, &fast_timeouts())
            .await
            .unwrap();

        assert_eq!(rows, vec!["BOOK a".to_string(), "BOOK b".to_string()]);
        assert_eq!(peer.await.unwrap(), "LIST\n");
    }

    #[tokio::test]
    async fn test_request_rows_accepts_close_before_sentinel() {
        let (addr, _peer) = scripted_peer("BOOK a\n").await;

        let rows = request_rows(&addr.to_string(), &Command::List, &fast_timeouts())
            .await
            .unwrap();

        assert_eq!(rows, vec!["BOOK a".to_string()]);
    }

    #[tokio::test]
    async fn test_request_line_reads_exactly_one_line() {
        let (addr, peer) = scripted_peer("OK\nEND\n").await;

        let line = request_line(
            &addr.to_string(),
            &Command::Lease("S1-7".to_string()),
            &fast_timeouts(),
        )
        .await
        .unwrap();

        assert_eq!(line, "OK");
        assert_eq!(peer.await.unwrap(), "LEASE S1-7\n");
    }

    #[tokio::test]
    async fn test_request_line_closed_without_reply() {
        let (addr, _peer) = scripted_peer("").await;

        let result = request_line(
            &addr.to_string(),
            &Command::Return("S1-7".to_string()),
            &fast_timeouts(),
        )
        .await;

        assert!(matches!(result, Err(ClientError::Closed { .. })));
    }

    #[tokio::test]
    async fn test_request_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = request(&addr.to_string(), &Command::List, &fast_timeouts()).await;

        assert!(matches!(result, Err(ClientError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_request_read_timeout_on_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = request(&addr.to_string(), &Command::Stats, &fast_timeouts()).await;

        assert!(matches!(result, Err(ClientError::ReadTimeout { .. })));
    }
}
