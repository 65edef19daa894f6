use std::fmt;

pub const END_SENTINEL: &str = "END";
pub const OK_LINE: &str = "OK";
pub const ERROR_PREFIX: &str = "ERROR ";

const KEYWORD_PREFIX: &str = "KEYWORD ";
const BOOKSEARCH_PREFIX: &str = "BOOKSEARCH ";

/// How a response to a given command is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Data lines followed by `END`.
    Multi,
    /// Exactly one line, no sentinel.
    Single,
    /// No response; the connection closes.
    Close,
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    List,
    Lease(String),
    Return(String),
    Stats,
    Servers,
    Quit,
    /// Anything else, kept verbatim for logging.
    Unknown(String),
}

impl Command {
    /// Parses one request line. Never fails: unrecognised input becomes `Unknown`.
    ///
    /// Argument verbs require a single space after the verb and trim the argument.
    /// Bare verbs must match exactly.
    pub fn parse(line: &str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(keyword) = line.strip_prefix("SEARCH ") {
            return Command::Search(keyword.trim().to_string());
        }
        if let Some(id) = line.strip_prefix("LEASE ") {
            return Command::Lease(id.trim().to_string());
        }
        if let Some(id) = line.strip_prefix("RETURN ") {
            return Command::Return(id.trim().to_string());
        }

        match line {
            "LIST" => Command::List,
            "STATS" => Command::Stats,
            "SERVERS" => Command::Servers,
            "QUIT" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }

    pub fn framing(&self) -> Framing {
        match self {
            Command::Search(_) | Command::List | Command::Stats | Command::Servers => {
                Framing::Multi
            }
            Command::Lease(_) | Command::Return(_) | Command::Unknown(_) => Framing::Single,
            Command::Quit => Framing::Close,
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            Command::Search(keyword) => format!("SEARCH {}", keyword),
            Command::List => "LIST".to_string(),
            Command::Lease(id) => format!("LEASE {}", id),
            Command::Return(id) => format!("RETURN {}", id),
            Command::Stats => "STATS".to_string(),
            Command::Servers => "SERVERS".to_string(),
            Command::Quit => "QUIT".to_string(),
            Command::Unknown(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Error reasons carried in `ERROR <Reason>` lines. `Display` is the wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorReason {
    #[error("NotFound")]
    NotFound,
    #[error("NotAvailable")]
    NotAvailable,
    #[error("AlreadyAvailable")]
    AlreadyAvailable,
    #[error("UnknownServer")]
    UnknownServer,
    #[error("UnknownCommand")]
    UnknownCommand,
    #[error("Unreachable")]
    Unreachable,
    #[error("NoResponse")]
    NoResponse,
    #[error("PersistFailed")]
    PersistFailed,
}

/// A response ready to be written back to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Multi-line body; `END` is appended when rendered.
    Rows(Vec<String>),
    /// A single line, relayed as-is.
    Line(String),
    /// Close the connection without writing.
    Close,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Line(OK_LINE.to_string())
    }

    pub fn error(reason: ErrorReason) -> Self {
        Reply::Line(format!("{}{}", ERROR_PREFIX, reason))
    }

    pub fn outcome(result: Result<(), ErrorReason>) -> Self {
        match result {
            Ok(()) => Reply::ok(),
            Err(reason) => Reply::error(reason),
        }
    }

    /// Wire text including trailing newlines, or `None` for `Close`.
    pub fn render(&self) -> Option<String> {
        match self {
            Reply::Rows(rows) => {
                let mut out = String::new();
                for row in rows {
                    out.push_str(row);
                    out.push('\n');
                }
                out.push_str(END_SENTINEL);
                out.push('\n');
                Some(out)
            }
            Reply::Line(line) => Some(format!("{}\n", line)),
            Reply::Close => None,
        }
    }
}

/// One line of `STATS` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatEntry {
    Keyword { keyword: String, count: u64 },
    BookSearch { record_id: String, count: u64 },
}

impl StatEntry {
    /// Parses `KEYWORD <key>|<count>` or `BOOKSEARCH <id>|<count>`.
    /// The count is taken after the last `|`.
    pub fn parse(line: &str) -> Option<Self> {
        if let Some(body) = line.strip_prefix(KEYWORD_PREFIX) {
            let (keyword, count) = split_count(body)?;
            return Some(StatEntry::Keyword {
                keyword: keyword.to_string(),
                count,
            });
        }
        if let Some(body) = line.strip_prefix(BOOKSEARCH_PREFIX) {
            let (record_id, count) = split_count(body)?;
            return Some(StatEntry::BookSearch {
                record_id: record_id.to_string(),
                count,
            });
        }
        None
    }

    pub fn to_line(&self) -> String {
        match self {
            StatEntry::Keyword { keyword, count } => {
                format!("{}{}|{}", KEYWORD_PREFIX, keyword, count)
            }
            StatEntry::BookSearch { record_id, count } => {
                format!("{}{}|{}", BOOKSEARCH_PREFIX, record_id, count)
            }
        }
    }
}

fn split_count(body: &str) -> Option<(&str, u64)> {
    let (key, count) = body.rsplit_once('|')?;
    Some((key, count.trim().parse().ok()?))
}
