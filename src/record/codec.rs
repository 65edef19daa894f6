//! Record Encodings
//!
//! - **Storage line**: `id|title|author|kw1;kw2|true`. Every field is escaped with `\`
//!   so that `|` and `\` survive a round trip. Keywords are joined with `;` before
//!   escaping; a `;` inside a keyword is not preserved.
//! - **Wire line**: `BOOK id|title|author|shardId|available`. Fields are not escaped;
//!   a `|` in the title or author is replaced with `/`. Keywords are not carried, so
//!   decoding a wire line yields a record with an empty keyword list.
//!
//! Both decoders are total: missing trailing fields are padded with `""`.

use super::types::Record;

pub const FIELD_DELIMITER: char = '|';
pub const ESCAPE: char = '\\';
pub const KEYWORD_SEPARATOR: char = ';';
pub const WIRE_SUBSTITUTE: char = '/';
pub const BOOK_PREFIX: &str = "BOOK ";

const FIELD_COUNT: usize = 5;

const AVAILABLE_TOKEN: &str = "available";
const LEASED_TOKEN: &str = "leased";

impl Record {
    pub fn to_storage_line(&self) -> String {
        let keywords = self.keywords.join(&KEYWORD_SEPARATOR.to_string());
        [
            escape(&self.id),
            escape(&self.title),
            escape(&self.author),
            escape(&keywords),
            self.is_available().to_string(),
        ]
        .join(&FIELD_DELIMITER.to_string())
    }

    pub fn from_storage_line(line: &str) -> Self {
        let mut fields = split_escaped(line, FIELD_COUNT).into_iter();
        let mut next = || fields.next().unwrap_or_default();

        let id = next();
        let title = next();
        let author = next();
        let keywords = next();
        let available = next().eq_ignore_ascii_case("true");

        let keywords = if keywords.is_empty() {
            Vec::new()
        } else {
            keywords
                .split(KEYWORD_SEPARATOR)
                .map(str::to_string)
                .collect()
        };

        Record::new(id, title, author, keywords, available)
    }

    pub fn to_wire_line(&self) -> String {
        let status = if self.is_available() {
            AVAILABLE_TOKEN
        } else {
            LEASED_TOKEN
        };
        format!(
            "{BOOK_PREFIX}{}|{}|{}|{}|{}",
            self.id,
            substitute(&self.title),
            substitute(&self.author),
            self.owning_shard(),
            status
        )
    }

    /// Decodes a `BOOK ...` line. Returns `None` for lines without the prefix.
    /// The shard id field is ignored; it is re-derived from the id.
    pub fn from_wire_line(line: &str) -> Option<Self> {
        let body = line.strip_prefix(BOOK_PREFIX)?;

        let mut fields: Vec<&str> = body.split(FIELD_DELIMITER).collect();
        while fields.len() < FIELD_COUNT {
            fields.push("");
        }

        let available = fields[4].eq_ignore_ascii_case(AVAILABLE_TOKEN);
        Some(Record::new(
            fields[0],
            fields[1],
            fields[2],
            Vec::new(),
            available,
        ))
    }
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c == ESCAPE || c == FIELD_DELIMITER {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

fn substitute(field: &str) -> String {
    field.replace(FIELD_DELIMITER, &WIRE_SUBSTITUTE.to_string())
}

/// Splits on unescaped delimiters, dropping the escape characters.
/// Pads with empty fields up to `expected`.
fn split_escaped(line: &str, expected: usize) -> Vec<String> {
    let mut fields = Vec::with_capacity(expected);
    let mut current = String::new();
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == FIELD_DELIMITER {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    while fields.len() < expected {
        fields.push(String::new());
    }
    fields
}
