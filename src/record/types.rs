/// A single catalog entry (a book).
///
/// `available` is private: only the owning shard flips it, through the
/// lease/return transitions in `shard::catalog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub author: String,
    pub keywords: Vec<String>,
    available: bool,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        keywords: Vec<String>,
        available: bool,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            keywords,
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Shard id embedded in the record id.
    pub fn owning_shard(&self) -> &str {
        owning_shard(&self.id)
    }

    /// Case-insensitive substring test against title, author and every keyword.
    pub fn matches(&self, keyword: &str) -> bool {
        let query = keyword.to_lowercase();

        self.title.to_lowercase().contains(&query)
            || self.author.to_lowercase().contains(&query)
            || self
                .keywords
                .iter()
                .any(|kw| kw.to_lowercase().contains(&query))
    }
}

/// Returns the substring before the first `-`, or `""` when there is no
/// prefix (no `-` at all, or a leading `-`).
pub fn owning_shard(record_id: &str) -> &str {
    match record_id.find('-') {
        Some(idx) if idx > 0 => &record_id[..idx],
        _ => "",
    }
}
