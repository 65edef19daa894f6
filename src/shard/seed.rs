use crate::record::Record;

fn book(id: &str, title: &str, author: &str, keywords: &[&str]) -> Record {
    Record::new(
        id,
        title,
        author,
        keywords.iter().map(|kw| kw.to_string()).collect(),
        true,
    )
}

/// Bootstrap catalog for a shard that has no storage file yet.
/// Unrecognised shard ids start empty.
pub fn default_records(shard_id: &str) -> Vec<Record> {
    match shard_id {
        "LIB1" => vec![
            book(
                "LIB1-001",
                "Distributed Systems",
                "Andrew Tanenbaum",
                &["distributed", "systems", "networks"],
            ),
            book(
                "LIB1-002",
                "Operating Systems",
                "Abraham Silberschatz",
                &["os", "kernel", "threads"],
            ),
        ],
        "LIB2" => vec![
            book(
                "LIB2-001",
                "Algorithms",
                "Robert Sedgewick",
                &["algorithms", "data structures"],
            ),
            book(
                "LIB2-002",
                "Java Concurrency in Practice",
                "Brian Goetz",
                &["java", "concurrency", "threads"],
            ),
        ],
        "LIB3" => vec![
            book(
                "LIB3-001",
                "Clean Code",
                "Robert Martin",
                &["clean code", "best practices", "software"],
            ),
            book(
                "LIB3-002",
                "Design Patterns",
                "Erich Gamma",
                &["patterns", "oop", "design"],
            ),
        ],
        _ => Vec::new(),
    }
}
