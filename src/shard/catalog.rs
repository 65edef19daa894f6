//! Shard Catalog
//!
//! Holds the shard's records behind a `tokio::sync::RwLock` and its query counters in
//! `DashMap`s.
//!
//! ## Locking
//! - `search` / `list_available`: shared read lock, concurrent with each other.
//! - `lease` / `return_record`: exclusive write lock held across lookup, state check,
//!   state change and storage rewrite. A failed rewrite restores the previous state
//!   before the lock is released.
//! - Counters are updated outside the record lock.

use super::seed::default_records;
use crate::protocol::{ErrorReason, StatEntry};
use crate::record::Record;

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct Catalog {
    shard_id: String,
    storage_path: PathBuf,
    records: RwLock<Vec<Record>>,
    keyword_hits: DashMap<String, u64>,
    record_hits: DashMap<String, u64>,
}

impl Catalog {
    /// Loads the catalog from `storage_path`, or seeds and persists the default
    /// records when the file does not exist yet.
    pub async fn open(shard_id: &str, storage_path: impl Into<PathBuf>) -> Result<Arc<Self>> {
        let storage_path = storage_path.into();

        let records = if tokio::fs::try_exists(&storage_path)
            .await
            .with_context(|| format!("checking {}", storage_path.display()))?
        {
            let records = load_records(&storage_path).await?;
            tracing::info!(
                "Shard {} loaded {} records from {}",
                shard_id,
                records.len(),
                storage_path.display()
            );
            records
        } else {
            if let Some(parent) = storage_path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let records = default_records(shard_id);
            write_records(&storage_path, &records)
                .await
                .with_context(|| format!("writing {}", storage_path.display()))?;
            tracing::info!(
                "Shard {} seeded {} default records into {}",
                shard_id,
                records.len(),
                storage_path.display()
            );
            records
        };

        Ok(Arc::new(Self {
            shard_id: shard_id.to_string(),
            storage_path,
            records: RwLock::new(records),
            keyword_hits: DashMap::new(),
            record_hits: DashMap::new(),
        }))
    }

    pub fn shard_id(&self) -> &str {
        &self.shard_id
    }

    /// Returns every record matching `keyword`, leased or not, and bumps the
    /// keyword counter and each matching record's counter.
    pub async fn search(&self, keyword: &str) -> Vec<Record> {
        *self.keyword_hits.entry(keyword.to_lowercase()).or_insert(0) += 1;

        let matches: Vec<Record> = self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.matches(keyword))
            .cloned()
            .collect();

        for record in &matches {
            *self.record_hits.entry(record.id.clone()).or_insert(0) += 1;
        }

        tracing::debug!(
            "Shard {} SEARCH '{}' matched {} records",
            self.shard_id,
            keyword,
            matches.len()
        );
        matches
    }

    /// Records currently available. Does not touch the counters.
    pub async fn list_available(&self) -> Vec<Record> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| record.is_available())
            .cloned()
            .collect()
    }

    pub async fn lease(&self, record_id: &str) -> Result<(), ErrorReason> {
        self.transition(record_id, false).await
    }

    pub async fn return_record(&self, record_id: &str) -> Result<(), ErrorReason> {
        self.transition(record_id, true).await
    }

    async fn transition(&self, record_id: &str, to_available: bool) -> Result<(), ErrorReason> {
        let mut records = self.records.write().await;

        let idx = records
            .iter()
            .position(|record| record.id == record_id)
            .ok_or(ErrorReason::NotFound)?;

        if records[idx].is_available() == to_available {
            return Err(if to_available {
                ErrorReason::AlreadyAvailable
            } else {
                ErrorReason::NotAvailable
            });
        }

        records[idx].set_available(to_available);

        if let Err(e) = write_records(&self.storage_path, &records).await {
            records[idx].set_available(!to_available);
            tracing::error!(
                "Shard {} failed to persist {} of {}: {}",
                self.shard_id,
                if to_available { "return" } else { "lease" },
                record_id,
                e
            );
            return Err(ErrorReason::PersistFailed);
        }

        tracing::info!(
            "Shard {} {} {}",
            self.shard_id,
            if to_available { "returned" } else { "leased" },
            record_id
        );
        Ok(())
    }

    /// Every accumulated counter: keywords first, then records. Unsorted.
    pub fn stats(&self) -> Vec<StatEntry> {
        let keywords = self.keyword_hits.iter().map(|entry| StatEntry::Keyword {
            keyword: entry.key().clone(),
            count: *entry.value(),
        });
        let records = self.record_hits.iter().map(|entry| StatEntry::BookSearch {
            record_id: entry.key().clone(),
            count: *entry.value(),
        });
        keywords.chain(records).collect()
    }

    pub async fn snapshot(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }
}

async fn load_records(path: &Path) -> Result<Vec<Record>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    Ok(content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(Record::from_storage_line)
        .collect())
}

async fn write_records(path: &Path, records: &[Record]) -> std::io::Result<()> {
    let mut content = String::new();
    for record in records {
        content.push_str(&record.to_storage_line());
        content.push('\n');
    }
    tokio::fs::write(path, content).await
}
