//! Ledger store trait and in-memory implementation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Hash32, LedgerError, Result};

/// First-registration record for one content hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HashEntry {
    pub uploader: String,
    pub registered_at: DateTime<Utc>,
}

impl HashEntry {
    pub fn new(uploader: impl Into<String>) -> Self {
        Self {
            uploader: uploader.into(),
            registered_at: Utc::now(),
        }
    }
}

/// Result of an insert-if-absent attempt. `entry` is always the winning
/// record: the caller's on first registration, the pre-existing one when
/// the hash was already known.
#[derive(Clone, Debug)]
pub struct InsertOutcome {
    pub inserted: bool,
    pub entry: HashEntry,
}

/// Append-only, hash-keyed registry. Implementations must make
/// `insert_if_absent` atomic per key: of N concurrent attempts for the same
/// hash exactly one observes `inserted = true`, and every loser receives
/// the winner's entry.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_if_absent(&self, hash: Hash32, uploader: &str) -> Result<InsertOutcome>;

    async fn get(&self, hash: Hash32) -> Result<Option<HashEntry>>;

    async fn exists(&self, hash: Hash32) -> Result<bool> {
        Ok(self.get(hash).await?.is_some())
    }
}

/// In-memory ledger (tests and demos). A single write lock around the map
/// entry makes the check-and-insert one step.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    entries: Arc<RwLock<HashMap<Hash32, HashEntry>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn insert_if_absent(&self, hash: Hash32, uploader: &str) -> Result<InsertOutcome> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        match entries.entry(hash) {
            Entry::Occupied(existing) => Ok(InsertOutcome {
                inserted: false,
                entry: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                let entry = HashEntry::new(uploader);
                slot.insert(entry.clone());
                Ok(InsertOutcome {
                    inserted: true,
                    entry,
                })
            }
        }
    }

    async fn get(&self, hash: Hash32) -> Result<Option<HashEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(entries.get(&hash).cloned())
    }
}
