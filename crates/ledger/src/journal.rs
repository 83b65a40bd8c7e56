//! File-backed ledger: an append-only JSON-lines journal plus an in-memory
//! index rebuilt on open.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::store::{HashEntry, InsertOutcome, LedgerStore};
use crate::{hash_from_hex, hash_to_hex, Hash32, LedgerError, Result, DIGEST_VERSION};

#[derive(Serialize, Deserialize)]
struct JournalLine {
    digest: String,
    hash: String,
    #[serde(flatten)]
    entry: HashEntry,
}

#[derive(Debug)]
struct Inner {
    index: HashMap<Hash32, HashEntry>,
    file: File,
}

/// Durable ledger backed by a local journal file. Registrations are appended
/// one JSON object per line and flushed before the insert is acknowledged;
/// the journal is never rewritten.
#[derive(Debug)]
pub struct FileLedger {
    inner: Mutex<Inner>,
}

impl FileLedger {
    /// Open (or create) a journal and replay it. A journal that registers
    /// the same hash twice violates the append-only contract and is
    /// rejected as corrupt.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| LedgerError::Storage(format!("open {}: {e}", path.display())))?;

        let mut index = HashMap::new();
        let reader = BufReader::new(
            File::open(path).map_err(|e| LedgerError::Storage(e.to_string()))?,
        );
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| LedgerError::Storage(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: JournalLine = serde_json::from_str(&line)
                .map_err(|e| LedgerError::Corrupt(format!("line {}: {e}", i + 1)))?;
            if parsed.digest != DIGEST_VERSION {
                return Err(LedgerError::Corrupt(format!(
                    "line {}: unknown digest {}",
                    i + 1,
                    parsed.digest
                )));
            }
            let hash = hash_from_hex(&parsed.hash)
                .ok_or_else(|| LedgerError::Corrupt(format!("line {}: bad hash", i + 1)))?;
            if index.insert(hash, parsed.entry).is_some() {
                return Err(LedgerError::DuplicateHash(parsed.hash));
            }
        }

        Ok(Self {
            inner: Mutex::new(Inner { index, file }),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LedgerStore for FileLedger {
    async fn insert_if_absent(&self, hash: Hash32, uploader: &str) -> Result<InsertOutcome> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        let inner = &mut *guard;

        match inner.index.entry(hash) {
            Entry::Occupied(existing) => Ok(InsertOutcome {
                inserted: false,
                entry: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                let entry = HashEntry::new(uploader);
                let line = JournalLine {
                    digest: DIGEST_VERSION.to_string(),
                    hash: hash_to_hex(&hash),
                    entry: entry.clone(),
                };
                let mut encoded = serde_json::to_vec(&line)
                    .map_err(|e| LedgerError::Storage(e.to_string()))?;
                encoded.push(b'\n');
                inner
                    .file
                    .write_all(&encoded)
                    .and_then(|_| inner.file.flush())
                    .map_err(|e| LedgerError::Storage(e.to_string()))?;
                slot.insert(entry.clone());
                Ok(InsertOutcome {
                    inserted: true,
                    entry,
                })
            }
        }
    }

    async fn get(&self, hash: Hash32) -> Result<Option<HashEntry>> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(guard.index.get(&hash).cloned())
    }
}
