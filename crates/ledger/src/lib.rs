//! Content-hash dedup registry.
//!
//! Append-only, hash-keyed store providing at-most-once registration per
//! content hash. The hash is computed over the entire raw file bytes with a
//! fixed, versioned digest, so the same file always maps to the same key
//! regardless of filename or upload time.

mod hash;
mod journal;
mod store;

pub use hash::{content_hash, hash_from_hex, hash_to_hex, Hash32, DIGEST_VERSION};
pub use journal::FileLedger;
pub use store::{HashEntry, InsertOutcome, LedgerStore, MemoryLedger};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("corrupt journal: {0}")]
    Corrupt(String),

    #[error("hash already registered: {0}")]
    DuplicateHash(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
