use std::sync::Arc;

use ledger::{content_hash, hash_to_hex, FileLedger, LedgerError, LedgerStore, MemoryLedger};

#[tokio::test]
async fn test_insert_then_get() {
    let store = MemoryLedger::new();
    let hash = content_hash(b"first upload");

    let outcome = store.insert_if_absent(hash, "alice").await.unwrap();
    assert!(outcome.inserted);
    assert_eq!(outcome.entry.uploader, "alice");

    let entry = store.get(hash).await.unwrap().unwrap();
    assert_eq!(entry, outcome.entry);
    assert!(store.exists(hash).await.unwrap());
}

#[tokio::test]
async fn test_second_insert_observes_winner() {
    let store = MemoryLedger::new();
    let hash = content_hash(b"same content");

    let first = store.insert_if_absent(hash, "alice").await.unwrap();
    let second = store.insert_if_absent(hash, "bob").await.unwrap();

    assert!(first.inserted);
    assert!(!second.inserted);
    assert_eq!(second.entry.uploader, "alice");
    assert_eq!(second.entry.registered_at, first.entry.registered_at);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_missing_hash() {
    let store = MemoryLedger::new();
    let hash = content_hash(b"never registered");
    assert!(store.get(hash).await.unwrap().is_none());
    assert!(!store.exists(hash).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_inserts_single_winner() {
    let store = Arc::new(MemoryLedger::new());
    let hash = content_hash(b"contended content");

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .insert_if_absent(hash, &format!("uploader-{i}"))
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    let mut first_seen_by = None;
    for handle in handles {
        let outcome = handle.await.unwrap();
        if outcome.inserted {
            winners += 1;
        }
        match &first_seen_by {
            None => first_seen_by = Some(outcome.entry.uploader.clone()),
            Some(winner) => assert_eq!(winner, &outcome.entry.uploader),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_file_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let hash = content_hash(b"durable content");

    {
        let store = FileLedger::open(&path).unwrap();
        let outcome = store.insert_if_absent(hash, "alice").await.unwrap();
        assert!(outcome.inserted);
    }

    let reopened = FileLedger::open(&path).unwrap();
    assert_eq!(reopened.len(), 1);
    let entry = reopened.get(hash).await.unwrap().unwrap();
    assert_eq!(entry.uploader, "alice");

    let replayed = reopened.insert_if_absent(hash, "bob").await.unwrap();
    assert!(!replayed.inserted);
    assert_eq!(replayed.entry.uploader, "alice");
}

#[tokio::test]
async fn test_file_ledger_rejects_duplicate_journal_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let hash = content_hash(b"doubled");

    let line = serde_json::json!({
        "digest": ledger::DIGEST_VERSION,
        "hash": hash_to_hex(&hash),
        "uploader": "alice",
        "registered_at": "2026-01-01T00:00:00Z",
    })
    .to_string();
    std::fs::write(&path, format!("{line}\n{line}\n")).unwrap();

    match FileLedger::open(&path) {
        Err(LedgerError::DuplicateHash(h)) => assert_eq!(h, hash_to_hex(&hash)),
        other => panic!("expected DuplicateHash, got {other:?}"),
    }
}

#[tokio::test]
async fn test_file_ledger_rejects_unknown_digest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    let hash = content_hash(b"versioned");

    let line = serde_json::json!({
        "digest": "md5-v0",
        "hash": hash_to_hex(&hash),
        "uploader": "alice",
        "registered_at": "2026-01-01T00:00:00Z",
    })
    .to_string();
    std::fs::write(&path, format!("{line}\n")).unwrap();

    assert!(matches!(
        FileLedger::open(&path),
        Err(LedgerError::Corrupt(_))
    ));
}
