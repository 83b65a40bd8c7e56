//! Result assembly: aggregation output + dedup registry outcome.

use chrono::{DateTime, Utc};
use ledger::{hash_to_hex, Hash32, LedgerStore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AggregateResult, Verdict};

/// Registry outcome for the submitted content hash.
///
/// `first_seen_by`/`first_seen_at` are set whenever the hash is registered,
/// including when registration happened on an earlier upload; they are null
/// only for content the registry has never accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DedupRecord {
    pub hash: String,
    pub newly_registered: bool,
    pub first_seen_by: Option<String>,
    pub first_seen_at: Option<DateTime<Utc>>,
}

/// The externally visible analysis record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub trust_score: u8,
    pub verdict: Verdict,
    pub sources: Vec<crate::SourceBreakdown>,
    pub anomalies: Vec<signals::Anomaly>,
    pub dedup: DedupRecord,
}

/// Shape the final record. Verified-Real content is registered through the
/// idempotent insert-if-absent path; a duplicate upload of previously
/// verified content is surfaced, not hidden. Other verdicts never register
/// but still report an existing registration.
pub async fn assemble(
    result: AggregateResult,
    hash: Hash32,
    uploader: &str,
    ledger: &dyn LedgerStore,
) -> ledger::Result<AnalysisReport> {
    let hash_hex = hash_to_hex(&hash);

    let dedup = if result.verdict == Verdict::Real {
        let outcome = ledger.insert_if_absent(hash, uploader).await?;
        if outcome.inserted {
            info!(hash = %hash_hex, uploader, "registered verified content");
        } else {
            info!(
                hash = %hash_hex,
                first_seen_by = %outcome.entry.uploader,
                "verified content already registered"
            );
        }
        DedupRecord {
            hash: hash_hex,
            newly_registered: outcome.inserted,
            first_seen_by: Some(outcome.entry.uploader),
            first_seen_at: Some(outcome.entry.registered_at),
        }
    } else {
        let existing = ledger.get(hash).await?;
        DedupRecord {
            hash: hash_hex,
            newly_registered: false,
            first_seen_by: existing.as_ref().map(|e| e.uploader.clone()),
            first_seen_at: existing.map(|e| e.registered_at),
        }
    };

    Ok(AnalysisReport {
        trust_score: result.trust_score,
        verdict: result.verdict,
        sources: result.sources,
        anomalies: result.anomalies,
        dedup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate, ScorePolicy};
    use ledger::{content_hash, MemoryLedger};
    use signals::{DetectionSignal, SignalSource};

    fn result_with_score(score: f64) -> AggregateResult {
        aggregate(
            vec![DetectionSignal::available(
                SignalSource::LocalDetector,
                score,
                "lightweight-cv/1.1",
            )],
            &ScorePolicy::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn real_verdict_registers_once() {
        let store = MemoryLedger::new();
        let hash = content_hash(b"authentic media");

        let first = assemble(result_with_score(0.9), hash, "alice", &store)
            .await
            .unwrap();
        assert_eq!(first.verdict, Verdict::Real);
        assert!(first.dedup.newly_registered);
        assert_eq!(first.dedup.first_seen_by.as_deref(), Some("alice"));

        let second = assemble(result_with_score(0.9), hash, "bob", &store)
            .await
            .unwrap();
        assert!(!second.dedup.newly_registered);
        assert_eq!(second.dedup.first_seen_by.as_deref(), Some("alice"));
        assert_eq!(second.dedup.first_seen_at, first.dedup.first_seen_at);
    }

    #[tokio::test]
    async fn fake_verdict_never_registers() {
        let store = MemoryLedger::new();
        let hash = content_hash(b"manipulated media");

        let report = assemble(result_with_score(0.2), hash, "mallory", &store)
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Fake);
        assert!(!report.dedup.newly_registered);
        assert_eq!(report.dedup.first_seen_by, None);
        assert!(!store.exists(hash).await.unwrap());
    }

    #[tokio::test]
    async fn non_real_upload_surfaces_existing_registration() {
        let store = MemoryLedger::new();
        let hash = content_hash(b"previously verified");
        store.insert_if_absent(hash, "alice").await.unwrap();

        let report = assemble(result_with_score(0.5), hash, "bob", &store)
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Uncertain);
        assert!(!report.dedup.newly_registered);
        assert_eq!(report.dedup.first_seen_by.as_deref(), Some("alice"));
        assert!(report.dedup.first_seen_at.is_some());
    }

    #[tokio::test]
    async fn report_carries_hex_hash() {
        let store = MemoryLedger::new();
        let bytes = b"hash me";
        let report = assemble(result_with_score(0.9), content_hash(bytes), "alice", &store)
            .await
            .unwrap();
        assert_eq!(report.dedup.hash, hash_to_hex(&content_hash(bytes)));
        assert_eq!(report.dedup.hash.len(), 64);
    }
}
