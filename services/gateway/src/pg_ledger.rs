use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledger::{hash_to_hex, Hash32, HashEntry, InsertOutcome, LedgerError, LedgerStore};
use sqlx::{PgPool, Row};

/// Ledger backed by the `media_ledger` table. The primary-key constraint on
/// the hash column is what makes insert-if-absent atomic: of N concurrent
/// inserts for the same hash exactly one row lands, and everyone else reads
/// that row back.
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn insert_if_absent(
        &self,
        hash: Hash32,
        uploader: &str,
    ) -> ledger::Result<InsertOutcome> {
        let hash_hex = hash_to_hex(&hash);
        let entry = HashEntry::new(uploader);

        let res = sqlx::query(
            r#"
            INSERT INTO media_ledger (hash, uploader, registered_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (hash) DO NOTHING
            "#,
        )
        .bind(&hash_hex)
        .bind(&entry.uploader)
        .bind(entry.registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        if res.rows_affected() == 1 {
            return Ok(InsertOutcome {
                inserted: true,
                entry,
            });
        }

        // Lost the race: the winning row must exist, the table is
        // append-only.
        let existing = self.get(hash).await?.ok_or_else(|| {
            LedgerError::Storage(format!("ledger row vanished for {hash_hex}"))
        })?;
        Ok(InsertOutcome {
            inserted: false,
            entry: existing,
        })
    }

    async fn get(&self, hash: Hash32) -> ledger::Result<Option<HashEntry>> {
        let row = sqlx::query(
            r#"SELECT uploader, registered_at FROM media_ledger WHERE hash = $1"#,
        )
        .bind(hash_to_hex(&hash))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(row.map(|r| {
            let uploader: String = r.get("uploader");
            let registered_at: DateTime<Utc> = r.get("registered_at");
            HashEntry {
                uploader,
                registered_at,
            }
        }))
    }
}
