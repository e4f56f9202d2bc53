//! # Expiry Loss Ledger (read side)
//!
//! Rows are only ever written by [`crate::ledger`]. This repository never
//! updates or deletes them.

use sqlx::SqlitePool;

use crate::error::DbResult;
use medbill_core::{ExpiryLossRecord, OwnerId};

#[derive(Debug, Clone)]
pub struct ExpiryLossRepository {
    pool: SqlitePool,
}

impl ExpiryLossRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpiryLossRepository { pool }
    }

    /// The owner's recorded losses, newest first.
    pub async fn list(&self, owner: OwnerId) -> DbResult<Vec<ExpiryLossRecord>> {
        let rows = sqlx::query_as::<_, ExpiryLossRecord>(
            "SELECT id, user_id, item_id, item_name, loss_cents, recorded_at \
             FROM expiry_loss_history WHERE user_id = ? \
             ORDER BY recorded_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count(&self, owner: OwnerId) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM expiry_loss_history WHERE user_id = ?")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
