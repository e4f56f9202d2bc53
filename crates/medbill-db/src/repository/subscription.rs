//! # Subscription Repository
//!
//! Recharges extend the owner's subscription from whichever is later:
//! today, or the current expiry. Time already paid for is never lost.
//!
//! ```text
//! expiry 2024-03-10, today 2024-02-01, +1 month → 2024-04-10
//! expiry 2024-01-05, today 2024-02-01, +1 month → 2024-03-01
//! ```

use chrono::{Months, NaiveDate};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use medbill_core::{Money, OwnerId};

/// New expiry after adding `plan_months` to the later of `today` and `current`.
pub fn extended_expiry(current: Option<NaiveDate>, today: NaiveDate, plan_months: u32) -> Option<NaiveDate> {
    let base = current.map_or(today, |expiry| expiry.max(today));
    base.checked_add_months(Months::new(plan_months))
}

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    /// Records a recharge and returns the new expiry date.
    pub async fn recharge(
        &self,
        owner: OwnerId,
        plan_months: u32,
        amount: Money,
        today: NaiveDate,
    ) -> DbResult<NaiveDate> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let current: Option<Option<NaiveDate>> =
            sqlx::query_scalar("SELECT subscription_expiry FROM users WHERE id = ?")
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or_else(|| DbError::not_found("User", owner))?;

        let starts_on = current.map_or(today, |expiry| expiry.max(today));
        let expires_on = extended_expiry(current, today, plan_months)
            .ok_or_else(|| DbError::Internal("subscription expiry out of range".to_string()))?;

        sqlx::query(
            "INSERT INTO subscriptions (user_id, plan_months, amount_cents, starts_on, expires_on) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(owner)
        .bind(plan_months as i64)
        .bind(amount.cents())
        .bind(starts_on)
        .bind(expires_on)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET subscription_expiry = ? WHERE id = ?")
            .bind(expires_on)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(owner, plan_months, expires_on = %expires_on, "Subscription recharged");
        Ok(expires_on)
    }
}
