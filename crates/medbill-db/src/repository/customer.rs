//! # Customer Details Repository
//!
//! The shop's letterhead (name, organisation, GSTIN...) printed on bills.
//! One row per owner, created on first save.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use medbill_core::{CustomerDetails, OwnerId};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Returns the saved details, or all-empty defaults if none exist yet.
    pub async fn get(&self, owner: OwnerId) -> DbResult<CustomerDetails> {
        let details = sqlx::query_as::<_, CustomerDetails>(
            "SELECT name, organization_name, email, address, gstin \
             FROM customer_details WHERE user_id = ?",
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(details.unwrap_or_default())
    }

    /// Inserts or replaces the owner's details.
    pub async fn upsert(&self, owner: OwnerId, details: &CustomerDetails) -> DbResult<()> {
        debug!(owner, "Saving customer details");

        sqlx::query(
            "INSERT INTO customer_details (user_id, name, organization_name, email, address, gstin) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
               name = excluded.name, \
               organization_name = excluded.organization_name, \
               email = excluded.email, \
               address = excluded.address, \
               gstin = excluded.gstin, \
               updated_at = CURRENT_TIMESTAMP",
        )
        .bind(owner)
        .bind(&details.name)
        .bind(&details.organization_name)
        .bind(&details.email)
        .bind(&details.address)
        .bind(&details.gstin)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::db_with_owner;

    #[tokio::test]
    async fn test_defaults_then_upsert() {
        let (db, owner) = db_with_owner().await;
        assert_eq!(db.customers().get(owner).await.unwrap(), CustomerDetails::default());

        let mut details = CustomerDetails {
            name: "Anita".to_string(),
            organization_name: "Anita Medicals".to_string(),
            email: "anita@medicals.in".to_string(),
            address: "12 MG Road".to_string(),
            gstin: "29ABCDE1234F1Z5".to_string(),
        };
        db.customers().upsert(owner, &details).await.unwrap();
        assert_eq!(db.customers().get(owner).await.unwrap(), details);

        details.address = "14 MG Road".to_string();
        db.customers().upsert(owner, &details).await.unwrap();
        assert_eq!(db.customers().get(owner).await.unwrap().address, "14 MG Road");

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_details")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
