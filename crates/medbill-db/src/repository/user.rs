//! # User Repository
//!
//! Shop accounts: password registration, login, the demo account, and
//! linking accounts to identity-provider subjects.
//!
//! ## Identity Mapping
//! ```text
//! token subject (uid) ──► users.external_uid = uid ? ──yes──► that user
//!                                 │ no
//!                                 ▼
//!                         users.email = token email ? ──yes──► link uid, that user
//!                                 │ no
//!                                 ▼
//!                         create user linked to uid
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use medbill_core::{OwnerId, User};

const USER_COLUMNS: &str = "id, email, shop_name, external_uid, subscription_expiry, created_at";

/// Fixed id of the bootstrap demo account.
pub const DEMO_USER_ID: OwnerId = 1;
pub const DEMO_USER_EMAIL: &str = "demo@shop.com";
pub const DEMO_USER_PASSWORD: &str = "demo123";
pub const DEMO_SHOP_NAME: &str = "Demo Medical Shop";

/// Claims taken from a bearer token, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get(&self, id: OwnerId) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_external_uid(&self, uid: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE external_uid = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(
        &self,
        email: &str,
        password_hash: Option<&str>,
        shop_name: &str,
        external_uid: Option<&str>,
        subscription_expiry: Option<NaiveDate>,
    ) -> DbResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, shop_name, external_uid, subscription_expiry) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(shop_name)
        .bind(external_uid)
        .bind(subscription_expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.ends_with("email") => {
                DbError::duplicate("email", email)
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();
        info!(user_id = id, "User created");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Registers a password account. The password is stored as an argon2 hash.
    pub async fn register(&self, email: &str, password: &str, shop_name: &str) -> DbResult<User> {
        debug!(email = %email, "Registering user");
        let hash = hash_password(password)?;
        self.insert(email, Some(&hash), shop_name, None, None).await
    }

    /// Checks an email/password pair.
    ///
    /// `None` for an unknown email, a wrong password, or an account that was
    /// provisioned from a token and has no password.
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<Option<User>> {
        let row: Option<(OwnerId, Option<String>)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((id, Some(hash))) if verify_password(password, &hash) => self.get(id).await,
            _ => Ok(None),
        }
    }

    /// Creates the demo account if it is missing. Idempotent.
    pub async fn ensure_demo_user(&self, today: NaiveDate) -> DbResult<User> {
        if let Some(user) = self.get(DEMO_USER_ID).await? {
            return Ok(user);
        }

        let hash = hash_password(DEMO_USER_PASSWORD)?;
        let expiry = today + chrono::Duration::days(30);

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, shop_name, subscription_expiry) \
             VALUES (?, ?, ?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(DEMO_USER_ID)
        .bind(DEMO_USER_EMAIL)
        .bind(&hash)
        .bind(DEMO_SHOP_NAME)
        .bind(expiry)
        .execute(&self.pool)
        .await?;

        info!(user_id = DEMO_USER_ID, "Demo user ensured");

        self.get(DEMO_USER_ID)
            .await?
            .ok_or_else(|| DbError::not_found("User", DEMO_USER_ID))
    }

    /// Maps a token identity onto a local account, creating one if needed.
    pub async fn resolve_external(&self, identity: &ExternalIdentity) -> DbResult<User> {
        if let Some(user) = self.find_by_external_uid(&identity.uid).await? {
            return Ok(user);
        }

        if let Some(email) = identity.email.as_deref() {
            if let Some(user) = self.find_by_email(email).await? {
                sqlx::query("UPDATE users SET external_uid = ? WHERE id = ?")
                    .bind(&identity.uid)
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
                info!(user_id = user.id, "Linked existing account to token subject");
                return self
                    .get(user.id)
                    .await?
                    .ok_or_else(|| DbError::not_found("User", user.id));
            }
        }

        let email = identity
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@external.local", identity.uid));
        let shop_name = identity.display_name.as_deref().unwrap_or("Shop");

        match self
            .insert(&email, None, shop_name, Some(&identity.uid), None)
            .await
        {
            Ok(user) => Ok(user),
            // A concurrent request provisioned the same subject first
            Err(e) if e.is_unique_violation() => self
                .find_by_external_uid(&identity.uid)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Hashes a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against a stored argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::empty_db;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = empty_db().await;
        let users = db.users();

        let user = users.register("owner@pharma.in", "s3cret!", "City Pharma").await.unwrap();
        assert_eq!(user.shop_name, "City Pharma");
        assert_eq!(user.subscription_expiry, None);

        let ok = users.authenticate("owner@pharma.in", "s3cret!").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(users.authenticate("owner@pharma.in", "wrong").await.unwrap().is_none());
        assert!(users.authenticate("nobody@pharma.in", "s3cret!").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = empty_db().await;
        db.users().register("dup@shop.com", "password", "A").await.unwrap();

        let err = db.users().register("dup@shop.com", "password", "B").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_demo_user_is_idempotent() {
        let db = empty_db().await;

        let first = db.users().ensure_demo_user(today()).await.unwrap();
        let second = db.users().ensure_demo_user(today()).await.unwrap();

        assert_eq!(first.id, DEMO_USER_ID);
        assert_eq!(second.id, DEMO_USER_ID);
        assert_eq!(first.email, DEMO_USER_EMAIL);
        assert_eq!(
            first.subscription_expiry,
            Some(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap())
        );
        assert!(db
            .users()
            .authenticate(DEMO_USER_EMAIL, DEMO_USER_PASSWORD)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_resolve_external_links_then_reuses() {
        let db = empty_db().await;
        let users = db.users();
        let existing = users.register("linked@shop.com", "password", "Linked").await.unwrap();

        let identity = ExternalIdentity {
            uid: "uid-123".to_string(),
            email: Some("linked@shop.com".to_string()),
            display_name: None,
        };

        let mapped = users.resolve_external(&identity).await.unwrap();
        assert_eq!(mapped.id, existing.id);
        assert_eq!(mapped.external_uid.as_deref(), Some("uid-123"));

        // Now found by uid even without an email claim
        let by_uid = users
            .resolve_external(&ExternalIdentity {
                uid: "uid-123".to_string(),
                email: None,
                display_name: None,
            })
            .await
            .unwrap();
        assert_eq!(by_uid.id, existing.id);
    }

    #[tokio::test]
    async fn test_resolve_external_creates_passwordless_account() {
        let db = empty_db().await;
        let identity = ExternalIdentity {
            uid: "fresh-uid".to_string(),
            email: None,
            display_name: Some("Night Chemist".to_string()),
        };

        let user = db.users().resolve_external(&identity).await.unwrap();
        assert_eq!(user.shop_name, "Night Chemist");
        assert_eq!(user.email, "fresh-uid@external.local");

        // No password was ever set, so password login is impossible
        assert!(db
            .users()
            .authenticate("fresh-uid@external.local", "")
            .await
            .unwrap()
            .is_none());
    }
}
