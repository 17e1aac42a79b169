//! Database repository for user records.
//!
//! Defines the `UserStore` collaborator interface consumed by the account
//! lifecycle service, together with its SQLite implementation.

use crate::database::models::{
    CreatePendingUser, CreateVerifiedUser, EmailStatus, OAUTH_PASSWORD_SENTINEL, User, UserRole,
};
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Persistence operations required by the account lifecycle service.
///
/// The store must enforce a uniqueness constraint on email; concurrent
/// creations for the same address race on a single atomic check-and-insert.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by email, any verification state.
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>>;

    /// Looks up a user by identifier.
    async fn find_by_id(&self, id: &str) -> ServiceResult<Option<User>>;

    /// Creates a `Pending` record carrying a verification code.
    ///
    /// Fails with `ServiceError::DuplicateEmail` if the email is taken.
    async fn create_pending(&self, data: CreatePendingUser) -> ServiceResult<User>;

    /// Creates a record already `Verified`, with the given role.
    ///
    /// Fails with `ServiceError::DuplicateEmail` if the email is taken.
    async fn create_verified(&self, data: CreateVerifiedUser) -> ServiceResult<User>;

    /// Creates a `Verified` record with the OAuth sentinel password, or
    /// refreshes the display name on the existing record for that email.
    async fn upsert_oauth(&self, email: &str, name: &str) -> ServiceResult<User>;

    /// Transitions the record to `Verified` and clears the stored code.
    async fn set_verified(&self, id: &str) -> ServiceResult<()>;

    /// Replaces the stored password hash.
    async fn update_password(&self, id: &str, password_hash: &str) -> ServiceResult<()>;
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role, email_status, \
     verification_code, created_at, updated_at";

/// SQLite-backed `UserStore`.
pub struct SqliteUserStore {
    /// Shared database connection pool
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Creates a new SqliteUserStore instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_insert_error(e: sqlx::Error, email: &str) -> ServiceError {
        // The UNIQUE index on email is the atomic duplicate check.
        if e.to_string().contains("UNIQUE constraint failed") {
            ServiceError::duplicate_email(email)
        } else {
            ServiceError::Database { source: e.into() }
        }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?;

        Ok(user)
    }

    async fn create_pending(&self, data: CreatePendingUser) -> ServiceResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
             (id, email, name, password_hash, role, email_status, verification_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.password_hash)
        .bind(UserRole::Standard)
        .bind(EmailStatus::Pending)
        .bind(&data.verification_code)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(e, &data.email))?;

        Ok(user)
    }

    async fn create_verified(&self, data: CreateVerifiedUser) -> ServiceResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
             (id, email, name, password_hash, role, email_status, verification_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(EmailStatus::Verified)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(e, &data.email))?;

        Ok(user)
    }

    async fn upsert_oauth(&self, email: &str, name: &str) -> ServiceResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
             (id, email, name, password_hash, role, email_status, verification_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?) \
             ON CONFLICT(email) DO UPDATE SET \
             name = excluded.name, updated_at = excluded.updated_at \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7().to_string())
        .bind(email)
        .bind(name)
        .bind(OAUTH_PASSWORD_SENTINEL)
        .bind(UserRole::Standard)
        .bind(EmailStatus::Verified)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?;

        Ok(user)
    }

    async fn set_verified(&self, id: &str) -> ServiceResult<()> {
        // Clearing the code in the same statement keeps the
        // Pending-has-code invariant.
        let result = sqlx::query(
            "UPDATE users SET email_status = ?, verification_code = NULL, updated_at = ? \
             WHERE id = ?",
        )
        .bind(EmailStatus::Verified)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ServiceError::Database { source: e.into() })?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("User", id));
        }
        Ok(())
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> ServiceResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::Database { source: e.into() })?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("User", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteUserStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!().run(&pool).await.expect("migrations");
        SqliteUserStore::new(pool)
    }

    fn pending(email: &str) -> CreatePendingUser {
        CreatePendingUser {
            email: email.to_string(),
            name: "Ann".to_string(),
            password_hash: "hash".to_string(),
            verification_code: "123456".to_string(),
        }
    }

    #[tokio::test]
    async fn create_pending_stores_code_and_rejects_duplicates() {
        let store = store().await;

        let user = store.create_pending(pending("a@x.com")).await.expect("create");
        assert_eq!(user.email_status, EmailStatus::Pending);
        assert_eq!(user.role, UserRole::Standard);
        assert_eq!(user.verification_code.as_deref(), Some("123456"));

        // The unique constraint decides the duplicate, any state.
        let err = store.create_pending(pending("a@x.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail { .. }));

        let err = store
            .create_verified(CreateVerifiedUser {
                email: "a@x.com".to_string(),
                name: "Ann".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Admin,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail { .. }));
    }

    #[tokio::test]
    async fn create_verified_has_no_code() {
        let store = store().await;

        let user = store
            .create_verified(CreateVerifiedUser {
                email: "admin@x.com".to_string(),
                name: "Root".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Admin,
            })
            .await
            .expect("create");

        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.email_status, EmailStatus::Verified);
        assert!(user.verification_code.is_none());
    }

    #[tokio::test]
    async fn set_verified_clears_the_code() {
        let store = store().await;
        let user = store.create_pending(pending("a@x.com")).await.unwrap();

        store.set_verified(&user.id).await.expect("set verified");

        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.email_status, EmailStatus::Verified);
        assert!(stored.verification_code.is_none());

        let err = store.set_verified("missing-id").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn upsert_oauth_creates_then_updates_in_place() {
        let store = store().await;

        let created = store.upsert_oauth("ann@x.com", "Ann").await.expect("create");
        assert_eq!(created.email_status, EmailStatus::Verified);
        assert_eq!(created.password_hash, OAUTH_PASSWORD_SENTINEL);
        assert!(created.verification_code.is_none());

        let updated = store.upsert_oauth("ann@x.com", "Ann Lee").await.expect("update");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ann Lee");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_password_replaces_the_hash() {
        let store = store().await;
        let user = store.create_pending(pending("a@x.com")).await.unwrap();

        store
            .update_password(&user.id, "new-hash")
            .await
            .expect("update password");

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn lookups_return_none_for_unknown_users() {
        let store = store().await;
        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_by_id("missing-id").await.unwrap().is_none());
    }
}
