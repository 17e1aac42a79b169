//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Placeholder stored instead of a password hash on OAuth-only accounts.
/// Never a valid bcrypt digest, so it can never verify.
pub const OAUTH_PASSWORD_SENTINEL: &str = "*oauth*";

/// Permission level, fixed at account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum UserRole {
    Standard,
    Admin,
}

/// Email-ownership verification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum EmailStatus {
    Pending,
    Verified,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub email_status: EmailStatus,
    /// Present while `email_status` is `Pending`, cleared on verification.
    pub verification_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the record was created through an identity provider and
    /// carries no usable password.
    pub fn is_oauth_only(&self) -> bool {
        self.password_hash == OAUTH_PASSWORD_SENTINEL
    }
}

/// Data for a direct sign-up, stored awaiting email verification.
#[derive(Debug, Clone)]
pub struct CreatePendingUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub verification_code: String,
}

/// Data for an account created already verified (admin path).
#[derive(Debug, Clone)]
pub struct CreateVerifiedUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
}
