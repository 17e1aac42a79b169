//! Data structures for authentication-related entities.
//!
//! This module defines request and response payloads for sign-up, email
//! verification, sign-in, token refresh and the OAuth callback, used for
//! data transfer within the authentication flow.

use crate::database::models::{EmailStatus, User, UserRole};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Direct or admin sign-up payload
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        email(message = "Must be a valid email"),
        length(max = 255, message = "Email too long")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Password confirmation must match"))]
    pub confirm_password: String,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1-255 characters"))]
    pub name: String,
}

/// Email verification payload
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,

    #[validate(length(equal = 6, message = "Verification code must be 6 digits"))]
    pub code: String,
}

/// Sign-in request payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Query parameters delivered by the provider redirect.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
}

/// The two bearer values delivered to the caller as session credentials.
///
/// The surrounding web layer stores them as HTTP-only cookies; sign-out
/// delivers the cleared pair.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCredentials {
    pub authorization: String,
    pub refresh_token: String,
}

impl SessionCredentials {
    pub fn new(access_token: &str, refresh_token: String) -> Self {
        Self {
            authorization: format!("Bearer {access_token}"),
            refresh_token,
        }
    }

    /// The cleared pair returned on sign-out.
    pub fn cleared() -> Self {
        Self {
            authorization: String::new(),
            refresh_token: String::new(),
        }
    }
}

/// Sign-in response containing session credentials and user info
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub credentials: SessionCredentials,
    pub user: UserInfo,
    pub expires_in: u64, // Access token expiration in seconds
}

/// Token refresh response
#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub authorization: String,
    pub expires_in: u64,
}

/// User information returned to authenticated callers
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub email_status: EmailStatus,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            email_status: user.email_status,
        }
    }
}
