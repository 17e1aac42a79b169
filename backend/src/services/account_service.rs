//! Core business logic for the account lifecycle.
//!
//! Orchestrates sign-up, email verification, sign-in, token refresh,
//! sign-out and third-party account linking. State transitions per account:
//! `Unregistered -> Pending(code) -> Verified`; admin accounts are created
//! directly `Verified`.

use crate::auth::models::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, SessionCredentials,
    SignupRequest, UserInfo, VerifyEmailRequest,
};
use crate::config::Config;
use crate::database::models::{CreatePendingUser, CreateVerifiedUser, EmailStatus, User, UserRole};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::{SqliteUserStore, UserStore};
use crate::services::email_service::{EmailService, Mailer};
use crate::services::oauth_service::{IdentityBroker, OAuthService};
use crate::utils::jwt::TokenIssuer;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::verification_code::generate_verification_code;
use sqlx::SqlitePool;
use validator::Validate;

/// Account lifecycle service, generic over its collaborators so tests can
/// supply in-memory doubles.
pub struct AccountService<S, M, B> {
    store: S,
    mailer: M,
    broker: B,
    token_issuer: TokenIssuer,
    access_ttl_seconds: u64,
    require_verified_login: bool,
}

impl AccountService<SqliteUserStore, EmailService, OAuthService> {
    /// Wires the service with its production collaborators.
    pub fn from_pool(pool: &SqlitePool) -> ServiceResult<Self> {
        let config = Config::from_env()
            .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;

        let store = SqliteUserStore::new(pool.clone());
        let mailer = EmailService::new(
            config
                .email_config()
                .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?,
        )?;
        let broker = OAuthService::new(
            config
                .oauth_providers()
                .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?,
        )?;
        let token_issuer = TokenIssuer::from_config(&config);

        Ok(Self::new(
            store,
            mailer,
            broker,
            token_issuer,
            (config.access_token_ttl_hours as u64) * 3600,
            config.require_verified_login,
        ))
    }
}

impl<S: UserStore, M: Mailer, B: IdentityBroker> AccountService<S, M, B> {
    /// Creates a new AccountService instance over explicit collaborators.
    pub fn new(
        store: S,
        mailer: M,
        broker: B,
        token_issuer: TokenIssuer,
        access_ttl_seconds: u64,
        require_verified_login: bool,
    ) -> Self {
        Self {
            store,
            mailer,
            broker,
            token_issuer,
            access_ttl_seconds,
            require_verified_login,
        }
    }

    /// Registers a regular account.
    ///
    /// The record is persisted in `Pending` state carrying a single-use
    /// verification code, then the code is emailed to the address. A mailer
    /// failure after the write propagates while the record stays `Pending`,
    /// so a caller-initiated resend can reuse it; the write is never rolled
    /// back.
    pub async fn sign_up(&self, request: SignupRequest) -> ServiceResult<User> {
        self.validate(&request)?;
        self.reject_taken_email(&request.email).await?;

        let password_hash = hash_password(&request.password)?;
        let verification_code = generate_verification_code();

        let user = self
            .store
            .create_pending(CreatePendingUser {
                email: request.email,
                name: request.name,
                password_hash,
                verification_code: verification_code.clone(),
            })
            .await?;

        if let Err(e) = self
            .mailer
            .send_verification_email(&user.email, &verification_code)
            .await
        {
            tracing::error!("Failed to send verification email to {}: {}", user.email, e);
            return Err(e);
        }

        tracing::info!("User {} signed up, verification pending", user.id);
        Ok(user)
    }

    /// Registers an admin account, created already `Verified`; no email is
    /// dispatched.
    pub async fn admin_sign_up(&self, request: SignupRequest) -> ServiceResult<User> {
        self.validate(&request)?;
        self.reject_taken_email(&request.email).await?;

        let password_hash = hash_password(&request.password)?;

        let user = self
            .store
            .create_verified(CreateVerifiedUser {
                email: request.email,
                name: request.name,
                password_hash,
                role: UserRole::Admin,
            })
            .await?;

        tracing::info!("Admin user {} created", user.id);
        Ok(user)
    }

    /// Confirms ownership of the email address with the submitted code.
    ///
    /// The stored code is compared exactly and cleared on success, so a
    /// replay of the same code fails with `AlreadyVerified`.
    pub async fn verify_email(&self, request: VerifyEmailRequest) -> ServiceResult<()> {
        self.validate(&request)?;

        let user = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", &request.email))?;

        if user.email_status == EmailStatus::Verified {
            return Err(ServiceError::AlreadyVerified);
        }

        if user.verification_code.as_deref() != Some(request.code.as_str()) {
            return Err(ServiceError::CodeMismatch);
        }

        self.store.set_verified(&user.id).await?;

        tracing::info!("User {} verified their email", user.id);
        Ok(())
    }

    /// Authenticates a user and issues the access/refresh token pair.
    ///
    /// An unknown email, an OAuth-only account and a wrong password all
    /// fail with the same `InvalidCredentials` to avoid account
    /// enumeration.
    pub async fn sign_in(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        self.validate(&request)?;

        let user = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        // The sentinel hash is not verifiable; check it first.
        if user.is_oauth_only() || !verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        if self.require_verified_login && user.email_status == EmailStatus::Pending {
            return Err(ServiceError::validation("Email has not been verified"));
        }

        tracing::info!("User {} signed in", user.id);
        self.issue_session(user)
    }

    /// Mints a new access token from a valid, unexpired refresh token.
    ///
    /// The refresh token itself is not rotated; it is reused until its own
    /// expiry.
    pub fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<RefreshTokenResponse> {
        let refresh_token = request
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::MissingToken)?;

        let claims = self.token_issuer.verify_refresh_token(refresh_token)?;
        let access_token = self.token_issuer.issue_access_token(&claims.sub)?;

        Ok(RefreshTokenResponse {
            authorization: format!("Bearer {access_token}"),
            expires_in: self.access_ttl_seconds,
        })
    }

    /// Ends the session; stateless, cannot fail.
    pub fn sign_out(&self) -> SessionCredentials {
        SessionCredentials::cleared()
    }

    /// Signs a user in through a third-party identity provider.
    ///
    /// The provider-asserted identity is upserted: created `Verified` with
    /// the sentinel password if absent, otherwise the display name is
    /// refreshed. Both session tokens are issued, same as direct sign-in.
    pub async fn oauth_sign_in(&self, provider: &str, code: &str) -> ServiceResult<LoginResponse> {
        let identity = self.broker.exchange_code_for_identity(provider, code).await?;

        let user = self
            .store
            .upsert_oauth(&identity.email, &identity.name)
            .await?;

        tracing::info!("User {} signed in via {}", user.id, provider);
        self.issue_session(user)
    }

    /// Loads the user record behind an authenticated request.
    pub async fn current_user(&self, user_id: &str) -> ServiceResult<UserInfo> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;
        Ok(UserInfo::from(user))
    }

    fn issue_session(&self, user: User) -> ServiceResult<LoginResponse> {
        let access_token = self.token_issuer.issue_access_token(&user.id)?;
        let refresh_token = self.token_issuer.issue_refresh_token(&user.id)?;

        Ok(LoginResponse {
            credentials: SessionCredentials::new(&access_token, refresh_token),
            user: UserInfo::from(user),
            expires_in: self.access_ttl_seconds,
        })
    }

    async fn reject_taken_email(&self, email: &str) -> ServiceResult<()> {
        // Fast pre-check; the store's unique constraint still decides races.
        if self.store.find_by_email(email).await?.is_some() {
            return Err(ServiceError::duplicate_email(email));
        }
        Ok(())
    }

    fn validate(&self, request: &impl Validate) -> ServiceResult<()> {
        if let Err(validation_errors) = request.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();

            return Err(ServiceError::validation(error_messages.join(", ")));
        }
        Ok(())
    }
}
