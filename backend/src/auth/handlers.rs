//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for account registration,
//! email verification, sign-in, token refresh, sign-out and the OAuth
//! callback, parse request data, and interact with the account lifecycle
//! service for core business logic.

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::*;
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::oauth_service::OAuthService;
use crate::utils::jwt::Claims;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::{Json as ResponseJson, Redirect},
};
use sqlx::SqlitePool;

/// Handle direct sign-up request
#[axum::debug_handler]
pub async fn sign_up(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<serde_json::Value>>), (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.sign_up(payload).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(
                serde_json::json!({ "email": user.email }),
                "Sign-up complete. Check your email for the verification code.",
            )),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle admin sign-up request
#[axum::debug_handler]
pub async fn admin_sign_up(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<serde_json::Value>>), (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.admin_sign_up(payload).await {
        Ok(user) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(
                serde_json::json!({ "email": user.email }),
                "Admin sign-up complete.",
            )),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle email verification request
#[axum::debug_handler]
pub async fn verify_email(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<ResponseJson<ApiResponse<serde_json::Value>>, (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.verify_email(payload).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            serde_json::json!({}),
            "Email verified. You can now sign in.",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user sign-in request
#[axum::debug_handler]
pub async fn sign_in(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<LoginResponse>, (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.sign_in(payload).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<ResponseJson<RefreshTokenResponse>, (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.refresh(payload) {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle sign-out request
///
/// Stateless and cannot fail: returns the cleared credential pair for the
/// web layer to store over the session cookies.
#[axum::debug_handler]
pub async fn sign_out() -> ResponseJson<SessionCredentials> {
    ResponseJson(SessionCredentials::cleared())
}

/// Redirect the user agent to the provider's authorization page
#[axum::debug_handler]
pub async fn oauth_authorize(
    Path(provider): Path<String>,
) -> Result<Redirect, (StatusCode, String)> {
    let oauth_service = match oauth_service_from_env() {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match oauth_service.authorize_url(&provider) {
        Ok(url) => Ok(Redirect::temporary(&url)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle the provider redirect carrying the authorization code
#[axum::debug_handler]
pub async fn oauth_callback(
    Extension(pool): Extension<SqlitePool>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<ResponseJson<LoginResponse>, (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.oauth_sign_in(&provider, &query.code).await {
        Ok(response) => Ok(ResponseJson(response)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Get current user information from token
#[axum::debug_handler]
pub async fn me(
    Extension(pool): Extension<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<ResponseJson<UserInfo>, (StatusCode, String)> {
    let service = match AccountService::from_pool(&pool) {
        Ok(service) => service,
        Err(error) => return Err(service_error_to_http(error)),
    };

    match service.current_user(&claims.sub).await {
        Ok(user) => Ok(ResponseJson(user)),
        Err(error) => Err(service_error_to_http(error)),
    }
}

fn oauth_service_from_env() -> crate::errors::ServiceResult<OAuthService> {
    let config = Config::from_env().map_err(|e| {
        crate::errors::ServiceError::internal_error(format!("Config error: {e}"))
    })?;
    let providers = config.oauth_providers().map_err(|e| {
        crate::errors::ServiceError::internal_error(format!("Config error: {e}"))
    })?;
    OAuthService::new(providers)
}
