//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle endpoints like sign-up, email verification, sign-in,
//! token refreshing and the OAuth callback. These are designed to be
//! integrated into the main Axum router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/admin/sign-up", post(admin_sign_up))
        .route("/sign-up/verify", post(verify_email))
        .route("/sign-in", post(sign_in))
        .route("/refresh", post(refresh_token))
        .route("/sign-out", post(sign_out))
        .route("/me", get(me).layer(middleware::from_fn(jwt_auth)))
        .route("/oauth/{provider}", get(oauth_authorize))
        .route("/oauth/{provider}/callback", get(oauth_callback))
}
