//! Third-party identity provider bridge.
//!
//! Exchanges an OAuth authorization code for a verified email/name pair via
//! the provider's token and profile endpoints. Providers are pure
//! configuration; adding one requires no code change in the account
//! lifecycle service.

use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Identity asserted by a provider after a completed code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub email: String,
    pub name: String,
}

/// Collaborator interface for the OAuth code exchange.
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    /// Resolves an authorization code to the provider-verified identity.
    ///
    /// A failure in either network step propagates; a partial identity is
    /// never returned.
    async fn exchange_code_for_identity(
        &self,
        provider: &str,
        code: &str,
    ) -> ServiceResult<ProviderIdentity>;
}

/// Endpoints and credentials for one identity provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    /// JSON pointer to the email field in the profile document.
    pub email_path: String,
    /// JSON pointer to the display-name field in the profile document.
    pub name_path: String,
}

/// HTTP implementation of the provider bridge.
pub struct OAuthService {
    http_client: Client,
    providers: HashMap<String, ProviderConfig>,
}

impl OAuthService {
    /// Creates a new OAuthService over the configured provider registry.
    pub fn new(providers: HashMap<String, ProviderConfig>) -> ServiceResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::internal_error(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            providers,
        })
    }

    /// Builds the user-facing authorization redirect for a provider.
    pub fn authorize_url(&self, provider: &str) -> ServiceResult<String> {
        let config = self.provider_config(provider)?;
        let url = reqwest::Url::parse_with_params(
            &config.authorize_url,
            [
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| ServiceError::validation(format!("Invalid authorize URL: {e}")))?;

        Ok(url.to_string())
    }

    fn provider_config(&self, provider: &str) -> ServiceResult<&ProviderConfig> {
        self.providers
            .get(provider)
            .ok_or_else(|| ServiceError::not_found("OAuth provider", provider))
    }

    async fn fetch_access_token(&self, config: &ProviderConfig, code: &str) -> ServiceResult<String> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", config.client_id.clone()),
            ("redirect_uri", config.redirect_uri.clone()),
            ("code", code.to_string()),
        ];
        if let Some(secret) = &config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let response = self
            .http_client
            .post(&config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ServiceError::upstream(format!("Token exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::upstream(format!(
                "Token endpoint returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::upstream(format!("Invalid token response: {e}")))?;

        body.get("access_token")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::upstream("Token response missing access_token"))
    }

    async fn fetch_profile(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> ServiceResult<serde_json::Value> {
        let response = self
            .http_client
            .get(&config.profile_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ServiceError::upstream(format!("Profile fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::upstream(format!(
                "Profile endpoint returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::upstream(format!("Invalid profile response: {e}")))
    }

    fn extract_field<'a>(profile: &'a serde_json::Value, pointer: &str) -> Option<&'a str> {
        profile.pointer(pointer).and_then(|v| v.as_str())
    }
}

#[async_trait]
impl IdentityBroker for OAuthService {
    async fn exchange_code_for_identity(
        &self,
        provider: &str,
        code: &str,
    ) -> ServiceResult<ProviderIdentity> {
        let config = self.provider_config(provider)?;

        let access_token = self.fetch_access_token(config, code).await?;
        let profile = self.fetch_profile(config, &access_token).await?;

        let email = Self::extract_field(&profile, &config.email_path)
            .ok_or_else(|| ServiceError::upstream("Profile response missing email"))?;
        let name = Self::extract_field(&profile, &config.name_path)
            .ok_or_else(|| ServiceError::upstream("Profile response missing name"))?;

        Ok(ProviderIdentity {
            email: email.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HashMap<String, ProviderConfig> {
        let mut providers = HashMap::new();
        providers.insert(
            "kakao".to_string(),
            ProviderConfig {
                authorize_url: format!("{}/oauth/authorize", server.uri()),
                token_url: format!("{}/oauth/token", server.uri()),
                profile_url: format!("{}/v2/user/me", server.uri()),
                client_id: "client-id".to_string(),
                client_secret: Some("client-secret".to_string()),
                redirect_uri: "http://localhost:3000/auth/oauth/kakao/callback".to_string(),
                email_path: "/kakao_account/email".to_string(),
                name_path: "/kakao_account/profile/nickname".to_string(),
            },
        );
        providers
    }

    #[tokio::test]
    async fn exchanges_code_for_identity() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "provider-token" })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/user/me"))
            .and(header("Authorization", "Bearer provider-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kakao_account": {
                    "email": "ann@example.com",
                    "profile": { "nickname": "Ann" }
                }
            })))
            .mount(&server)
            .await;

        let service = OAuthService::new(provider_for(&server)).unwrap();
        let identity = service
            .exchange_code_for_identity("kakao", "auth-code")
            .await
            .expect("exchange should succeed");

        assert_eq!(
            identity,
            ProviderIdentity {
                email: "ann@example.com".to_string(),
                name: "Ann".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn token_endpoint_failure_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = OAuthService::new(provider_for(&server)).unwrap();
        let err = service
            .exchange_code_for_identity("kakao", "auth-code")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Upstream { .. }));
    }

    #[tokio::test]
    async fn profile_without_email_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "provider-token" })),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kakao_account": { "profile": { "nickname": "Ann" } }
            })))
            .mount(&server)
            .await;

        let service = OAuthService::new(provider_for(&server)).unwrap();
        let err = service
            .exchange_code_for_identity("kakao", "auth-code")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Upstream { .. }));
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let service = OAuthService::new(HashMap::new()).unwrap();
        let err = service
            .exchange_code_for_identity("google", "auth-code")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn authorize_url_carries_client_parameters() {
        let providers = {
            let mut providers = HashMap::new();
            providers.insert(
                "kakao".to_string(),
                ProviderConfig {
                    authorize_url: "https://kauth.kakao.com/oauth/authorize".to_string(),
                    token_url: "https://kauth.kakao.com/oauth/token".to_string(),
                    profile_url: "https://kapi.kakao.com/v2/user/me".to_string(),
                    client_id: "client-id".to_string(),
                    client_secret: None,
                    redirect_uri: "http://localhost:3000/cb".to_string(),
                    email_path: "/kakao_account/email".to_string(),
                    name_path: "/kakao_account/profile/nickname".to_string(),
                },
            );
            providers
        };

        let service = OAuthService::new(providers).unwrap();
        let url = service.authorize_url("kakao").unwrap();
        assert!(url.starts_with("https://kauth.kakao.com/oauth/authorize?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("response_type=code"));
    }
}
