//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token secrets, SMTP credentials, and the
//! registered OAuth providers.

use crate::services::oauth_service::ProviderConfig;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_hours: i64,
    pub refresh_token_ttl_days: i64,
    pub require_verified_login: bool,
    pub server_port: u16,
}

/// SMTP settings for the verification mailer.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET not set")?;

        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET not set")?;

        let access_token_ttl_hours = env::var("ACCESS_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse::<i64>()
            .context("ACCESS_TOKEN_TTL_HOURS must be a valid number")?;

        let refresh_token_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()
            .context("REFRESH_TOKEN_TTL_DAYS must be a valid number")?;

        let require_verified_login = env::var("REQUIRE_VERIFIED_LOGIN")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .context("REQUIRE_VERIFIED_LOGIN must be true or false")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_hours,
            refresh_token_ttl_days,
            require_verified_login,
            server_port,
        })
    }

    /// Loads SMTP settings for the verification mailer.
    pub fn email_config(&self) -> Result<EmailConfig> {
        let smtp_host = env::var("SMTP_HOST").context("SMTP_HOST not set")?;

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        let smtp_username = env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?;
        let smtp_password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?;
        let from_name = env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Resumely".to_string());
        let from_email = env::var("EMAIL_FROM_ADDRESS").context("EMAIL_FROM_ADDRESS not set")?;

        Ok(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_name,
            from_email,
        })
    }

    /// Builds the OAuth provider registry from environment variables.
    ///
    /// `OAUTH_PROVIDERS` holds a comma-separated list of provider keys; each
    /// key `k` is configured through `OAUTH_<K>_AUTHORIZE_URL`, `_TOKEN_URL`,
    /// `_PROFILE_URL`, `_CLIENT_ID`, `_CLIENT_SECRET` (optional),
    /// `_REDIRECT_URI`, `_EMAIL_PATH` and `_NAME_PATH`. Adding a provider is
    /// purely a configuration change.
    pub fn oauth_providers(&self) -> Result<HashMap<String, ProviderConfig>> {
        let mut providers = HashMap::new();

        let keys = env::var("OAUTH_PROVIDERS").unwrap_or_default();
        for key in keys.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            let prefix = format!("OAUTH_{}", key.to_uppercase());
            let var = |suffix: &str| {
                let name = format!("{prefix}_{suffix}");
                env::var(&name).context(format!("{name} not set"))
            };

            let provider = ProviderConfig {
                authorize_url: var("AUTHORIZE_URL")?,
                token_url: var("TOKEN_URL")?,
                profile_url: var("PROFILE_URL")?,
                client_id: var("CLIENT_ID")?,
                client_secret: env::var(format!("{prefix}_CLIENT_SECRET")).ok(),
                redirect_uri: var("REDIRECT_URI")?,
                email_path: var("EMAIL_PATH")?,
                name_path: var("NAME_PATH")?,
            };
            providers.insert(key.to_string(), provider);
        }

        Ok(providers)
    }
}
