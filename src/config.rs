//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;

use crate::format::{Currency, FormatContext, Locale};

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Backend project URL, e.g. `https://xyz.supabase.co`
    pub supabase_url: String,
    /// Public anon key sent as `apikey` on every backend request
    pub supabase_anon_key: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Locale used when a request names none
    pub default_locale: Locale,
    /// Display currency
    pub default_currency: Currency,

    // --- Secrets ---
    /// HS256 secret the backend signs session tokens with (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Shared secret for database webhook signatures (raw bytes)
    pub webhook_secret: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let default_locale = match env::var("DEFAULT_LOCALE") {
            Ok(tag) => Locale::from_tag(&tag).ok_or(ConfigError::Invalid("DEFAULT_LOCALE"))?,
            Err(_) => Locale::default(),
        };
        let default_currency = match env::var("DEFAULT_CURRENCY") {
            Ok(code) => {
                Currency::from_code(&code).ok_or(ConfigError::Invalid("DEFAULT_CURRENCY"))?
            }
            Err(_) => default_locale.default_currency(),
        };

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            default_locale,
            default_currency,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            webhook_secret: env::var("WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WEBHOOK_SECRET"))?
                .into_bytes(),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            frontend_url: "http://localhost:8081".to_string(),
            port: 8080,
            default_locale: Locale::En,
            default_currency: Currency::Usd,
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            webhook_secret: b"test_webhook_secret".to_vec(),
        }
    }

    /// Formatting context for a request, falling back to the configured locale.
    ///
    /// The configured currency only applies to the configured locale; other
    /// locales use their own default.
    pub fn format_context(&self, locale: Option<Locale>) -> FormatContext {
        match locale {
            Some(locale) if locale != self.default_locale => FormatContext::for_locale(locale),
            _ => FormatContext::new(self.default_locale, self.default_currency),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
