//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with HALLWAYS_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets (identity token secret, webhook secret, database URL) belong in
//! environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Hallways".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Community access configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CommunityConfig {
    /// Comma-separated email domains that mark an identity as belonging to
    /// the school. Controls the STUDENT-vs-VISITOR default role at first sync
    /// and the school-email access check. The bare SCHOOL_EMAIL_DOMAINS env
    /// var is also honored, taking precedence.
    pub school_email_domains: String,
}

/// Authentication boundary configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret for verifying identity-provider session tokens
    /// (env var HALLWAYS_AUTH__JWT_SECRET).
    pub jwt_secret: String,
    /// Shared secret expected in X-Webhook-Secret on identity sync calls
    /// (env var HALLWAYS_AUTH__WEBHOOK_SECRET).
    pub webhook_secret: String,
}

/// Content limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Default page size for list endpoints
    pub page_size: u64,
    /// Hard ceiling on requested page size
    pub max_page_size: u64,
    /// Maximum post/comment body length
    pub max_content_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_page_size: 100,
            max_content_length: 50000,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub community: CommunityConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables (HALLWAYS_ prefix, double
            // underscore between section and key)
            // e.g., HALLWAYS_AUTH__JWT_SECRET, HALLWAYS_SITE__NAME
            .add_source(
                Environment::with_prefix("HALLWAYS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Initialize application configuration
///
/// Triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = APP_CONFIG.read().unwrap();
    log::info!("Configuration loaded: site.name = {}", config.site.name);
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// The school email domain allow-list, trimmed, with empty entries dropped.
///
/// SCHOOL_EMAIL_DOMAINS in the environment overrides the config file, matching
/// how the identity sync is deployed.
pub fn school_email_domains() -> Vec<String> {
    let raw = std::env::var("SCHOOL_EMAIL_DOMAINS")
        .unwrap_or_else(|_| get_config().community.school_email_domains);

    raw.split(',')
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Get auth configuration
pub fn auth() -> AuthConfig {
    get_config().auth
}

/// Get limits configuration
pub fn limits() -> LimitsConfig {
    get_config().limits
}
