use persistence::appwrite::AppwriteSettings;
use persistence::db::{Collections, StoreBackend, StoreConfig};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub store: StoreSection,
    pub appwrite: AppwriteConfig,
    #[serde(default)]
    pub collections: CollectionsConfig,
    pub claims: ClaimsConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Receipts travel inline, so bodies are larger than plain JSON calls.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Claim exchanges per client per minute; 0 disables the limit.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Key the limit on `X-Forwarded-For`/`X-Real-IP` instead of the socket
    /// peer. Only enable behind a proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// `appwrite` or `memory`
    #[serde(default = "default_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteConfig {
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub database_id: String,

    #[serde(default = "default_bucket_id")]
    pub bucket_id: String,

    #[serde(default = "default_appwrite_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_members_collection")]
    pub members: String,

    #[serde(default = "default_logs_collection")]
    pub logs: String,

    #[serde(default = "default_global_config_collection")]
    pub global_config: String,

    #[serde(default = "default_claims_collection")]
    pub claims: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            members: default_members_collection(),
            logs: default_logs_collection(),
            global_config: default_global_config_collection(),
            claims: default_claims_collection(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimsConfig {
    #[serde(default = "default_claim_ttl")]
    pub ttl_secs: i64,

    /// Base URL of the web app the QR code opens.
    #[serde(default)]
    pub app_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// `appwrite` or `local`
    #[serde(default = "default_identity_provider")]
    pub provider: String,

    /// HS256 secret for the local provider.
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: i64,

    /// Label marking admins.
    #[serde(default = "default_admin_label")]
    pub admin_label: String,

    /// Users granted the admin label by the local provider.
    #[serde(default)]
    pub admin_uids: Vec<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    10_485_760
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    30
}
fn default_backend() -> String {
    "appwrite".to_string()
}
fn default_bucket_id() -> String {
    "receipts".to_string()
}
fn default_appwrite_timeout() -> u64 {
    15
}
fn default_members_collection() -> String {
    "members".to_string()
}
fn default_logs_collection() -> String {
    "logs".to_string()
}
fn default_global_config_collection() -> String {
    "global_config".to_string()
}
fn default_claims_collection() -> String {
    "claims".to_string()
}
fn default_claim_ttl() -> i64 {
    domain::models::CLAIM_TTL_SECS
}
fn default_identity_provider() -> String {
    "appwrite".to_string()
}
fn default_jwt_expiry() -> i64 {
    900 // 15 minutes, same lifetime as provider-minted JWTs
}
fn default_admin_label() -> String {
    "admin".to_string()
}

/// Which identity provider resolves sessions and mints JWTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityProvider {
    Appwrite,
    Local,
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with CT__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("CT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("identity.admin_uids")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 10485760

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 0
            trust_proxy_headers = false

            [store]
            backend = "memory"

            [appwrite]
            endpoint = ""
            project_id = ""
            api_key = ""
            database_id = ""
            bucket_id = "receipts"

            [claims]
            ttl_secs = 300
            app_base_url = "https://coffee.example.com"

            [identity]
            provider = "local"
            jwt_secret = "test-secret-key-for-jwt-signing-32chars"
            jwt_expiry_secs = 900
            admin_label = "admin"
            admin_uids = ["admin-uid"]
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        let backend = self.store_backend()?;
        let provider = self.identity_provider()?;

        if backend == StoreBackend::Appwrite || provider == IdentityProvider::Appwrite {
            for (value, name) in [
                (&self.appwrite.endpoint, "CT__APPWRITE__ENDPOINT"),
                (&self.appwrite.project_id, "CT__APPWRITE__PROJECT_ID"),
                (&self.appwrite.api_key, "CT__APPWRITE__API_KEY"),
            ] {
                if value.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(format!(
                        "{} environment variable must be set",
                        name
                    )));
                }
            }
        }

        if backend == StoreBackend::Appwrite && self.appwrite.database_id.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CT__APPWRITE__DATABASE_ID environment variable must be set".to_string(),
            ));
        }

        if provider == IdentityProvider::Local
            && self.identity.jwt_secret.len() < shared::jwt::MIN_SECRET_LEN
        {
            return Err(ConfigValidationError::InvalidValue(format!(
                "identity.jwt_secret must be at least {} bytes",
                shared::jwt::MIN_SECRET_LEN
            )));
        }

        if self.claims.ttl_secs <= 0 {
            return Err(ConfigValidationError::InvalidValue(
                "claims.ttl_secs must be positive".to_string(),
            ));
        }

        if self.claims.app_base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CT__CLAIMS__APP_BASE_URL environment variable must be set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn store_backend(&self) -> Result<StoreBackend, ConfigValidationError> {
        self.store
            .backend
            .parse()
            .map_err(ConfigValidationError::InvalidValue)
    }

    pub fn identity_provider(&self) -> Result<IdentityProvider, ConfigValidationError> {
        match self.identity.provider.to_ascii_lowercase().as_str() {
            "appwrite" => Ok(IdentityProvider::Appwrite),
            "local" => Ok(IdentityProvider::Local),
            other => Err(ConfigValidationError::InvalidValue(format!(
                "unknown identity provider: {}",
                other
            ))),
        }
    }

    pub fn appwrite_settings(&self) -> AppwriteSettings {
        AppwriteSettings {
            endpoint: self.appwrite.endpoint.clone(),
            project_id: self.appwrite.project_id.clone(),
            api_key: self.appwrite.api_key.clone(),
            timeout_secs: self.appwrite.timeout_secs,
        }
    }

    pub fn store_config(&self) -> Result<StoreConfig, ConfigValidationError> {
        Ok(StoreConfig {
            backend: self.store_backend()?,
            appwrite: self.appwrite_settings(),
            database_id: self.appwrite.database_id.clone(),
            bucket_id: self.appwrite.bucket_id.clone(),
        })
    }

    pub fn collections(&self) -> Collections {
        Collections {
            members: self.collections.members.clone(),
            logs: self.collections.logs.clone(),
            global_config: self.collections.global_config.clone(),
            claims: self.collections.claims.clone(),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.collections.members, "members");
        assert_eq!(config.collections.global_config, "global_config");
        assert_eq!(config.claims.ttl_secs, 300);
        assert_eq!(config.store_backend().unwrap(), StoreBackend::Memory);
        assert_eq!(config.identity_provider().unwrap(), IdentityProvider::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::load_for_test(&[
            ("server.port", "9000"),
            ("collections.claims", "claim_tokens"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.collections().claims, "claim_tokens");
    }

    #[test]
    fn test_validation_appwrite_requires_credentials() {
        let config = Config::load_for_test(&[("store.backend", "appwrite")])
            .expect("Failed to load config");
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("CT__APPWRITE__ENDPOINT"));
    }

    #[test]
    fn test_validation_short_local_secret() {
        let config = Config::load_for_test(&[("identity.jwt_secret", "short")])
            .expect("Failed to load config");
        assert!(config.validate().unwrap_err().to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_validation_unknown_backend() {
        let config = Config::load_for_test(&[("store.backend", "postgres")])
            .expect("Failed to load config");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::load_for_test(&[("server.host", "127.0.0.1"), ("server.port", "3000")])
            .expect("Failed to load config");

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }
}
