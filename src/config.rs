use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthConfig, GatewayError};

/// Prefix of the namespaced environment variables, e.g.
/// `LOGIN_GATEWAY_AUTH__GOOGLE__CLIENT_ID`.
pub const ENV_PREFIX: &str = "LOGIN_GATEWAY_";

/// Flat environment variables of older deployments and the keys they fill.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("LISTEN", "server.listen"),
    ("JWT_SIGNING_KEY", "auth.jwt_signing_key"),
    ("GOOGLE_CLIENT_ID", "auth.google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "auth.google.client_secret"),
    ("GOOGLE_HOSTED_DOMAIN", "auth.google.hosted_domain"),
    ("GOOGLE_REDIRECT_URL", "auth.google.redirect_url"),
];

/// Configuration for the login gateway server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address; a bare `:port` binds every interface
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upper bound for handling one request, login callback included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn server_addr(&self) -> String {
        if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen)
        } else {
            self.listen.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Layer the optional TOML file, the legacy variables and the namespaced
    /// variables (later wins), then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .merge(legacy_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| GatewayError::ConfigError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.server.listen.is_empty() {
            return Err(GatewayError::InvalidConfig {
                key: "server.listen".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.server.request_timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig {
                key: "server.request_timeout_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        self.auth.validate()
    }
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, target)| (*target).into())
    })
}

fn default_listen() -> String {
    ":8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
