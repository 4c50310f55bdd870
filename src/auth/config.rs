// Authentication Configuration
// Signing key, callback routing, cookie attributes and Google credentials

use axum_extra::extract::cookie::SameSite;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric key signing session and state tokens (minimum 32 bytes)
    pub jwt_signing_key: String,

    /// Cookie attributes
    #[serde(default)]
    pub cookie: CookieConfig,

    /// Answer an expired login flow by starting a fresh one instead of an error
    #[serde(default = "default_true")]
    pub restart_expired_flow: bool,

    /// Google OAuth2 client
    pub google: GoogleConfig,
}

impl AuthConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.jwt_signing_key.len() < 32 {
            return Err(GatewayError::InvalidConfig {
                key: "jwt_signing_key".to_string(),
                reason: "must be at least 32 bytes".to_string(),
            });
        }

        self.google.validate()?;
        self.callback_path()?;

        Ok(())
    }

    /// Path component of the registered redirect URL; the gate intercepts it.
    pub fn callback_path(&self) -> Result<String, GatewayError> {
        let url = url::Url::parse(&self.google.redirect_url).map_err(|e| {
            GatewayError::InvalidConfig {
                key: "google.redirect_url".to_string(),
                reason: e.to_string(),
            }
        })?;

        match url.path() {
            "" | "/" => Err(GatewayError::InvalidConfig {
                key: "google.redirect_url".to_string(),
                reason: "must have a callback path".to_string(),
            }),
            path => Ok(path.to_string()),
        }
    }

    pub fn signing_key_bytes(&self) -> &[u8] {
        self.jwt_signing_key.as_bytes()
    }
}

/// Cookie configuration for the session cookie.
///
/// Name and path are fixed; only the security attributes are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie domain (None = current domain)
    #[serde(default)]
    pub domain: Option<String>,

    /// Secure flag (HTTPS only) - should be true in production
    #[serde(default)]
    pub secure: bool,

    /// HttpOnly flag (prevent JavaScript access)
    #[serde(default = "default_true")]
    pub http_only: bool,

    #[serde(default = "default_same_site")]
    pub same_site: SameSitePolicy,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: None,
            secure: false, // Development default
            http_only: true,
            same_site: SameSitePolicy::Lax,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

/// Google OAuth2 client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,

    pub client_secret: String,

    /// Redirect URL registered with Google; its path is the callback path
    pub redirect_url: String,

    /// Restrict logins to one G Suite domain
    #[serde(default)]
    pub hosted_domain: Option<String>,

    #[serde(default = "default_google_scopes")]
    pub scopes: Vec<String>,

    /// Endpoint overrides, used by tests
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub userinfo_url: Option<String>,

    /// Timeout for each outbound request in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl GoogleConfig {
    fn validate(&self) -> Result<(), GatewayError> {
        if self.client_id.is_empty() {
            return Err(GatewayError::InvalidConfig {
                key: "google.client_id".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.client_secret.is_empty() {
            return Err(GatewayError::InvalidConfig {
                key: "google.client_secret".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if !self.redirect_url.starts_with("http://") && !self.redirect_url.starts_with("https://")
        {
            return Err(GatewayError::InvalidConfig {
                key: "google.redirect_url".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig {
                key: "google.timeout_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: String::new(),
            hosted_domain: None,
            scopes: default_google_scopes(),
            auth_url: None,
            token_url: None,
            userinfo_url: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_same_site() -> SameSitePolicy {
    SameSitePolicy::Lax
}

fn default_google_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/userinfo.profile".to_string(),
        "https://www.googleapis.com/auth/userinfo.email".to_string(),
    ]
}

fn default_provider_timeout() -> u64 {
    10
}
