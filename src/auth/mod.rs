// Authentication Module
// Stateless login gate: signed session cookies, signed flow state and the
// OAuth2 identity provider client

pub mod config;
pub mod cookie;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod routes;
pub mod state;
pub mod token;

use std::sync::Arc;

pub use config::{AuthConfig, CookieConfig, GoogleConfig, SameSitePolicy};
pub use cookie::{
    CookieGenerator, GATEWAY_USER, JwtCookieGenerator, LOGIN_COOKIE_NAME, LOGIN_HEADER_NAME,
    SessionToken,
};
pub use error::{GatewayError, TokenError};
pub use middleware::{LoginGate, login_gate};
pub use providers::{AuthorizationCode, GoogleProvider, IdentityProvider, UserIdentity};
pub use routes::{CallbackParams, callback_handler};
pub use state::{JwtStateGenerator, StateGenerator, StateToken};
pub use token::{JwtCodec, SignedClaims, TokenCodec, TokenCodecExt};

impl LoginGate {
    /// Wire a gate from validated configuration, talking to Google.
    pub fn from_config(config: &AuthConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let codec: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(config.signing_key_bytes()));
        let provider = GoogleProvider::new(&config.google)?;

        Ok(LoginGate::new(
            Arc::new(JwtCookieGenerator::new(Arc::clone(&codec))),
            Arc::new(JwtStateGenerator::new(codec)),
            Arc::new(provider),
            config.callback_path()?,
        )
        .with_cookie_config(config.cookie.clone())
        .with_restart_expired_flow(config.restart_expired_flow))
    }
}
