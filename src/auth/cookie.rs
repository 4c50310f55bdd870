/// Session Cookie Generator
///
/// Issues and validates the long-lived token that marks a browser as
/// authenticated. Nothing is stored server side; the token expires on its own.
use axum::http::HeaderName;
use axum_extra::extract::cookie::Cookie;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

use super::error::{GatewayError, TokenError};
use super::token::{SignedClaims, TokenCodec, TokenCodecExt};

/// Name shared by the session cookie and the identity header forwarded
/// downstream. Both uses read this one constant so the reuse stays visible.
pub const GATEWAY_USER: &str = "X-Gateway-User";

/// Cookie carrying the signed session token.
pub const LOGIN_COOKIE_NAME: &str = GATEWAY_USER;

/// Request header carrying the authenticated subject to downstream handlers.
pub static LOGIN_HEADER_NAME: LazyLock<HeaderName> = LazyLock::new(|| {
    HeaderName::from_bytes(GATEWAY_USER.as_bytes()).expect("GATEWAY_USER is a valid header name")
});

/// Lifetime of a session token in hours.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Decoded or freshly issued session token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(flatten)]
    pub claims: SignedClaims,

    /// Unique token identifier
    #[serde(rename = "jti")]
    pub token_id: String,

    #[serde(skip)]
    token: String,
}

impl SessionToken {
    /// The authenticated subject (email).
    pub fn subject(&self) -> &str {
        &self.claims.subject
    }

    /// The signed token string; empty until signed.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Cookie descriptor for attaching the token to a response.
    pub fn http_cookie(&self) -> Cookie<'static> {
        Cookie::build((LOGIN_COOKIE_NAME, self.token.clone()))
            .path("/")
            .build()
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}

/// Generates and decodes session tokens.
pub trait CookieGenerator: Send + Sync {
    fn generate(&self, user: &str) -> Result<SessionToken, GatewayError>;

    /// Any codec failure is collapsed into [`GatewayError::InvalidSession`].
    fn decode(&self, token: &str) -> Result<SessionToken, GatewayError>;
}

/// [`CookieGenerator`] signing through a shared [`TokenCodec`].
pub struct JwtCookieGenerator {
    codec: Arc<dyn TokenCodec>,
}

impl JwtCookieGenerator {
    pub fn new(codec: Arc<dyn TokenCodec>) -> Self {
        Self { codec }
    }

    fn sign(&self, mut session: SessionToken) -> Result<SessionToken, TokenError> {
        session.token = self.codec.encode_claims(&session)?;
        Ok(session)
    }
}

impl CookieGenerator for JwtCookieGenerator {
    fn generate(&self, user: &str) -> Result<SessionToken, GatewayError> {
        let session = SessionToken {
            claims: SignedClaims::issue(user, Duration::hours(SESSION_LIFETIME_HOURS)),
            token_id: Uuid::new_v4().to_string(),
            token: String::new(),
        };

        Ok(self.sign(session)?)
    }

    fn decode(&self, token: &str) -> Result<SessionToken, GatewayError> {
        let mut session: SessionToken = self
            .codec
            .decode_claims(token)
            .map_err(GatewayError::InvalidSession)?;
        session.token = token.to_string();
        Ok(session)
    }
}
