/// OAuth2 flow state
///
/// The state parameter round-trips through the identity provider. It binds a
/// login attempt to a random nonce and remembers the URL the user asked for.
/// There is no server-side record; signature and expiry are all it has.
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::error::TokenError;
use super::token::{SignedClaims, TokenCodec, TokenCodecExt};

/// Lifetime of a flow-state token in minutes.
pub const STATE_LIFETIME_MINUTES: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateToken {
    /// URL to return to once the login completes
    pub origin: String,

    #[serde(flatten)]
    pub claims: SignedClaims,

    #[serde(skip)]
    token: String,
}

impl StateToken {
    pub fn nonce(&self) -> &str {
        &self.claims.subject
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Display for StateToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}

/// Generates and decodes flow-state tokens.
///
/// Decode errors keep the codec category so callers can tell an expired flow
/// apart from a forged or garbled one.
pub trait StateGenerator: Send + Sync {
    fn generate(&self, origin_url: &str) -> Result<StateToken, TokenError>;

    fn decode(&self, token: &str) -> Result<StateToken, TokenError>;
}

pub struct JwtStateGenerator {
    codec: Arc<dyn TokenCodec>,
}

impl JwtStateGenerator {
    pub fn new(codec: Arc<dyn TokenCodec>) -> Self {
        Self { codec }
    }
}

impl StateGenerator for JwtStateGenerator {
    fn generate(&self, origin_url: &str) -> Result<StateToken, TokenError> {
        let mut state = StateToken {
            origin: origin_url.to_string(),
            claims: SignedClaims::issue(
                Uuid::new_v4().to_string(),
                Duration::minutes(STATE_LIFETIME_MINUTES),
            ),
            token: String::new(),
        };
        state.token = self.codec.encode_claims(&state)?;
        Ok(state)
    }

    fn decode(&self, token: &str) -> Result<StateToken, TokenError> {
        let mut state: StateToken = self.codec.decode_claims(token)?;
        state.token = token.to_string();
        Ok(state)
    }
}
