/// Identity provider clients
///
/// This module provides the `IdentityProvider` trait the login gate talks to
/// and its Google implementation.
use crate::auth::error::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod google;

pub use google::GoogleProvider;

/// Single-use authorization code handed back by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorizationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Verified user identity returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable provider-side identifier
    pub id: String,

    pub email: String,

    #[serde(rename = "verified_email", default)]
    pub email_verified: bool,

    /// URL to the user's profile picture
    #[serde(default)]
    pub picture: String,

    /// Hosted (organisation) domain of the account
    #[serde(rename = "hd", default)]
    pub hosted_domain: String,
}

/// OAuth2 authorization-code client.
///
/// `authorization_url` is pure; the two async calls run sequentially inside
/// `exchange_and_fetch_identity`. Dropping the returned future aborts the
/// outstanding request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name for logs (e.g., "google")
    fn name(&self) -> &'static str;

    /// Authorization endpoint URL embedding the opaque `state` value.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange the authorization code for an access token
    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<String, GatewayError>;

    /// Fetch the identity belonging to `access_token`
    async fn fetch_identity(&self, access_token: &str) -> Result<UserIdentity, GatewayError>;

    async fn exchange_and_fetch_identity(
        &self,
        code: &AuthorizationCode,
    ) -> Result<UserIdentity, GatewayError> {
        let access_token = self.exchange_code(code).await?;
        self.fetch_identity(&access_token).await
    }
}
