/// Google OAuth2 Provider Implementation
///
/// Authorization-code flow against Google with the v2 userinfo endpoint.
/// Supports restricting logins to one G Suite hosted domain.
use super::{AuthorizationCode, IdentityProvider, UserIdentity};
use crate::auth::config::GoogleConfig;
use crate::auth::error::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Prefix some deployments leave in front of the client id.
const CLIENT_ID_PREFIX: &str = "client_id: ";

/// Google OAuth2 token request
#[derive(Debug, Serialize)]
struct GoogleTokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

/// Google OAuth2 token response
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

/// Google OAuth2 Provider
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    scopes: Vec<String>,
    hosted_domain: Option<String>,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
    http_client: reqwest::Client,
}

impl GoogleProvider {
    /// Create a new Google OAuth2 provider
    pub fn new(config: &GoogleConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client_id: config.client_id.replace(CLIENT_ID_PREFIX, ""),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
            scopes: config.scopes.clone(),
            hosted_domain: config.hosted_domain.clone().filter(|hd| !hd.is_empty()),
            auth_url: parse_endpoint("auth_url", config.auth_url.as_deref(), GOOGLE_AUTH_URL)?,
            token_url: parse_endpoint("token_url", config.token_url.as_deref(), GOOGLE_TOKEN_URL)?,
            userinfo_url: parse_endpoint(
                "userinfo_url",
                config.userinfo_url.as_deref(),
                GOOGLE_USERINFO_URL,
            )?,
            http_client,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn check_hosted_domain(&self, identity: &UserIdentity) -> Result<(), GatewayError> {
        match &self.hosted_domain {
            Some(expected) if !identity.hosted_domain.eq_ignore_ascii_case(expected) => {
                warn!(
                    "Rejecting {} from hosted domain {:?}",
                    identity.email, identity.hosted_domain
                );
                Err(GatewayError::DomainNotAllowed {
                    domain: Some(identity.hosted_domain.clone()).filter(|hd| !hd.is_empty()),
                })
            }
            _ => Ok(()),
        }
    }
}

fn parse_endpoint(key: &str, custom: Option<&str>, default: &str) -> Result<Url, GatewayError> {
    Url::parse(custom.unwrap_or(default)).map_err(|e| GatewayError::InvalidConfig {
        key: format!("google.{}", key),
        reason: e.to_string(),
    })
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("hd", self.hosted_domain.as_deref().unwrap_or_default());
        url.to_string()
    }

    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<String, GatewayError> {
        let token_request = GoogleTokenRequest {
            code: code.as_str(),
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_url,
            grant_type: "authorization_code",
        };

        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&token_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::ExchangeFailed(format!("Token request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::ExchangeFailed(format!(
                "Token request failed with status {}: {}",
                status, error_text
            )));
        }

        let token_response: GoogleTokenResponse = response.json().await.map_err(|e| {
            GatewayError::ExchangeFailed(format!("Failed to parse token response: {}", e))
        })?;

        debug!("Exchanged authorization code with {}", self.name());
        Ok(token_response.access_token)
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<UserIdentity, GatewayError> {
        let response = self
            .http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::IdentityFetchFailed(format!(
                "UserInfo request failed with status {}: {}",
                status, error_text
            )));
        }

        let body = response.bytes().await?;
        let identity: UserIdentity = serde_json::from_slice(&body).map_err(|e| {
            GatewayError::IdentityDecodeFailed(format!("Failed to parse userinfo: {}", e))
        })?;

        if identity.email.is_empty() {
            return Err(GatewayError::IdentityDecodeFailed(
                "userinfo response carries no email".to_string(),
            ));
        }

        self.check_hosted_domain(&identity)?;
        Ok(identity)
    }
}
