// Authentication Error Types
// Token codec categories and login flow failures

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure categories of the signed-claim token codec.
///
/// The messages carried by `Malformed` and `Encoding` are meant for logs only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature verification failed")]
    SignatureMismatch,

    #[error("Token expired")]
    Expired,

    #[error("Token not yet valid")]
    NotYetValid,

    #[error("Token subject is empty")]
    EmptySubject,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl TokenError {
    /// True for failures caused only by the validity window.
    pub fn is_expiry(&self) -> bool {
        matches!(self, TokenError::Expired | TokenError::NotYetValid)
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::SignatureMismatch
            }
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => TokenError::EmptySubject,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Errors of the login flow.
#[derive(Debug, Error)]
pub enum GatewayError {
    // Token errors
    #[error("Invalid session cookie")]
    InvalidSession(#[source] TokenError),

    #[error("Login flow expired")]
    FlowExpired,

    #[error("Invalid OAuth2 state parameter")]
    InvalidState(#[source] TokenError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    // Callback errors
    #[error("Missing callback parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Identity provider denied the login: {error}")]
    ProviderDenied {
        error: String,
        description: Option<String>,
    },

    // Identity provider errors
    #[error("OAuth2 code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Failed to retrieve user identity: {0}")]
    IdentityFetchFailed(String),

    #[error("Failed to decode user identity: {0}")]
    IdentityDecodeFailed(String),

    #[error("Hosted domain {domain:?} is not allowed")]
    DomainNotAllowed { domain: Option<String> },

    #[error("Identity provider communication timeout")]
    Timeout,

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidSession(_) | GatewayError::FlowExpired => {
                StatusCode::UNAUTHORIZED
            }

            GatewayError::ProviderDenied { .. } | GatewayError::DomainNotAllowed { .. } => {
                StatusCode::FORBIDDEN
            }

            GatewayError::ExchangeFailed(_)
            | GatewayError::IdentityFetchFailed(_)
            | GatewayError::IdentityDecodeFailed(_) => StatusCode::BAD_GATEWAY,

            GatewayError::Timeout => StatusCode::GATEWAY_TIMEOUT,

            GatewayError::InvalidState(_)
            | GatewayError::Token(_)
            | GatewayError::MissingParameter(_)
            | GatewayError::ConfigError(_)
            | GatewayError::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Public message for the response body.
    fn public_message(&self) -> &'static str {
        match self {
            GatewayError::InvalidSession(_) => "not authenticated",
            GatewayError::FlowExpired => "login flow expired, please try again",
            GatewayError::ProviderDenied { .. } => "login was denied by the identity provider",
            GatewayError::DomainNotAllowed { .. } => "account is not allowed to log in",
            GatewayError::ExchangeFailed(_)
            | GatewayError::IdentityFetchFailed(_)
            | GatewayError::IdentityDecodeFailed(_) => "identity provider request failed",
            GatewayError::Timeout => "identity provider did not respond in time",
            _ => "login failed",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::IdentityFetchFailed(err.to_string())
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
