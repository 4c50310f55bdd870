//! Shared helpers for the login gateway integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use login_gateway::app;
use login_gateway::auth::{
    AuthorizationCode, GatewayError, IdentityProvider, JwtCodec, JwtCookieGenerator,
    JwtStateGenerator, LoginGate, TokenCodec, UserIdentity,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const SIGNING_KEY: &[u8] = b"integration-test-signing-key-0123456789";
pub const IDP_AUTH_URL: &str = "https://idp.example.com/auth";
pub const STUB_EMAIL: &str = "u@example.com";
pub const STUB_CODE: &str = "abc";
/// Code the stub provider takes five seconds to exchange.
pub const SLOW_CODE: &str = "slow";

/// Identity provider answering `STUB_CODE` with `STUB_EMAIL`.
pub struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn authorization_url(&self, state: &str) -> String {
        Url::parse_with_params(IDP_AUTH_URL, &[("state", state)])
            .map(String::from)
            .unwrap_or_default()
    }

    async fn exchange_code(&self, code: &AuthorizationCode) -> Result<String, GatewayError> {
        match code.as_str() {
            STUB_CODE => Ok("stub-access-token".to_string()),
            SLOW_CODE => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("stub-access-token".to_string())
            }
            _ => Err(GatewayError::ExchangeFailed("unknown code".to_string())),
        }
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<UserIdentity, GatewayError> {
        assert_eq!(access_token, "stub-access-token");
        Ok(UserIdentity {
            id: "42".to_string(),
            email: STUB_EMAIL.to_string(),
            email_verified: true,
            ..Default::default()
        })
    }
}

pub fn codec() -> Arc<dyn TokenCodec> {
    Arc::new(JwtCodec::new(SIGNING_KEY))
}

pub fn test_gate() -> LoginGate {
    let codec = codec();
    LoginGate::new(
        Arc::new(JwtCookieGenerator::new(Arc::clone(&codec))),
        Arc::new(JwtStateGenerator::new(codec)),
        Arc::new(StubProvider),
        "/callback",
    )
}

pub fn test_app(gate: LoginGate) -> Router {
    test_app_with_timeout(gate, Duration::from_secs(5))
}

pub fn test_app_with_timeout(gate: LoginGate, request_timeout: Duration) -> Router {
    app(Arc::new(gate), request_timeout)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn location<B>(response: &Response<B>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// `state` query parameter of a redirect to the identity provider.
pub fn state_param(location: &str) -> String {
    let url = Url::parse(location).unwrap();
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    query["state"].clone()
}

/// `name=value` part of the first Set-Cookie header.
pub fn set_cookie_pair<B>(response: &Response<B>) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
