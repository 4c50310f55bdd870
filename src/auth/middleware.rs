/// Login Gate Middleware
///
/// Axum middleware deciding per request whether to forward it, send the
/// browser to the identity provider, or finish a login on the callback path.
use crate::auth::config::CookieConfig;
use crate::auth::cookie::{CookieGenerator, LOGIN_COOKIE_NAME, LOGIN_HEADER_NAME, SessionToken};
use crate::auth::error::{GatewayError, TokenError};
use crate::auth::providers::IdentityProvider;
use crate::auth::state::StateGenerator;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use tracing::{debug, error};

/// Shared, read-only login flow collaborators.
pub struct LoginGate {
    pub(crate) cookies: Arc<dyn CookieGenerator>,
    pub(crate) states: Arc<dyn StateGenerator>,
    pub(crate) provider: Arc<dyn IdentityProvider>,
    pub(crate) callback_path: String,
    pub(crate) cookie_config: CookieConfig,
    pub(crate) restart_expired_flow: bool,
}

impl LoginGate {
    pub fn new(
        cookies: Arc<dyn CookieGenerator>,
        states: Arc<dyn StateGenerator>,
        provider: Arc<dyn IdentityProvider>,
        callback_path: impl Into<String>,
    ) -> Self {
        Self {
            cookies,
            states,
            provider,
            callback_path: callback_path.into(),
            cookie_config: CookieConfig::default(),
            restart_expired_flow: true,
        }
    }

    pub fn with_cookie_config(mut self, cookie_config: CookieConfig) -> Self {
        self.cookie_config = cookie_config;
        self
    }

    pub fn with_restart_expired_flow(mut self, restart: bool) -> Self {
        self.restart_expired_flow = restart;
        self
    }

    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Decodes the session cookie, if any.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SessionToken, GatewayError> {
        let jar = CookieJar::from_headers(headers);
        let value = jar
            .get(LOGIN_COOKIE_NAME)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                GatewayError::InvalidSession(TokenError::Malformed("no session cookie".to_string()))
            })?;

        self.cookies.decode(value)
    }

    /// Redirect (307) to the provider with a fresh state bound to `origin`.
    pub fn redirect_to_provider(&self, origin: &str) -> Result<Response, GatewayError> {
        let state = self.states.generate(origin)?;
        let url = self.provider.authorization_url(state.as_str());
        debug!("Redirecting to {} login for {}", self.provider.name(), origin);
        Ok(Redirect::temporary(&url).into_response())
    }

    /// Session cookie with the configured security attributes.
    pub(crate) fn session_cookie(&self, session: &SessionToken) -> Cookie<'static> {
        let mut cookie = session.http_cookie();
        cookie.set_http_only(self.cookie_config.http_only);
        cookie.set_secure(self.cookie_config.secure);
        cookie.set_same_site(Some(self.cookie_config.same_site.into()));
        if let Some(domain) = &self.cookie_config.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

/// Login gate middleware.
///
/// - callback path: finish the login, whatever cookie is present
/// - valid session: set the identity header and forward
/// - otherwise: redirect to the provider
pub async fn login_gate(
    State(gate): State<Arc<LoginGate>>,
    mut req: Request,
    next: Next,
) -> Response {
    debug!("Login gate started with url {}", req.uri());

    if req.uri().path() == gate.callback_path {
        debug!("Skip session check for callback");
        return crate::auth::routes::callback_response(&gate, req.uri()).await;
    }

    match gate.authenticate(req.headers()) {
        Ok(session) => match HeaderValue::from_str(session.subject()) {
            Ok(value) => {
                debug!("User {} is authenticated", session.subject());
                req.headers_mut().insert(LOGIN_HEADER_NAME.clone(), value);
                next.run(req).await
            }
            Err(_) => login(&gate, &req),
        },
        Err(_) => login(&gate, &req),
    }
}

fn login(gate: &LoginGate, req: &Request) -> Response {
    let origin = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match gate.redirect_to_provider(origin) {
        Ok(response) => response,
        Err(e) => {
            error!("Redirect to login failed: {}", e);
            e.into_response()
        }
    }
}
