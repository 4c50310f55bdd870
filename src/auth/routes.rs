/// Login Callback Routes
///
/// Completes the authorization-code flow: verifies the returned state,
/// exchanges the code, issues the session cookie and sends the browser back
/// to the page it originally asked for.
use crate::auth::cookie::SessionToken;
use crate::auth::error::GatewayError;
use crate::auth::middleware::{LoginGate, login_gate};
use crate::auth::providers::AuthorizationCode;
use axum::{
    Router,
    extract::{Query, State},
    http::Uri,
    middleware::from_fn_with_state,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// OAuth2 callback parameters
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code from provider
    pub code: Option<String>,

    /// State token issued by the gate
    pub state: Option<String>,

    /// Error from provider
    pub error: Option<String>,

    /// Error description from provider
    pub error_description: Option<String>,
}

impl LoginGate {
    /// Handle the provider's redirect back to the callback path.
    pub async fn callback(&self, params: CallbackParams) -> Result<Response, GatewayError> {
        if let Some(error) = params.error {
            return Err(GatewayError::ProviderDenied {
                error,
                description: params.error_description,
            });
        }

        let state = params
            .state
            .filter(|s| !s.is_empty())
            .ok_or(GatewayError::MissingParameter("state"))?;

        // An expired flow wins over a missing code so it can be restarted
        let state = self.states.decode(&state).map_err(|e| {
            if e.is_expiry() {
                GatewayError::FlowExpired
            } else {
                GatewayError::InvalidState(e)
            }
        })?;

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .map(AuthorizationCode::new)
            .ok_or(GatewayError::MissingParameter("code"))?;

        let identity = self.provider.exchange_and_fetch_identity(&code).await?;
        let session = self.cookies.generate(&identity.email)?;
        info!("User {} logged in via {}", session.subject(), self.provider.name());

        Ok(self.complete_login(&session, &state.origin))
    }

    fn complete_login(&self, session: &SessionToken, origin: &str) -> Response {
        let target = local_redirect_target(origin);
        if target != origin && !origin.is_empty() {
            warn!("Refusing to redirect to non-local origin {:?}", origin);
        }
        let jar = CookieJar::new().add(self.session_cookie(session));
        (jar, Redirect::temporary(target)).into_response()
    }

    /// Wrap `router` so every route passes through the login gate.
    ///
    /// The callback path is mounted as well, so it resolves even when the
    /// wrapped router has no route for it.
    pub fn protect<S>(self: Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let callback_path = self.callback_path.clone();
        router
            .route(
                &callback_path,
                get(callback_handler).with_state(Arc::clone(&self)),
            )
            .layer(from_fn_with_state(self, login_gate))
    }
}

/// `origin` when it is a path on this host, `/` otherwise.
///
/// `//host` and `/\host` are treated as network paths by browsers.
fn local_redirect_target(origin: &str) -> &str {
    match origin.as_bytes() {
        [b'/', b'/' | b'\\', ..] => "/",
        [b'/', ..] => origin,
        _ => "/",
    }
}

/// Callback response, including the restart of an expired flow.
pub(crate) async fn callback_response(gate: &LoginGate, uri: &Uri) -> Response {
    let params = match Query::<CallbackParams>::try_from_uri(uri) {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!("Unreadable callback query: {}", rejection.body_text());
            CallbackParams::default()
        }
    };

    match gate.callback(params).await {
        Ok(response) => response,
        Err(GatewayError::FlowExpired) if gate.restart_expired_flow => {
            debug!("Login flow expired, starting a new one");
            match gate.redirect_to_provider("/") {
                Ok(response) => response,
                Err(e) => e.into_response(),
            }
        }
        Err(e) => {
            warn!("Login callback failed: {}", e);
            e.into_response()
        }
    }
}

/// Standalone callback handler for routers that mount it explicitly.
pub async fn callback_handler(State(gate): State<Arc<LoginGate>>, uri: Uri) -> Response {
    callback_response(&gate, &uri).await
}
