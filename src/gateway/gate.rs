//! Request gate: the security boundary in front of every handler.
//!
//! Runs as axum middleware around the whole router. Public path prefixes
//! pass straight through; everything else needs a valid session cookie,
//! checked by the `ring`-backed [`EdgeVerifier`] — not the signer-side
//! verifier — so both implementations stay exercised in production.
//!
//! A missing cookie and an invalid cookie produce the identical redirect;
//! the gate never reveals why a token failed.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::edge::EdgeVerifier;
use crate::auth::{epoch_ms, Identity};

use super::{session_cookie, AppState};

/// Path prefixes reachable without a session.
///
/// `/api/ha` stays public: the dashboard widgets on the login screen poll it
/// and Home Assistant is only reachable from the LAN anyway.
pub const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/api/auth/login",
    "/favicon.ico",
    "/assets",
    "/api/ha",
    "/health",
];

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GateDecision {
    /// Forward to the handler, with the resolved identity when a valid
    /// session was presented on a protected path.
    Allow(Option<Identity>),
    /// Send the client to the login page, preserving the requested path.
    Redirect(String),
}

pub(crate) fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|prefix| path.starts_with(prefix))
}

fn login_redirect(path: &str) -> String {
    format!("/login?redirect={}", urlencoding::encode(path))
}

/// Pure gate decision for one request. The middleware below is a thin
/// wrapper; tests drive this directly.
pub(crate) fn evaluate(
    path: &str,
    cookie: Option<&str>,
    edge: &EdgeVerifier,
    now_ms: u64,
) -> GateDecision {
    if is_public(path) {
        return GateDecision::Allow(None);
    }

    let Some(token) = cookie else {
        return GateDecision::Redirect(login_redirect(path));
    };

    match edge.verify_at(token, now_ms) {
        Some(identity) => GateDecision::Allow(Some(identity)),
        None => GateDecision::Redirect(login_redirect(path)),
    }
}

/// Axum middleware enforcing the gate on every inbound request.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let cookie = session_cookie(req.headers());

    match evaluate(&path, cookie.as_deref(), &state.edge, epoch_ms()) {
        GateDecision::Allow(Some(identity)) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        GateDecision::Allow(None) => next.run(req).await,
        GateDecision::Redirect(location) => {
            tracing::debug!(path = %path, "unauthenticated request, redirecting to login");
            Redirect::to(&location).into_response()
        }
    }
}
