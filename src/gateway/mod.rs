//! Axum-based HTTP gateway: login handshake, session introspection, the
//! Home Assistant proxy, and the SMHI forecast endpoint.
//!
//! Every route sits behind the request gate in [`gate`]; see that module for
//! the public-path policy. Handlers are stateless per request — the only
//! shared data is the immutable [`AppState`] built once at startup.

pub mod gate;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::auth::edge::EdgeVerifier;
use crate::auth::store::CredentialStore;
use crate::auth::token::SessionSigner;
use crate::auth::{Identity, DEFAULT_SESSION_TTL, MIN_PIN_LEN, SESSION_COOKIE};
use crate::config::Config;
use crate::integrations::home_assistant::{HaClient, HaState};
use crate::integrations::smhi::SmhiClient;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Signs tokens at login; verifies them for session introspection.
    pub signer: Arc<SessionSigner>,
    /// Independent verifier driving the request gate.
    pub edge: Arc<EdgeVerifier>,
    pub credentials: Arc<CredentialStore>,
    pub ha: Arc<HaClient>,
    pub smhi: Arc<SmhiClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let signer = Arc::new(SessionSigner::new(config.auth_secret.as_bytes().to_vec()));
        let edge = Arc::new(EdgeVerifier::new(config.auth_secret.as_bytes()));
        let credentials = Arc::new(CredentialStore::from_config(&config));
        let ha = Arc::new(HaClient::new(config.ha_url.clone(), config.ha_token.clone())?);
        let smhi = Arc::new(SmhiClient::new(
            config.smhi_lat.clone(),
            config.smhi_lon.clone(),
        )?);

        Ok(Self {
            config: Arc::new(config),
            signer,
            edge,
            credentials,
            ha,
            smhi,
        })
    }
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let state = AppState::new(config)?;
    let app = build_router(state);

    tracing::info!("gateway listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with the gate and resource-limit layers applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/login", get(handle_login_page))
        .route("/api/auth/login", post(handle_auth_login))
        .route("/api/auth/me", get(handle_auth_me))
        .route("/api/ha/states", get(handle_ha_states))
        .route("/api/ha/service", post(handle_ha_service))
        .route("/api/smhi", get(handle_smhi))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            gate::require_session,
        ))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS))),
        )
}

/// Extract the session token from the `Cookie` header, if present.
pub(crate) fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|part| {
            let (name, value) = part.split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_owned())
        })
}

/// Build the `Set-Cookie` value for a freshly issued session token.
fn session_set_cookie(token: &str, max_age: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        max_age.as_secs()
    )
}

// ══════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════

/// GET /health — always public (no secrets leaked)
async fn handle_health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET / — dashboard shell. Protected; the gate guarantees the identity
/// extension is present.
async fn handle_index(Extension(identity): Extension<Identity>) -> Html<String> {
    Html(render_index(identity))
}

/// GET /login — login page. Public; reads the `redirect` query parameter
/// client-side so nothing user-controlled is reflected into the markup.
async fn handle_login_page() -> Html<String> {
    Html(render_login_page())
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    user: String,
    pin: String,
}

/// POST /api/auth/login — validate a PIN and issue the session cookie.
///
/// 400 for malformed input (unknown user, too-short PIN), 401 for a wrong
/// PIN. The token travels only in the cookie, never in the body.
async fn handle_auth_login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Invalid request body"})),
        )
            .into_response();
    };

    let Some(identity) = Identity::parse(&body.user) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Invalid user"})),
        )
            .into_response();
    };

    if body.pin.len() < MIN_PIN_LEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Invalid PIN"})),
        )
            .into_response();
    }

    if !state.credentials.validate_pin(identity, &body.pin) {
        tracing::info!(user = %identity, "login rejected: wrong PIN");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false, "error": "Wrong PIN"})),
        )
            .into_response();
    }

    match state.signer.issue(identity, DEFAULT_SESSION_TTL) {
        Ok(token) => {
            tracing::info!(user = %identity, "login succeeded");
            (
                StatusCode::OK,
                [(
                    header::SET_COOKIE,
                    session_set_cookie(&token, DEFAULT_SESSION_TTL),
                )],
                Json(serde_json::json!({"ok": true, "user": identity})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("session issue failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "error": "Internal error"})),
            )
                .into_response()
        }
    }
}

/// GET /api/auth/me — session introspection via the signer-side verifier.
///
/// Behind the built router the gate has already screened the cookie, so the
/// 401 branches here fire only when the handler is driven directly (as the
/// tests do); through the router a bad cookie gets the login redirect.
async fn handle_auth_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let Some(token) = session_cookie(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false})),
        );
    };

    match state.signer.verify(&token) {
        Some(identity) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "user": identity})),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false})),
        ),
    }
}

// ── Home Assistant proxy ─────────────────────────────────────────

/// Server-side filter for `/api/ha/states`.
#[derive(Debug, Default, PartialEq, Eq)]
struct StatesFilter {
    prefix: Option<String>,
    ids: Vec<String>,
}

impl StatesFilter {
    /// Parse from a raw query string. `id` may repeat
    /// (`?id=light.hall&id=switch.golvlampa`), which is why this does not go
    /// through a deserialized map.
    fn from_query(query: &str) -> Self {
        let mut filter = Self::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = match urlencoding::decode(value) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => value.to_owned(),
            };
            match key {
                "prefix" => filter.prefix = Some(value),
                "id" => filter.ids.push(value),
                _ => {}
            }
        }
        filter
    }

    fn apply(&self, states: Vec<HaState>) -> Vec<HaState> {
        states
            .into_iter()
            .filter(|s| self.ids.is_empty() || self.ids.iter().any(|id| *id == s.entity_id))
            .filter(|s| {
                self.prefix
                    .as_deref()
                    .is_none_or(|prefix| s.entity_id.starts_with(prefix))
            })
            .collect()
    }
}

/// GET /api/ha/states?prefix=light.&id=… — proxy entity states, filtered.
async fn handle_ha_states(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    let filter = StatesFilter::from_query(query.as_deref().unwrap_or(""));

    match state.ha.states().await {
        Ok(states) => {
            let filtered = filter.apply(states);
            (
                StatusCode::OK,
                Json(serde_json::json!({"ok": true, "states": filtered})),
            )
        }
        Err(e) => {
            tracing::error!("Home Assistant states fetch failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "error": "Home Assistant request failed"})),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceCallBody {
    domain: String,
    service: String,
    entity_id: Option<String>,
    entity_ids: Option<Vec<String>>,
    data: Option<serde_json::Map<String, Value>>,
}

/// True for names safe to interpolate into the HA service path
/// (`light`, `turn_on`, …).
fn is_service_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Fold the request body into the payload Home Assistant expects: free-form
/// `data` plus `entity_id`, which HA accepts as a string or an array.
/// `entity_ids` wins when both are given.
fn service_payload(body: &ServiceCallBody) -> Value {
    let mut payload = body.data.clone().unwrap_or_default();
    if let Some(id) = &body.entity_id {
        payload.insert("entity_id".to_owned(), Value::String(id.clone()));
    }
    if let Some(ids) = &body.entity_ids {
        payload.insert(
            "entity_id".to_owned(),
            Value::Array(ids.iter().cloned().map(Value::String).collect()),
        );
    }
    Value::Object(payload)
}

/// POST /api/ha/service — proxy a service call.
async fn handle_ha_service(
    State(state): State<AppState>,
    body: Result<Json<ServiceCallBody>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Ok(Json(body)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Invalid request body"})),
        );
    };

    if !is_service_name(&body.domain) || !is_service_name(&body.service) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Invalid domain or service"})),
        );
    }

    let payload = service_payload(&body);
    match state
        .ha
        .call_service(&body.domain, &body.service, &payload)
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "result": result})),
        ),
        Err(e) => {
            tracing::error!(
                domain = %body.domain,
                service = %body.service,
                "Home Assistant service call failed: {e}"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "error": "Home Assistant request failed"})),
            )
        }
    }
}

/// GET /api/smhi — current conditions from the configured point forecast.
async fn handle_smhi(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.smhi.current().await {
        Ok(now) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "data": now})),
        ),
        Err(e) => {
            tracing::error!("SMHI fetch failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"ok": false, "error": "Weather fetch failed"})),
            )
        }
    }
}

// ── HTML Templates ────────────────────────────────────────────────────

fn base_style() -> &'static str {
    r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        background: #10131a; color: #e8e8e8;
        display: flex; justify-content: center; align-items: center;
        min-height: 100vh; padding: 20px;
    }
    .card {
        background: #1a1f2b; border-radius: 16px; padding: 32px;
        max-width: 360px; width: 100%; box-shadow: 0 4px 24px rgba(0,0,0,0.4);
    }
    .logo { text-align: center; margin-bottom: 24px; }
    .logo h1 { font-size: 28px; }
    .logo p { font-size: 14px; color: #8b93a7; margin-top: 4px; }
    .form-group { margin-bottom: 16px; }
    .form-group label { display: block; font-size: 14px; margin-bottom: 6px; color: #aab2c5; }
    .form-group input, .form-group select {
        width: 100%; padding: 12px 14px; border: 1.5px solid #2c3444;
        border-radius: 10px; font-size: 16px; outline: none;
        background: #10131a; color: #e8e8e8;
    }
    .btn {
        width: 100%; padding: 14px; border: none; border-radius: 10px;
        font-size: 16px; font-weight: 600; cursor: pointer;
        background: #4a6cf7; color: #fff;
    }
    .error { background: #3a1820; color: #ff8f9e; padding: 10px 14px; border-radius: 8px; font-size: 13px; margin-bottom: 16px; display: none; }
    "#
}

/// The login page markup. Static on purpose: the `redirect` parameter is
/// read by the inline script from `location.search`, so no request data is
/// ever reflected into the markup. The stylesheet is spliced in at the
/// `/*STYLE*/` marker to keep the template free of `format!` brace escaping.
const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="sv"><head>
<meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>Hemma - Logga in</title>
<style>/*STYLE*/</style>
</head><body>
<div class="card">
  <div class="logo"><h1>Hemma</h1><p>Logga in / Sign in</p></div>
  <div class="error" id="error"></div>
  <form id="login">
    <div class="form-group">
      <label>Vem är du? / Who are you?</label>
      <select name="user">
        <option value="hannes">Hannes</option>
        <option value="elvira">Elvira</option>
      </select>
    </div>
    <div class="form-group">
      <label>PIN</label>
      <input type="password" name="pin" inputmode="numeric" required minlength="4" autocomplete="current-password">
    </div>
    <button type="submit" class="btn">Logga in</button>
  </form>
</div>
<script>
document.getElementById('login').addEventListener('submit', async (e) => {
  e.preventDefault();
  const form = new FormData(e.target);
  const res = await fetch('/api/auth/login', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({user: form.get('user'), pin: form.get('pin')}),
  });
  const body = await res.json();
  if (body.ok) {
    const redirect = new URLSearchParams(location.search).get('redirect');
    location.href = redirect && redirect.startsWith('/') ? redirect : '/';
  } else {
    const err = document.getElementById('error');
    err.textContent = body.error || 'Login failed';
    err.style.display = 'block';
  }
});
</script>
</body></html>"#;

fn render_login_page() -> String {
    LOGIN_PAGE.replace("/*STYLE*/", base_style())
}

fn render_index(identity: Identity) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="sv"><head>
<meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>Hemma</title>
<style>{style}</style>
</head><body>
<div class="card">
  <div class="logo"><h1>Hemma</h1><p>Inloggad som {identity}</p></div>
</div>
</body></html>"#,
        style = base_style(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    const TEST_PIN_HANNES: &str = "1234";
    const TEST_PIN_ELVIRA: &str = "5678";

    fn test_state() -> AppState {
        AppState::new(Config {
            auth_secret: "gateway-test-secret".to_owned(),
            hannes_pin: TEST_PIN_HANNES.to_owned(),
            elvira_pin: TEST_PIN_ELVIRA.to_owned(),
            ha_url: "http://127.0.0.1:1".to_owned(),
            ha_token: "test-token".to_owned(),
            smhi_lat: "59.33".to_owned(),
            smhi_lon: "18.07".to_owned(),
        })
        .unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn login_body(user: &str, pin: &str) -> Result<Json<LoginBody>, JsonRejection> {
        Ok(Json(LoginBody {
            user: user.to_owned(),
            pin: pin.to_owned(),
        }))
    }

    #[tokio::test]
    async fn login_with_correct_pin_sets_cookie() {
        let state = test_state();
        let resp = handle_auth_login(State(state), login_body("hannes", TEST_PIN_HANNES)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(cookie.starts_with("ha_app_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));

        let body = body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["user"], "hannes");
        // The token must never appear in the response body.
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn login_cookie_verifies_with_both_verifiers() {
        let state = test_state();
        let resp = handle_auth_login(
            State(state.clone()),
            login_body("elvira", TEST_PIN_ELVIRA),
        )
        .await;
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let token = cookie
            .strip_prefix("ha_app_session=")
            .unwrap()
            .split(';')
            .next()
            .unwrap();

        assert_eq!(state.signer.verify(token), Some(Identity::Elvira));
        assert_eq!(state.edge.verify(token), Some(Identity::Elvira));
    }

    #[tokio::test]
    async fn login_with_wrong_pin_is_401_without_cookie() {
        let state = test_state();
        let resp = handle_auth_login(State(state), login_body("hannes", "9999")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        let body = body_json(resp).await;
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn login_with_unknown_user_is_400() {
        let state = test_state();
        let resp = handle_auth_login(State(state), login_body("mallory", "1234")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn login_with_short_pin_is_400_not_401() {
        // Formatting failure, rejected before credentials are consulted.
        let state = test_state();
        let resp = handle_auth_login(State(state), login_body("hannes", "123")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_resolves_user_from_cookie() {
        let state = test_state();
        let token = state
            .signer
            .issue(Identity::Hannes, DEFAULT_SESSION_TTL)
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("other=1; ha_app_session={token}").parse().unwrap(),
        );

        let (status, Json(body)) = handle_auth_me(State(state), headers).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], "hannes");
    }

    #[tokio::test]
    async fn me_without_cookie_is_401() {
        let (status, Json(body)) = handle_auth_me(State(test_state()), HeaderMap::new()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn me_with_garbage_cookie_is_401() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "ha_app_session=garbage".parse().unwrap());
        let (status, _) = handle_auth_me(State(test_state()), headers).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn session_cookie_parses_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; ha_app_session=abc.def.ghi; lang=sv"
                .parse()
                .unwrap(),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn session_cookie_requires_exact_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "xha_app_session=evil; other=1".parse().unwrap(),
        );
        assert_eq!(session_cookie(&headers), None);
    }

    #[test]
    fn states_filter_parses_repeated_ids_and_prefix() {
        let filter = StatesFilter::from_query("prefix=light.&id=light.hall&id=switch.golvlampa");
        assert_eq!(filter.prefix.as_deref(), Some("light."));
        assert_eq!(filter.ids, vec!["light.hall", "switch.golvlampa"]);
    }

    #[test]
    fn states_filter_decodes_percent_escapes() {
        let filter = StatesFilter::from_query("prefix=light%2E");
        assert_eq!(filter.prefix.as_deref(), Some("light."));
    }

    #[test]
    fn states_filter_applies_ids_then_prefix() {
        let states = vec![
            state_for("light.hall"),
            state_for("light.sovrum"),
            state_for("switch.golvlampa"),
        ];

        let by_prefix = StatesFilter {
            prefix: Some("light.".to_owned()),
            ids: vec![],
        };
        let filtered = by_prefix.apply(states.clone());
        assert_eq!(filtered.len(), 2);

        let by_id = StatesFilter {
            prefix: None,
            ids: vec!["switch.golvlampa".to_owned()],
        };
        let filtered = by_id.apply(states.clone());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].entity_id, "switch.golvlampa");

        let both = StatesFilter {
            prefix: Some("light.".to_owned()),
            ids: vec!["switch.golvlampa".to_owned()],
        };
        assert!(both.apply(states).is_empty());
    }

    fn state_for(entity_id: &str) -> HaState {
        HaState {
            entity_id: entity_id.to_owned(),
            state: "on".to_owned(),
            attributes: Value::Null,
            last_changed: String::new(),
            last_updated: String::new(),
        }
    }

    #[test]
    fn service_payload_folds_entity_ids_into_entity_id() {
        let body = ServiceCallBody {
            domain: "light".to_owned(),
            service: "turn_on".to_owned(),
            entity_id: Some("light.hall".to_owned()),
            entity_ids: None,
            data: Some(
                serde_json::json!({"brightness": 120})
                    .as_object()
                    .unwrap()
                    .clone(),
            ),
        };
        assert_eq!(
            service_payload(&body),
            serde_json::json!({"brightness": 120, "entity_id": "light.hall"})
        );

        let body = ServiceCallBody {
            domain: "light".to_owned(),
            service: "turn_off".to_owned(),
            entity_id: Some("light.hall".to_owned()),
            entity_ids: Some(vec!["light.hall".to_owned(), "light.sovrum".to_owned()]),
            data: None,
        };
        // entity_ids wins when both are given.
        assert_eq!(
            service_payload(&body),
            serde_json::json!({"entity_id": ["light.hall", "light.sovrum"]})
        );
    }

    #[test]
    fn service_names_are_validated() {
        assert!(is_service_name("light"));
        assert!(is_service_name("turn_on"));
        assert!(is_service_name("media_player2"));
        assert!(!is_service_name(""));
        assert!(!is_service_name("light/../../admin"));
        assert!(!is_service_name("Turn_On"));
        assert!(!is_service_name("light turn"));
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn login_page_posts_to_the_login_api() {
        assert!(LOGIN_PAGE.contains("/api/auth/login"));
        // Redirect handling lives client-side; the markup itself is static.
        assert!(LOGIN_PAGE.contains("redirect"));
    }

    // ── Full router ──────────────────────────────────────────────────

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_serves_public_route_without_cookie() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn router_redirects_me_without_cookie() {
        // /api/auth/me is not on the public allowlist, so the gate answers
        // before the handler's own 401 path can.
        let app = build_router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/login?redirect=%2Fapi%2Fauth%2Fme"
        );
    }

    #[tokio::test]
    async fn router_rejects_oversized_login_body() {
        let app = build_router(test_state());
        let oversized = "a".repeat(MAX_BODY_SIZE + 1);
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(oversized))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
