//!
//! rolodex HTTP server
//! -------------------
//! This module defines the Axum-based HTTP API.
//!
//! Responsibilities:
//! - Session management with an opaque HttpOnly cookie.
//! - Register/login/logout endpoints backed by the `identity` module.
//! - Google OAuth start and callback routes with state round-trip checks.
//! - Contact CRUD endpoints delegating to the persistence collaborator.
//! - The access-control gate in front of every protected handler.
//! - A panic boundary that converts handler panics to a generic 500.

use std::{
    collections::HashMap,
    net::SocketAddr,
    panic::AssertUnwindSafe,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::FutureExt; // for catch_unwind on async blocks
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    contacts::{self, ContactFields},
    error::{AppError, AppResult},
    identity::{
        self, GoogleOAuth, LoginRequest, MemorySessionStore, RegisterRequest, SessionStore,
        SessionToken, User,
    },
    store::{memory::MemoryStore, ContactStore, UserStore},
    util::random_token,
};

const SESSION_COOKIE: &str = "rolodex_session";
/// An unconsumed OAuth state value is only honoured this long.
const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);

/// Shared server state injected into all handlers.
///
/// The stores are collaborator handles; the OAuth client is absent when no
/// Google credentials were configured. `oauth_states` holds pending
/// authorization state values until the provider redirects back.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<dyn ContactStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub oauth: Option<Arc<GoogleOAuth>>,
    pub oauth_states: Arc<RwLock<HashMap<String, Instant>>>,
}

/// Start the rolodex HTTP server with the memory reference store.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));
    let oauth = match &config.google {
        Some(google) => Some(Arc::new(GoogleOAuth::new(google)?)),
        None => {
            warn!("Google OAuth not configured; GET /login will report an error");
            None
        }
    };
    let state = AppState {
        contacts: store.clone(),
        users: store,
        sessions,
        oauth,
        oauth_states: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/contacts", get(list_contacts_handler).post(create_contact_handler))
        .route(
            "/contacts/{id}",
            get(get_contact_handler).put(update_contact_handler).delete(delete_contact_handler),
        )
        .route("/register", post(register_handler))
        .route("/login", get(oauth_start).post(login_handler))
        .route("/login/failed", get(login_failed))
        .route("/logout", post(logout_handler))
        .route("/auth/callback", get(oauth_callback))
        .route("/me", get(me_handler))
        .layer(middleware::from_fn(panic_boundary))
        .with_state(state)
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

fn set_session_cookie(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE, token
    ))
    .expect("cookie value is ascii")
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE
    ))
    .expect("cookie value is ascii")
}

/// The access-control gate: evaluated before any protected handler, and the
/// sole authorization mechanism. Reads session state only.
pub fn require_principal(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let Some(token) = parse_cookie(headers, SESSION_COOKIE) else {
        return Err(AppError::authorization(
            "not_authenticated",
            "you must be logged in to access this resource",
        ));
    };
    identity::resolve_session(state.users.as_ref(), state.sessions.as_ref(), &token)
}

/// Converts handler panics into a generic 500 without crashing the task.
async fn panic_boundary(req: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(resp) => resp,
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                *s
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.as_str()
            } else {
                "panic"
            };
            error!(target: "panic", "handler panic: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "code": "internal_panic",
                    "message": "internal server error"
                })),
            )
                .into_response()
        }
    }
}

async fn root() -> &'static str {
    "Welcome to the Contact Management API"
}

// --- auth routes ---

async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::validation("malformed_payload", e.body_text()))?;
    let user = identity::register(state.users.as_ref(), &payload)?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "ok", "id": user.id }))))
}

async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::validation("malformed_payload", e.body_text()))?;
    let (user, token) =
        identity::login(state.users.as_ref(), state.sessions.as_ref(), &payload)?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, set_session_cookie(&token));
    Ok((StatusCode::OK, headers, Json(json!({ "status": "ok", "id": user.id }))))
}

async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = parse_cookie(&headers, SESSION_COOKIE);
    let result = identity::logout(state.sessions.as_ref(), token.as_deref());
    // The cookie is cleared even when the store delete fails.
    match result {
        Ok(()) => {
            let mut h = HeaderMap::new();
            h.insert(SET_COOKIE, clear_session_cookie());
            (StatusCode::OK, h, Json(json!({ "status": "ok" }))).into_response()
        }
        Err(e) => {
            let mut resp = e.into_response();
            resp.headers_mut().insert(SET_COOKIE, clear_session_cookie());
            resp
        }
    }
}

async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user = require_principal(&state, &headers)?;
    Ok(Json(user.public()))
}

// --- Google OAuth routes ---

async fn oauth_start(State(state): State<AppState>) -> Result<Response, AppError> {
    let Some(oauth) = state.oauth.as_ref() else {
        return Err(AppError::upstream("oauth_not_configured", "OAuth is not configured"));
    };
    let csrf_state = random_token();
    state.oauth_states.write().await.insert(csrf_state.clone(), Instant::now());
    Ok(Redirect::to(&oauth.authorize_url(&csrf_state)).into_response())
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match complete_oauth_callback(&state, params).await {
        Ok(token) => {
            let mut resp = Redirect::to("/").into_response();
            resp.headers_mut().insert(SET_COOKIE, set_session_cookie(&token));
            resp
        }
        Err(e) => {
            warn!("oauth callback failed: {e}");
            Redirect::to("/login/failed").into_response()
        }
    }
}

async fn complete_oauth_callback(
    state: &AppState,
    params: CallbackParams,
) -> AppResult<SessionToken> {
    let Some(oauth) = state.oauth.as_ref() else {
        return Err(AppError::upstream("oauth_not_configured", "OAuth is not configured"));
    };
    if let Some(err) = params.error {
        return Err(AppError::authentication("oauth_denied", format!("provider returned: {err}")));
    }
    let returned_state = params
        .state
        .ok_or_else(|| AppError::validation("missing_state", "missing state parameter"))?;
    {
        // One-shot: the state value is removed whether or not it is fresh.
        let mut states = state.oauth_states.write().await;
        match states.remove(&returned_state) {
            Some(issued) if issued.elapsed() < OAUTH_STATE_TTL => {}
            _ => {
                return Err(AppError::authentication(
                    "state_mismatch",
                    "authorization state mismatch",
                ))
            }
        }
    }
    let code = params
        .code
        .ok_or_else(|| AppError::validation("missing_code", "missing code parameter"))?;
    let access_token = oauth.exchange_code(&code).await?;
    let profile = oauth.fetch_profile(&access_token).await?;
    let (_user, token) =
        identity::oauth_sign_in(state.users.as_ref(), state.sessions.as_ref(), profile)?;
    Ok(token)
}

async fn login_failed() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "status": "error",
            "code": "oauth_failed",
            "message": "sign-in could not be completed"
        })),
    )
}

// --- contact routes ---

async fn list_contacts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    require_principal(&state, &headers)?;
    let all = contacts::list_contacts(state.contacts.as_ref())?;
    Ok(Json(all))
}

async fn get_contact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_principal(&state, &headers)?;
    let contact = contacts::get_contact(state.contacts.as_ref(), &id)?;
    Ok(Json(contact))
}

async fn create_contact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ContactFields>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_principal(&state, &headers)?;
    let Json(fields) =
        payload.map_err(|e| AppError::validation("malformed_payload", e.body_text()))?;
    let created = contacts::create_contact(state.contacts.as_ref(), fields)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_contact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<ContactFields>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_principal(&state, &headers)?;
    let Json(fields) =
        payload.map_err(|e| AppError::validation("malformed_payload", e.body_text()))?;
    let updated = contacts::update_contact(state.contacts.as_ref(), &id, fields)?;
    Ok(Json(updated))
}

async fn delete_contact_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_principal(&state, &headers)?;
    contacts::delete_contact(state.contacts.as_ref(), &id)?;
    Ok(Json(json!({ "status": "ok" })))
}
