//!
//! evgate HTTP server
//! ------------------
//! Axum application that puts the edge evaluator in front of the marketplace
//! pages. Page rendering belongs to the front-end; the handlers here only
//! stand in for it so the guard can be exercised end to end.
//!
//! Responsibilities:
//! - Mount the edge guard on every page route (and the fallback).
//! - `GET /session`: decoded identity of the current visitor.
//! - `POST /logout`: drop the auth cookie, outside the guard so a stale
//!   credential can always be discarded.
//! - `GET /healthz`: liveness, outside the guard.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::config::GuardConfig;
use crate::edge::{edge_guard, EdgeEvaluator, GuardState};
use crate::error::{AppError, AppResult};
use crate::identity::{clear_cookie, CredentialDecoder, RequestCredentials, SessionStore};
use crate::policy::{Policy, LOGIN_PATH};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub guard: GuardState,
    pub decoder: CredentialDecoder,
    /// Backend origin for data-fetching collaborators; the guard never calls it.
    pub api_base: Option<String>,
}

impl AppState {
    pub fn new(policy: Policy, secret: &[u8], cookie_name: &str) -> Self {
        let decoder = CredentialDecoder::from_secret(secret);
        let evaluator = EdgeEvaluator::new(Arc::new(policy), decoder.clone());
        Self {
            guard: GuardState { evaluator: Arc::new(evaluator), cookie_name: Arc::from(cookie_name) },
            decoder,
            api_base: None,
        }
    }

    pub fn from_config(config: &GuardConfig) -> AppResult<Self> {
        let policy = config.load_policy()?;
        let mut state = Self::new(policy, config.jwt_secret.as_bytes(), &config.cookie_name);
        state.api_base = config.api_base.clone();
        Ok(state)
    }
}

pub fn build_router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/session", get(session_handler))
        .fallback(page)
        .layer(middleware::from_fn_with_state(state.guard.clone(), edge_guard));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/logout", post(logout))
        .merge(guarded)
        .with_state(state)
}

pub async fn run(config: GuardConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!(
        addr = %addr,
        cookie = %config.cookie_name,
        policy = ?config.policy_file,
        api_base = ?config.api_base,
        "starting evgate"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Stand-in for the front-end page render.
async fn page(request: Request) -> Response {
    let path = request.uri().path().to_string();
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], format!("page {path}")).into_response()
}

#[derive(Debug, Serialize)]
struct SessionView {
    sub: Option<String>,
    id: Option<i64>,
    name: Option<String>,
    role: Option<String>,
    home: Option<String>,
    exp: i64,
}

async fn session_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionView>, AppError> {
    let creds = RequestCredentials::from_headers(&headers, &state.guard.cookie_name);
    let session = creds
        .read()
        .ok_or_else(|| AppError::auth("anonymous", "no credential presented"))?;
    let claims = state.decoder.decode_now(&session.token)?;
    let role = claims.role();
    let home = role.as_ref().map(|r| state.guard.evaluator.policy().home_for(r).to_string());
    Ok(Json(SessionView {
        sub: claims.sub,
        id: claims.id,
        name: claims.name,
        role: role.map(|r| r.to_string()),
        home,
        exp: claims.exp,
    }))
}

async fn logout(State(state): State<AppState>) -> Response {
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    if let Some(cookie) = clear_cookie(&state.guard.cookie_name) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
