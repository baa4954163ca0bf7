use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, REFERER, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, error, info};
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::actions::{self, Action};
use crate::cache::Cache;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::filters;
use crate::pinboard::Bookmarks;
use crate::render;
use crate::sync;

const AUTH_CHALLENGE: &str = r#"Basic realm="pinboard-triage", charset="UTF-8""#;
const CLIENT_JS: &str = include_str!("../static/client.js");
const STYLES_CSS: &str = include_str!("../static/styles.css");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<Config>,
    pub(crate) upstream: Arc<dyn Bookmarks>,
    pub(crate) cache: Arc<Cache>,
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_page).post(run_action))
        .route("/refresh", post(refresh))
        .route("/client.js", get(client_js))
        .route("/styles.css", get(styles_css))
        .route("/*rest", get(show_page).post(run_action))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

pub(crate) async fn serve(state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    info!("listening on {}", listener.local_addr().context("local addr")?);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    info!("closed");
    Ok(())
}

#[derive(Deserialize)]
struct PageParams {
    limit: Option<String>,
}

async fn show_page(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<PageParams>,
) -> ApiResult<Html<String>> {
    let posts = state.cache.read_posts().await?;
    let limit = filters::parse_limit(params.limit.as_deref());
    let listing = filters::query(posts, uri.path(), limit);
    let html = render::render_page(&state.config.title, &listing)?;
    Ok(Html(html))
}

#[derive(Deserialize)]
struct ActionParams {
    url: Option<String>,
    action: Option<String>,
}

async fn run_action(
    State(state): State<AppState>,
    Query(params): Query<ActionParams>,
) -> ApiResult<StatusCode> {
    let url = params
        .url
        .filter(|url| !url.is_empty())
        .ok_or(ApiError::BadRequest("missing url"))?;
    let action = Action::parse(params.action.as_deref())
        .ok_or(ApiError::BadRequest("unknown action"))?;
    actions::perform(state.upstream.as_ref(), action, &url).await?;
    Ok(StatusCode::OK)
}

async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Redirect> {
    let outcome = sync::sync_once(state.upstream.as_ref(), &state.cache).await?;
    info!("refresh: {:?}", outcome);
    Ok(Redirect::to(&back_path(&headers)))
}

/// Path and query of the referring page; only same-site paths are ever redirected to.
pub(crate) fn back_path(headers: &HeaderMap) -> String {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| Url::parse(referer).ok())
        .filter(|url| is_local_path(url.path()))
        .map(|url| match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        })
        .unwrap_or_else(|| "/".to_string())
}

/// A single leading slash; `//host` and `/\host` are read as other origins by browsers.
fn is_local_path(path: &str) -> bool {
    match path.strip_prefix('/') {
        Some(rest) => !rest.starts_with('/') && !rest.starts_with('\\'),
        None => false,
    }
}

async fn client_js() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/javascript; charset=utf-8")], CLIENT_JS)
}

async fn styles_css() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/css; charset=utf-8")], STYLES_CSS)
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = basic_credentials(request.headers())
        .map(|(name, pass)| name == state.config.username && pass == state.config.password)
        .unwrap_or(false);
    if authorized {
        return next.run(request).await;
    }
    debug!("unauthorized {} {}", request.method(), request.uri().path());
    (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, AUTH_CHALLENGE)]).into_response()
}

pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, pass) = decoded.split_once(':')?;
    Some((name.to_string(), pass.to_string()))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "{} {} {} {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("signal: SIGINT"),
            Err(err) => {
                error!("listen for SIGINT: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::quit())) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => info!("signal: SIGTERM"),
                    _ = quit.recv() => info!("signal: SIGQUIT"),
                }
            }
            (Err(err), _) | (_, Err(err)) => {
                error!("listen for termination signals: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
    info!("closing");
}
