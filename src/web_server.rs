use anyhow::{Context, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Form, Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::Serialize;
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::constants::SESSION_COOKIE;
use crate::product::{Category, ProductAttributes};
use crate::render::PredictionView;
use crate::session::{PredictionSession, SessionStore, Submission};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionStore>, config: &ServerConfig) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(config.templates_dir.clone())),
            sessions,
        }
    }
}

/// The requesting browser's prediction session, resolved from its cookie.
struct ClientSession {
    id: Uuid,
    session: Arc<PredictionSession>,
    is_new: bool,
}

fn session_id_from_cookies(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let requested = session_id_from_cookies(&parts.headers);
        let (id, session, is_new) = state.sessions.get_or_create(requested).await;
        Ok(Self { id, session, is_new })
    }
}

impl ClientSession {
    /// Attaches the session cookie when this request started a new session.
    fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.is_new {
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "Failed to build session cookie"),
            }
        }
        response
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: String) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

#[derive(Serialize)]
struct CategoryOption {
    value: &'static str,
    label: &'static str,
}

/// Page state handed to `index.html`.
#[derive(Serialize, Default)]
struct PageContext<'a> {
    form: Option<&'a ProductAttributes>,
    view: Option<PredictionView>,
    notice: Option<&'a str>,
    success: Option<&'a str>,
    error: Option<&'a str>,
}

impl<'a> PageContext<'a> {
    fn from_submission(submission: &'a Submission, state: &AppState) -> Self {
        Self {
            form: Some(&submission.attributes),
            view: Some(PredictionView::new(
                submission.outcome.prediction(),
                &submission.attributes.name,
                state.sessions.locale(),
            )),
            notice: submission.outcome.notice(),
            success: submission.outcome.message(),
            error: None,
        }
    }
}

fn render_page(state: &AppState, page: PageContext<'_>) -> Result<Html<String>, Response> {
    let categories: Vec<CategoryOption> = Category::ALL
        .iter()
        .map(|c| CategoryOption {
            value: c.as_str(),
            label: c.label(),
        })
        .collect();

    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = minijinja::context! {
                    title => "Price Whisperer",
                    locale => state.sessions.locale().code(),
                    categories => categories,
                    form => page.form,
                    view => page.view,
                    notice => page.notice,
                    success => page.success,
                    error => page.error,
                };
                tmpl.render(context)
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
                .into_response()
        })
}

async fn index_handler(State(state): State<AppState>, client: ClientSession) -> Response {
    let last = client.session.last().await;
    let page = match &last {
        Some(submission) => PageContext::from_submission(submission, &state),
        None => PageContext::default(),
    };
    client.respond(render_page(&state, page))
}

async fn predict_form_handler(
    State(state): State<AppState>,
    client: ClientSession,
    Form(attributes): Form<ProductAttributes>,
) -> Response {
    info!(product = %attributes.name, session = %client.id, "Prediction form submitted");
    match client.session.submit(attributes.clone()).await {
        Ok(submission) => {
            client.respond(render_page(&state, PageContext::from_submission(&submission, &state)))
        }
        Err(e) => {
            warn!(error = %e, "Prediction request did not complete");
            let message = e.to_string();
            let page = PageContext {
                form: Some(&attributes),
                error: Some(&message),
                ..PageContext::default()
            };
            match render_page(&state, page) {
                Ok(html) => client.respond((StatusCode::CONFLICT, html)),
                Err(response) => response,
            }
        }
    }
}

async fn api_predict_handler(client: ClientSession, Json(attributes): Json<ProductAttributes>) -> Response {
    match client.session.submit(attributes).await {
        Ok(submission) => client.respond(Json(submission.outcome)),
        Err(e) => client.respond((
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": e.to_string() })),
        )),
    }
}

async fn api_cancel_handler(client: ClientSession) -> Response {
    let cancelled = client.session.cancel().await;
    client.respond(Json(serde_json::json!({ "cancelled": cancelled })))
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let busy = state.sessions.busy_count().await;
    Json(serde_json::json!({
        "status": "ok",
        "busy": busy > 0,
        "sessions": state.sessions.len().await,
    }))
}

/// Builds the application router. Static files are served from `static_dir`.
pub fn router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/predict", post(predict_form_handler))
        .route("/api/predict", post(api_predict_handler))
        .route("/api/cancel", post(api_cancel_handler))
        .route("/api/health", get(health_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(
    addr: SocketAddr,
    sessions: Arc<SessionStore>,
    config: &ServerConfig,
) -> Result<()> {
    let state = AppState::new(sessions, config);
    let app = router(state, &config.static_dir);

    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, initiating shutdown...");
            }
        })
        .await
        .context("Web server failed")?;

    info!("Shutdown complete.");
    Ok(())
}
