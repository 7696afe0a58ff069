use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::{FeedConfig, NewsletterConfig};
use crate::db::Database;
use crate::error::SubscribeError;
use crate::fetcher::Fetcher;
use crate::models::FeedSection;

pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub feeds: Vec<FeedConfig>,
    pub newsletter: NewsletterConfig,
    /// `None` when no subscriber store is configured
    pub subscribers: Option<Arc<Database>>,
}

impl AppState {
    fn feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feeds.iter().find(|f| f.name == name)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/feeds/:name", get(feed_section))
        .route("/api/feeds/:name", get(feed_json))
        .route("/newsletter", post(subscribe))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub sections: Vec<FeedSection>,
}

#[derive(Template)]
#[template(path = "feed_section.html")]
pub struct FeedSectionTemplate {
    pub section: FeedSection,
}

#[derive(Template)]
#[template(path = "subscribe_result.html")]
pub struct SubscribeResultTemplate {
    pub message: String,
    pub success: bool,
    pub link: Option<String>,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    fn not_found(what: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow::anyhow!("{} not found", what),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, format!("Error: {}", self.error)).into_response()
    }
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sections = state.fetcher.load_all(&state.feeds).await;
    HtmlTemplate(IndexTemplate { sections })
}

pub async fn feed_section(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let feed = state
        .feed(&name)
        .ok_or_else(|| AppError::not_found(format!("Feed '{}'", name)))?;

    let section = state.fetcher.load_section(feed).await;
    Ok(HtmlTemplate(FeedSectionTemplate { section }))
}

pub async fn feed_json(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FeedSection>, AppError> {
    let feed = state
        .feed(&name)
        .ok_or_else(|| AppError::not_found(format!("Feed '{}'", name)))?;

    Ok(Json(state.fetcher.load_section(feed).await))
}

const SUBSCRIBE_FAILED: &str = "Something went wrong. Please try again.";

#[derive(Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let Some(db) = &state.subscribers else {
        let link = state.newsletter.fallback_url.clone();
        let message = if link.is_some() {
            "Redirecting you to subscribe..."
        } else {
            "Newsletter signup is not available right now."
        };
        return HtmlTemplate(SubscribeResultTemplate {
            message: message.to_string(),
            success: false,
            link,
        });
    };

    let (message, success) = match db.subscribe(&form.email, &state.newsletter.source).await {
        Ok(_) => ("Successfully subscribed! Thank you!".to_string(), true),
        // Already logged by the store; the visitor only gets a generic note
        Err(SubscribeError::Database(_)) => (SUBSCRIBE_FAILED.to_string(), false),
        Err(e) => {
            let already = matches!(e, SubscribeError::AlreadySubscribed);
            (e.to_string(), already)
        }
    };

    HtmlTemplate(SubscribeResultTemplate {
        message,
        success,
        link: None,
    })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
