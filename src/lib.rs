use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub mod collections;
pub mod explorer;
pub mod startup_checks;
pub mod templating;

pub use collections::{CollectionCatalog, CollectionConfig, InitialItemConfig};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub media: MediaConfig,
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Image delivery root, e.g. `https://res.cloudinary.com/<cloud>/image`.
    pub delivery_url: String,
    /// Collection listing API root; unmapped ids resolve to `{api_base}/{id}`.
    pub api_base: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default)]
    pub max_sessions: Option<usize>,
    /// Collection id -> endpoint path (relative to `api_base`) or absolute URL.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

fn default_max_results() -> usize {
    explorer::DEFAULT_MAX_RESULTS
}

fn default_page_size() -> usize {
    explorer::DEFAULT_PAGE_SIZE
}

fn default_settle_delay_ms() -> u64 {
    explorer::DEFAULT_SETTLE_DELAY.as_millis() as u64
}

impl MediaConfig {
    pub fn explorer_settings(&self) -> explorer::ExplorerSettings {
        explorer::ExplorerSettings {
            page_size: self.page_size.max(1),
            max_results: self.max_results.max(1),
            settle_delay: std::time::Duration::from_millis(self.settle_delay_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Gallery Explorer".to_string(),
                log_level: "info".to_string(),
                base_url: None,
            },
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            media: MediaConfig {
                delivery_url: "https://res.cloudinary.com/demo/image".to_string(),
                api_base: "http://127.0.0.1:4000/api/cloudinary".to_string(),
                max_results: default_max_results(),
                page_size: default_page_size(),
                settle_delay_ms: default_settle_delay_ms(),
                max_sessions: None,
                endpoints: HashMap::new(),
            },
            collections: Vec::new(),
        }
    }
}

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub sessions: explorer::SharedSessions,
    pub collections: Arc<CollectionCatalog>,
    pub config: Config,
}

async fn index_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "base_url": app_state.config.app.base_url,
        "page_title": "Event galleries",
        "collections": app_state.collections.summaries(),
    });

    match app_state
        .template_engine
        .render_template("index.html.liquid", globals)
        .await
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Builds the application with the HTTP media host named in `config.media`.
pub async fn create_app(config: Config) -> Router {
    let endpoints =
        explorer::EndpointMap::new(config.media.api_base.clone(), config.media.endpoints.clone());
    let source = Arc::new(explorer::HttpMediaSource::new(endpoints));
    create_app_with_source(config, source)
}

pub fn create_app_with_source(config: Config, source: Arc<dyn explorer::MediaSource>) -> Router {
    let template_engine = Arc::new(templating::TemplateEngine::new(
        config.templates.directory.clone(),
    ));

    let mut sessions = explorer::ExplorerSessions::new(
        source,
        explorer::MediaUrlBuilder::new(config.media.delivery_url.clone()),
        config.media.explorer_settings(),
    );
    if let Some(max_sessions) = config.media.max_sessions {
        sessions = sessions.with_max_sessions(max_sessions);
    }

    let app_state = AppState {
        template_engine,
        sessions: Arc::new(sessions),
        collections: Arc::new(CollectionCatalog::new(config.collections.clone())),
        config: config.clone(),
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/gallery/{collection_id}", get(explorer::gallery_page_handler))
        .route(
            "/api/gallery/{collection_id}",
            get(explorer::gallery_json_handler),
        )
        .route(
            "/api/gallery/{collection_id}/retry",
            post(explorer::retry_handler),
        )
        .route(
            "/api/gallery/{collection_id}/page/{page}",
            post(explorer::page_handler),
        )
        .route(
            "/api/gallery/{collection_id}/lightbox",
            delete(explorer::close_lightbox_handler),
        )
        .route(
            "/api/gallery/{collection_id}/lightbox/open/{ordinal}",
            post(explorer::open_lightbox_handler),
        )
        .route(
            "/api/gallery/{collection_id}/lightbox/navigate/{direction}",
            post(explorer::navigate_handler),
        )
        .route(
            "/api/gallery/{collection_id}/lightbox/failed",
            post(explorer::lightbox_failed_handler),
        )
        .route(
            "/api/gallery/{collection_id}/cards/{ordinal}/{outcome}",
            post(explorer::card_outcome_handler),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
