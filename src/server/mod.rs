// HTTP query service
// Chat endpoint, chat page and static assets on top of an answering pipeline

pub mod errors;
pub mod routes;


use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::rag::Pipeline;

pub use errors::{ChatError, EMPTY_MESSAGE_REPLY, INTERNAL_ERROR_REPLY, NOT_READY_REPLY};
pub use routes::ChatResponse;

/// Shared, read-only state built once at startup
pub struct AppState {
    /// `None` when startup could not load a pipeline
    pub pipeline: Option<Pipeline>,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub static_prefix: String,
}

impl AppState {
    #[inline]
    pub fn new(config: &Config, pipeline: Option<Pipeline>) -> Self {
        Self {
            pipeline,
            templates_dir: config.templates_path(),
            static_dir: config.static_path(),
            static_prefix: config.server.static_prefix.clone(),
        }
    }
}

/// Build the full application router with CORS and request tracing.
#[inline]
pub fn build_router(state: Arc<AppState>) -> Router {
    let prefix = state.static_prefix.trim_end_matches('/').to_string();
    let assets = ServeDir::new(&state.static_dir);

    routes::routes()
        .nest_service(&prefix, assets)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured address and serve until the process is stopped
#[inline]
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let state = Arc::new(state);
    let mode = state
        .pipeline
        .as_ref()
        .map_or("not ready", |pipeline| pipeline.kind());
    let app = build_router(Arc::clone(&state));

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {} ({} mode)", address, mode);

    axum::serve(listener, app).await?;
    Ok(())
}
