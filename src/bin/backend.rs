#![forbid(unsafe_code)]

//! HTTP backend for the Learnoverse video catalog.
//!
//! The SQLite store only knows video ids. Every `/api/videos` request walks
//! those ids in order and asks YouTube for the rest, so nothing served here is
//! ever cached.

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use learntube::{
    aggregator::{self, AggregateError, EMPTY_CATALOG_MESSAGE, INTERNAL_ERROR_MESSAGE},
    config::{AppConfig, DEFAULT_ENV_PATH, load_config},
    logging::init_tracing,
    store::{COLLECTION_NAME, IdentifierSource, IdentifierStore, StoredIdentifier},
    youtube::{EnrichedVideo, VideoLookup, YouTubeClient},
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::{signal, task};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "Learnoverse YouTube API";

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve the video catalog API.")]
struct BackendArgs {
    #[arg(long = "env-file", value_name = "PATH", default_value = DEFAULT_ENV_PATH, help = "Path to the env file")]
    env_file: PathBuf,
    #[arg(long, value_name = "PORT", help = "Override the listen port")]
    port: Option<u16>,
    #[arg(long, value_name = "ADDR", help = "Override the listen address")]
    host: Option<String>,
    #[arg(
        long = "database",
        value_name = "PATH",
        help = "Override the identifier store location"
    )]
    database: Option<PathBuf>,
}

impl BackendArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
    }
}

#[derive(Clone)]
struct AppState {
    store: Arc<IdentifierStore>,
    lookup: Arc<dyn VideoLookup>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::EmptyCatalog => ApiError::not_found(EMPTY_CATALOG_MESSAGE),
            AggregateError::Store(err) => {
                error!(error = %err, "identifier store unavailable");
                ApiError::internal(INTERNAL_ERROR_MESSAGE)
            }
            AggregateError::Unexpected(detail) => {
                error!(%detail, "unexpected failure in /api/videos");
                ApiError::internal(INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let body = json!({
            "error": self.message,
        });
        (self.status, headers, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = BackendArgs::parse();
    let mut config = load_config(&args.env_file)
        .with_context(|| format!("loading configuration from {}", args.env_file.display()))?;
    args.apply(&mut config);

    init_tracing(config.log_format);

    if config.uses_placeholder_key() {
        warn!("YOUTUBE_API_KEY is not set; every upstream lookup will be rejected");
    }

    let store = IdentifierStore::open(&config.database_path).with_context(|| {
        format!(
            "opening identifier store {}",
            config.database_path.display()
        )
    })?;
    info!(
        database = store.database_name(),
        path = %store.path().display(),
        "connected to identifier store"
    );

    let state = AppState {
        store: Arc::new(store),
        lookup: Arc::new(YouTubeClient::from_config(&config)),
    };

    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("parsing listen address {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    info!("Server running on port {}", config.port);
    info!("Health check: http://{}/health", addr);
    info!("API endpoint: http://{}/api/videos", addr);
    info!("Debug endpoint: http://{}/api/debug", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/api/videos", get(list_videos))
        .route("/api/debug", get(debug_dump))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", err);
    }
    info!("shutting down");
}

async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<Vec<EnrichedVideo>>> {
    let store = state.store.clone();
    let lookup = state.lookup.clone();

    // The whole loop is blocking (SQLite + ureq), so it runs off the runtime.
    let videos = task::spawn_blocking(move || aggregator::enrich_all(store.as_ref(), lookup.as_ref()))
        .await
        .map_err(|err| AggregateError::Unexpected(format!("task join error: {err}")))??;

    Ok(Json(videos))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugDump {
    database: String,
    collection: &'static str,
    video_count: usize,
    videos: Vec<StoredIdentifier>,
}

async fn debug_dump(State(state): State<AppState>) -> ApiResult<Json<DebugDump>> {
    let store = state.store.clone();
    let videos = task::spawn_blocking(move || store.list_identifiers())
        .await
        .map_err(|err| ApiError::internal(format!("task join error: {err}")))?
        .map_err(|err| ApiError::internal(err.to_string()))?;

    Ok(Json(DebugDump {
        database: state.store.database_name().to_string(),
        collection: COLLECTION_NAME,
        video_count: videos.len(),
        videos,
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "database": state.store.database_name(),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn service_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "database": state.store.database_name(),
        "endpoints": {
            "videos": "/api/videos",
            "health": "/health",
            "debug": "/api/debug",
        },
    }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}
