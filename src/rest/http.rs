use crate::config::Config;
use crate::db::Db;
use crate::error::{DmrestError, Result};
use crate::graph::SqliteStore;
use crate::rest::links::LinkBuilder;
use crate::rest::resolver::SchemaResolver;
use crate::rest::serializer::GraphSerializer;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// State shared by the REST handlers
#[derive(Clone)]
pub struct AppState {
    db: Db,
    links: Arc<LinkBuilder>,
    max_depth: usize,
    allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(db: Db, links: LinkBuilder, max_depth: usize) -> Self {
        Self {
            db,
            links: Arc::new(links),
            max_depth,
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_allowed_origins(mut self, allowed_origins: Vec<String>) -> Self {
        self.allowed_origins = allowed_origins;
        self
    }
}

/// HTTP server exposing the topic graph read path
pub struct RestServer {
    state: AppState,
    bind_address: String,
    port: u16,
}

impl RestServer {
    /// Create the server; fails when the host url for resource links is missing.
    pub fn new(db: Db, config: &Config) -> Result<Self> {
        let links = LinkBuilder::new(config.host_url())?;
        log::info!("Resource links point at {}", links.host());

        let state = AppState::new(db, links, config.serializer.max_depth)
            .with_allowed_origins(config.http_server.allowed_origins.clone());

        Ok(Self {
            state,
            bind_address: config.http_server.bind_address.clone(),
            port: config.http_server.port,
        })
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        log::info!("Starting DMRest HTTP server on http://{}/rest", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| {
                let error_msg = if e.kind() == std::io::ErrorKind::AddrInUse {
                    format!(
                        "Port {} is already in use. Stop the other process or set http_server.port in config.toml",
                        self.port
                    )
                } else {
                    format!("Failed to bind to {}: {}", addr, e)
                };
                DmrestError::Io(std::io::Error::new(e.kind(), error_msg))
            })?;

        axum::serve(listener, build_router(self.state.clone()))
            .await
            .map_err(|e| DmrestError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e)
            )))?;

        Ok(())
    }
}

/// Build the axum router for `state`
pub fn build_router(state: AppState) -> Router {
    // An empty origin list means local use: allow any origin
    let cors = if state.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = state
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/rest/type/:uri", get(handle_type))
        .route("/rest/topic/:id", get(handle_topic))
        .route("/rest/topics/:uri", get(handle_topics))
        .route("/health", get(handle_health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
        )
        .with_state(state)
}

/// GET /rest/type/:uri
async fn handle_type(State(state): State<AppState>, Path(uri): Path<String>) -> Response {
    log::info!("type request {}", uri);
    let links = Arc::clone(&state.links);

    let result = state.db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        let store = SqliteStore::new(&tx);
        let topic_type = SchemaResolver::new(&store).resolve_type(&uri)?;
        let doc = GraphSerializer::new(&store, &links).serialize_type(&topic_type);
        Ok(doc)
    }).await;

    json_response(result)
}

/// GET /rest/topic/:id
async fn handle_topic(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    log::info!("topic request {}", id);
    let links = Arc::clone(&state.links);
    let max_depth = state.max_depth;

    let result = state.db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        let store = SqliteStore::new(&tx);
        let topic = SchemaResolver::new(&store).resolve_topic(id)?;
        let doc = GraphSerializer::new(&store, &links)
            .with_max_depth(max_depth)
            .serialize_topic(&topic)?;
        Ok(doc)
    }).await;

    json_response(result)
}

/// GET /rest/topics/:uri
async fn handle_topics(State(state): State<AppState>, Path(uri): Path<String>) -> Response {
    log::info!("topics request {}", uri);
    let links = Arc::clone(&state.links);

    let result = state.db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        let store = SqliteStore::new(&tx);
        let resolver = SchemaResolver::new(&store);
        let topic_type = resolver.resolve_type(&uri)?;
        let instances = resolver.instances(&topic_type)?;
        let list = GraphSerializer::new(&store, &links).serialize_related(&instances);
        Ok(list)
    }).await;

    json_response(result)
}

/// Handle health check endpoint
async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "dmrest",
            "version": env!("CARGO_PKG_VERSION")
        }))
    ).into_response()
}

fn json_response<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(doc) => (StatusCode::OK, Json(doc)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Not-found errors become plain-text 404s, everything else a 500
fn error_response(err: DmrestError) -> Response {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, err.to_string()).into_response();
    }
    if let DmrestError::InvalidInput(msg) = &err {
        return (StatusCode::BAD_REQUEST, msg.clone()).into_response();
    }

    log::error!("Error processing REST request: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Internal server error",
            "details": err.to_string()
        }))
    ).into_response()
}
