//! HTTP surface for a composed site.
//!
//! Pages are composed once when the server starts and kept in memory; every
//! request is a read of that immutable map. Paths that match no page fall
//! back to content assets and then to the `static/` directory.

use std::{collections::HashMap, net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use percent_encoding::percent_decode_str;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::site::Site;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("no page at {0}")]
    NotFound(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::NotFound(path) => {
                tracing::debug!(%path, "not found");
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
        }
    }
}

pub struct AppState {
    site: Arc<Site>,
    /// Composed documents keyed by output path.
    documents: HashMap<String, String>,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(site: Arc<Site>, rendered: Vec<(String, String)>, static_dir: PathBuf) -> Self {
        Self {
            site,
            documents: rendered.into_iter().collect(),
            static_dir,
        }
    }

    fn document(&self, request_path: &str) -> Option<(&str, &str)> {
        let page = self.site.get(request_path)?;
        let document = self.documents.get(&page.name)?;
        Some((page.name.as_str(), document.as_str()))
    }
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, extension)| extension) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("xml") => "application/xml",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn serve(State(state): State<Arc<AppState>>, req: Request) -> Result<Response, ServerError> {
    // content file names may hold spaces or non-ASCII characters
    let path = percent_decode_str(req.uri().path())
        .decode_utf8_lossy()
        .into_owned();

    if let Some((name, document)) = state.document(&path) {
        let headers = [(header::CONTENT_TYPE, content_type(name))];
        return Ok((headers, document.to_string()).into_response());
    }

    let response = match state.site.asset(&path) {
        Some(asset) => ServeFile::new(asset).oneshot(req).await,
        None => ServeDir::new(&state.static_dir).oneshot(req).await,
    };

    match response {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => {
            Ok(response.map(Body::new))
        }
        _ => Err(ServerError::NotFound(path)),
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve))
        .route("/{*path}", get(serve))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                )),
        )
}

pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(Arc::new(state));

    let addr = SocketAddr::from_str(&format!("{host}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "serving site");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for ctrl-c");
        return std::future::pending().await;
    }
    tracing::info!("shutdown signal received, stopping server");
}
