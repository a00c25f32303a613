// src/server/handler.rs

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::warn;

use crate::status::StatusView;

/// Anything that can render a status snapshot as JSON.
pub trait SnapshotSource: Send + Sync + 'static {
    fn render(&self) -> serde_json::Result<Vec<u8>>;
}

impl SnapshotSource for StatusView {
    fn render(&self) -> serde_json::Result<Vec<u8>> {
        self.to_json()
    }
}

pub fn build_router(source: Arc<dyn SnapshotSource>) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .with_state(source)
}

/// `GET /`: 200 with the JSON snapshot, or 500 with the encoder's error text.
async fn status_handler(State(source): State<Arc<dyn SnapshotSource>>) -> Response {
    match source.render() {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to encode status snapshot");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                e.to_string(),
            )
                .into_response()
        }
    }
}
