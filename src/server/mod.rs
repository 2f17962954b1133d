//! HTTP surface of the server cache.

mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::translate::ServerCache;

pub use handlers::{health, metrics, translate};

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ServerCache>,
}

impl AppState {
    pub fn new(cache: Arc<ServerCache>) -> Self {
        Self { cache }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/translate", get(health).post(translate))
        .route("/api/translate/metrics", get(metrics))
        .with_state(state)
}
