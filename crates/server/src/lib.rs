use std::sync::Arc;

use axum::{
    Router,
    http::{Method, header},
};
use db::DBService;
use services::services::webhook::MessageSentSink;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    message_sent: Arc<dyn MessageSentSink>,
}

impl AppState {
    pub fn new(db: DBService, message_sent: Arc<dyn MessageSentSink>) -> Self {
        Self { db, message_sent }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn message_sent(&self) -> &dyn MessageSentSink {
        self.message_sent.as_ref()
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
