use axum::{Router, response::Json as ResponseJson, routing::get};
use utils::response::ApiResponse;

use crate::AppState;

pub mod dashboard;
pub mod events;
pub mod faq;
pub mod inbox;
pub mod partners;
pub mod properties;
pub mod seed;

pub async fn health() -> ResponseJson<ApiResponse<String>> {
    ResponseJson(ApiResponse::success("ok".to_string()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(inbox::router())
        .merge(faq::router())
        .merge(partners::router())
        .merge(properties::router())
        .merge(seed::router())
        .merge(dashboard::router())
        .merge(events::router())
}
