use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use services::services::seed::{self, SeedSummary};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// POST /api/seed
/// Replace everything in the store with the demo data set.
pub async fn clear_and_seed(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<SeedSummary>>, ApiError> {
    let summary = seed::clear_and_seed(state.db()).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/seed", post(clear_and_seed))
}
