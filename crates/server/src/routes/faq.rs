use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::faq::{CreateFaq, Faq, UpdateFaq};
use serde::Deserialize;
use services::services::faq;
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct FaqQuery {
    pub property_id: Option<Uuid>,
}

/// GET /api/faq?property_id=..
pub async fn get_faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Faq>>>, ApiError> {
    let faqs = faq::list_faqs(&state.db().pool, query.property_id).await?;
    Ok(ResponseJson(ApiResponse::success(faqs)))
}

pub async fn create_faq(
    State(state): State<AppState>,
    Json(payload): Json<CreateFaq>,
) -> Result<ResponseJson<ApiResponse<Faq>>, ApiError> {
    let faq = faq::insert_faq(state.db(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(faq)))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFaq>,
) -> Result<ResponseJson<ApiResponse<Faq>>, ApiError> {
    let faq = faq::update_faq(state.db(), id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(faq)))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Faq>>, ApiError> {
    let faq = faq::delete_faq(state.db(), id).await?;
    Ok(ResponseJson(ApiResponse::success(faq)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/faq", get(get_faqs).post(create_faq))
        .route("/faq/{id}", put(update_faq).delete(delete_faq))
}
