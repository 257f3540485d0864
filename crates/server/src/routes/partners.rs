use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    partner::{CreatePartner, Partner, UpdatePartner},
    task::TaskType,
};
use serde::Deserialize;
use services::services::partners;
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct PartnerQuery {
    #[serde(rename = "type")]
    pub partner_type: Option<TaskType>,
}

/// GET /api/partners?type=cleaning
pub async fn get_partners(
    State(state): State<AppState>,
    Query(query): Query<PartnerQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Partner>>>, ApiError> {
    let partners = partners::list_partners(&state.db().pool, query.partner_type).await?;
    Ok(ResponseJson(ApiResponse::success(partners)))
}

pub async fn create_partner(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartner>,
) -> Result<ResponseJson<ApiResponse<Partner>>, ApiError> {
    let partner = partners::insert_partner(state.db(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(partner)))
}

pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePartner>,
) -> Result<ResponseJson<ApiResponse<Partner>>, ApiError> {
    let partner = partners::update_partner(state.db(), id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(partner)))
}

pub async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Partner>>, ApiError> {
    let partner = partners::delete_partner(state.db(), id).await?;
    Ok(ResponseJson(ApiResponse::success(partner)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/partners", get(get_partners).post(create_partner))
        .route("/partners/{id}", put(update_partner).delete(delete_partner))
}
