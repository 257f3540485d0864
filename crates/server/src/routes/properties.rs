use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::property::{CreateProperty, Property, UpdateProperty};
use services::services::properties;
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub async fn get_properties(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Property>>>, ApiError> {
    let properties = properties::list_properties(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(properties)))
}

pub async fn create_property(
    State(state): State<AppState>,
    Json(payload): Json<CreateProperty>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    if payload.address.trim().is_empty() {
        return Err(ApiError::BadRequest("address is required".to_string()));
    }
    let property = properties::insert_property(state.db(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(property)))
}

pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProperty>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    let property = properties::update_property(state.db(), id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(property)))
}

/// DELETE /api/properties/{id}
/// Answers 409 while other rows still reference the property.
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Property>>, ApiError> {
    let property = properties::delete_property(state.db(), id).await?;
    Ok(ResponseJson(ApiResponse::success(property)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/properties", get(get_properties).post(create_property))
        .route(
            "/properties/{id}",
            put(update_property).delete(delete_property),
        )
}
