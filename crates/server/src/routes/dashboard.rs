use axum::{
    Router,
    extract::{Path, RawQuery},
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use services::services::dashboard::{Column, ColumnSettings};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ColumnsResponse {
    pub columns: ColumnSettings,
    /// Query string to put in the page URL for these columns.
    pub query: String,
    pub visible_count: usize,
    pub grid_columns: usize,
}

impl From<ColumnSettings> for ColumnsResponse {
    fn from(columns: ColumnSettings) -> Self {
        Self {
            query: columns.to_query(),
            visible_count: columns.visible_count(),
            grid_columns: columns.grid_columns(),
            columns,
        }
    }
}

/// GET /api/dashboard/columns?showPartners=true
pub async fn get_columns(RawQuery(query): RawQuery) -> ResponseJson<ApiResponse<ColumnsResponse>> {
    let columns = ColumnSettings::from_query(query.as_deref().unwrap_or_default());
    ResponseJson(ApiResponse::success(columns.into()))
}

/// POST /api/dashboard/columns/{column}/toggle?showPartners=true
pub async fn toggle_column(
    Path(column): Path<Column>,
    RawQuery(query): RawQuery,
) -> ResponseJson<ApiResponse<ColumnsResponse>> {
    let mut columns = ColumnSettings::from_query(query.as_deref().unwrap_or_default());
    columns.toggle(column);
    ResponseJson(ApiResponse::success(columns.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/columns", get(get_columns))
        .route("/dashboard/columns/{column}/toggle", post(toggle_column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toggle_adds_column_to_query() {
        let ResponseJson(response) = toggle_column(
            Path(Column::Partners),
            RawQuery(Some("showFAQ=false".to_string())),
        )
        .await;
        let body = response.data().unwrap();
        assert!(body.columns.show_partners);
        assert!(!body.columns.show_faq);
        assert_eq!(body.visible_count, 4);
        assert_eq!(
            body.query,
            "?showGuests=true&showPartners=true&showTaskChat=true&showTasks=true"
        );
    }

    #[tokio::test]
    async fn test_no_query_gives_defaults() {
        let ResponseJson(response) = get_columns(RawQuery(None)).await;
        assert_eq!(response.data().unwrap().columns, ColumnSettings::default());
    }

    #[tokio::test]
    async fn test_response_uses_query_names() {
        let ResponseJson(response) = get_columns(RawQuery(Some("?showPartners=true".to_string()))).await;
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["columns"]["showFAQ"], true);
        assert_eq!(json["data"]["columns"]["showPartners"], true);
        assert_eq!(json["data"]["visible_count"], 5);
    }
}
