use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use services::services::{
    faq::FaqError, inbox::InboxError, partners::PartnerError, properties::PropertyError,
    seed::SeedError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Inbox(#[from] InboxError),
    #[error(transparent)]
    Faq(#[from] FaqError),
    #[error(transparent)]
    Partner(#[from] PartnerError),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Database(e)
            | ApiError::Inbox(InboxError::Database(e))
            | ApiError::Faq(FaqError::Database(e))
            | ApiError::Partner(PartnerError::Database(e))
            | ApiError::Property(PropertyError::Database(e))
            | ApiError::Seed(SeedError::Database(e)) => database_status(e),
            ApiError::Inbox(InboxError::TaskNotFound(_))
            | ApiError::Faq(FaqError::NotFound(_))
            | ApiError::Partner(PartnerError::NotFound(_))
            | ApiError::Property(PropertyError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Inbox(InboxError::MissingThread) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

fn database_status(e: &sqlx::Error) -> StatusCode {
    match e {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ApiResponse::<()>::error(&self.to_string());
        (status, Json(body)).into_response()
    }
}
