use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::{
    booking::Booking,
    chat::{ChatMessage, CreateChatMessage},
    task::{Task, TaskStatus},
};
use serde::Deserialize;
use services::services::inbox::{self, InboxChat};
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    pub booking_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatus {
    pub status: TaskStatus,
}

/// GET /api/inbox
pub async fn get_inbox(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<InboxChat>>>, ApiError> {
    let chats = inbox::list_chats(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(chats)))
}

/// GET /api/chat?booking_id=..|task_id=..
pub async fn get_thread(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ChatMessage>>>, ApiError> {
    let messages = inbox::fetch_thread(&state.db().pool, query.booking_id, query.task_id).await?;
    Ok(ResponseJson(ApiResponse::success(messages)))
}

/// POST /api/chat
pub async fn post_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateChatMessage>,
) -> Result<ResponseJson<ApiResponse<ChatMessage>>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is empty".to_string()));
    }
    let message = inbox::add_chat_message(state.db(), state.message_sent(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(message)))
}

/// GET /api/bookings
pub async fn get_bookings(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Booking>>>, ApiError> {
    let bookings = Booking::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(bookings)))
}

/// GET /api/tasks
pub async fn get_tasks(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

/// PATCH /api/tasks/{id}/status
pub async fn update_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskStatus>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = inbox::update_task_status(state.db(), task_id, payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inbox", get(get_inbox))
        .route("/chat", get(get_thread).post(post_message))
        .route("/bookings", get(get_bookings))
        .route("/tasks", get(get_tasks))
        .route("/tasks/{id}/status", patch(update_task_status))
}
