//! REST 路由
//!
//! 路径里的标识符以字符串接收后手工解析，格式错误统一映射为 400，
//! 不把 axum 的路径拒绝样式暴露给客户端。

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{CreateMessageRequest, CreateRoomRequest, MessageDto, RoomDto};
use domain::{MessageId, RoomId};

use crate::error::ApiError;
use crate::state::AppState;
use crate::subscribe;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/{room_id}", get(get_room))
        .route(
            "/rooms/{room_id}/messages",
            post(create_message).get(list_room_messages),
        )
        .route(
            "/rooms/{room_id}/messages/{message_id}",
            get(get_room_message),
        )
        .route(
            "/rooms/{room_id}/messages/{message_id}/like",
            patch(like_message).delete(remove_like_message),
        )
        .route(
            "/rooms/{room_id}/messages/{message_id}/answer",
            patch(answer_message),
        )
        .route("/subscribe/{room_id}", get(subscribe::subscribe_room))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct CreateRoomPayload {
    subject: String,
}

#[derive(Debug, Deserialize)]
struct CreateMessagePayload {
    message: String,
}

async fn create_room(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let room = state
        .room_service
        .create_room(CreateRoomRequest {
            subject: payload.subject,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomDto>>, ApiError> {
    let rooms = state.room_service.list_rooms().await?;
    Ok(Json(rooms))
}

async fn get_room(
    State(state): State<AppState>,
    Path(raw_room_id): Path<String>,
) -> Result<Json<RoomDto>, ApiError> {
    let room_id = parse_room_id(&raw_room_id)?;
    let room = state.room_service.get_room(room_id).await?;
    Ok(Json(room))
}

async fn create_message(
    State(state): State<AppState>,
    Path(raw_room_id): Path<String>,
    Json(payload): Json<CreateMessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let room_id = parse_room_id(&raw_room_id)?;
    let message = state
        .room_service
        .create_message(CreateMessageRequest {
            room_id,
            message: payload.message,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_room_messages(
    State(state): State<AppState>,
    Path(raw_room_id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let room_id = parse_room_id(&raw_room_id)?;
    let messages = state.room_service.list_room_messages(room_id).await?;
    Ok(Json(messages))
}

async fn get_room_message(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<Json<MessageDto>, ApiError> {
    let (room_id, message_id) = parse_ids(&raw_room_id, &raw_message_id)?;
    let message = state
        .room_service
        .get_room_message(room_id, message_id)
        .await?;
    Ok(Json(message))
}

async fn like_message(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<Json<i64>, ApiError> {
    let (room_id, message_id) = parse_ids(&raw_room_id, &raw_message_id)?;
    let count = state.room_service.like_message(room_id, message_id).await?;
    Ok(Json(count))
}

async fn remove_like_message(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<Json<i64>, ApiError> {
    let (room_id, message_id) = parse_ids(&raw_room_id, &raw_message_id)?;
    let count = state
        .room_service
        .remove_like_message(room_id, message_id)
        .await?;
    Ok(Json(count))
}

async fn answer_message(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let (room_id, message_id) = parse_ids(&raw_room_id, &raw_message_id)?;
    state
        .room_service
        .answer_message(room_id, message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn parse_room_id(raw: &str) -> Result<RoomId, ApiError> {
    raw.parse::<Uuid>()
        .map(RoomId::from)
        .map_err(|_| ApiError::bad_request("invalid room id"))
}

pub(crate) fn parse_message_id(raw: &str) -> Result<MessageId, ApiError> {
    raw.parse::<Uuid>()
        .map(MessageId::from)
        .map_err(|_| ApiError::bad_request("invalid message id"))
}

fn parse_ids(raw_room_id: &str, raw_message_id: &str) -> Result<(RoomId, MessageId), ApiError> {
    Ok((parse_room_id(raw_room_id)?, parse_message_id(raw_message_id)?))
}
