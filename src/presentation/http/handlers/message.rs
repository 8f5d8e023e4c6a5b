//! Message Handlers

use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::form::MultipartForm;
use crate::application::dto::request::{
    AddReactionRequest, DeleteMessageQuery, EditMessageRequest, RemoveReactionQuery,
    SendMessageRequest,
};
use crate::application::dto::response::{
    DeleteMessageResponse, MessageReadResponse, MessageResponse, ReactionsResponse,
    ReadReceiptResponse,
};
use crate::application::services::SendMessageDto;
use crate::domain::MessageType;
use crate::infrastructure::metrics;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, validation_error};
use crate::startup::AppState;

/// Messages of a room, oldest first
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let messages = state.messages.list_by_room(room_id).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// Send message to room
pub async fn send_message(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let room_id = parse_id(&room_id, "room")?;

    // Validate request
    body.validate().map_err(validation_error)?;

    let message_type = match body.message_type.as_deref() {
        None => MessageType::Text,
        Some(raw) => MessageType::from_str(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown message type: {}", raw)))?,
    };

    let request = SendMessageDto {
        content: body.content,
        message_type,
        file_url: body.file_url,
    };

    let message = state.messages.send(room_id, me.user_id, request).await?;
    metrics::record_message_sent(message.message_type.as_str());

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_sender(message, Some(me.username))),
    ))
}

/// Upload a file and send it as a message (multipart part `file`)
pub async fn upload_message(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let upload = MultipartForm::read(multipart)
        .await?
        .take_file("file")
        .ok_or_else(|| AppError::Validation("No file uploaded".into()))?;

    let message = state.messages.upload(room_id, me.user_id, upload).await?;
    metrics::record_message_sent(message.message_type.as_str());

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_sender(message, Some(me.username))),
    ))
}

/// Edit own message
pub async fn edit_message(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Json(body): Json<EditMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    body.validate().map_err(validation_error)?;

    let message = state.messages.edit(message_id, me.user_id, &body.content).await?;

    Ok(Json(MessageResponse::with_sender(message, Some(me.username))))
}

/// Delete a message for everyone (`?for_all=true`) or hard-delete it
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<Json<DeleteMessageResponse>, AppError> {
    let message_id = parse_id(&message_id, "message")?;

    let outcome = state
        .messages
        .delete(message_id, me.user_id, query.for_all)
        .await?;

    Ok(Json(DeleteMessageResponse {
        message_id: message_id.to_string(),
        outcome,
    }))
}

/// React to a message
pub async fn add_reaction(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Json(body): Json<AddReactionRequest>,
) -> Result<Json<ReactionsResponse>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    body.validate().map_err(validation_error)?;

    let reactions = state
        .messages
        .add_reaction(message_id, me.user_id, &body.emoji)
        .await?;

    Ok(Json(ReactionsResponse::new(message_id, &reactions)))
}

/// Withdraw a reaction (`?emoji=`)
pub async fn remove_reaction(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(message_id): Path<String>,
    Query(query): Query<RemoveReactionQuery>,
) -> Result<Json<ReactionsResponse>, AppError> {
    let message_id = parse_id(&message_id, "message")?;

    let reactions = state
        .messages
        .remove_reaction(message_id, me.user_id, &query.emoji)
        .await?;

    Ok(Json(ReactionsResponse::new(message_id, &reactions)))
}

/// Mark a message as read by the caller
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(message_id): Path<String>,
) -> Result<Json<MessageReadResponse>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    let read = state.messages.mark_read(message_id, me.user_id).await?;
    Ok(Json(MessageReadResponse::from(read)))
}

/// Who read a message, and when
pub async fn read_receipts(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<Vec<ReadReceiptResponse>>, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    let receipts = state.messages.read_receipts(message_id).await?;
    Ok(Json(receipts.into_iter().map(ReadReceiptResponse::from).collect()))
}
