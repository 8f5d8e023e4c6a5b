//! Room Handlers

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::form::MultipartForm;
use crate::application::dto::request::{CreatePrivateRoomRequest, InviteMembersRequest};
use crate::application::dto::response::{InviteLinkResponse, MemberResponse, RoomResponse};
use crate::application::services::{CreateGroupDto, UpdateGroupDto};
use crate::infrastructure::metrics;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, parse_id_list, validation_error};
use crate::startup::AppState;

/// List every room
pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = state.rooms.list_rooms().await?;
    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// Create a group room from a multipart form
///
/// Parts: `name`, `user_ids` (repeated or comma separated), `is_public`,
/// optional `avatar` file.
pub async fn create_group(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let request = CreateGroupDto {
        name: form.text("name").unwrap_or_default().to_string(),
        member_ids: parse_id_list(form.texts("user_ids")),
        is_public: form.flag("is_public")?.unwrap_or(false),
        avatar: form.take_file("avatar"),
    };

    let room = state.rooms.create_group(me.user_id, request).await?;
    metrics::record_room_created(room.room_type.as_str());

    Ok((StatusCode::CREATED, Json(RoomResponse::from(room))))
}

/// Get or create the private room with another user
pub async fn get_or_create_private(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Json(body): Json<CreatePrivateRoomRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    body.validate().map_err(validation_error)?;
    let other_user_id = parse_id(&body.other_user_id, "user")?;

    let private = state.rooms.get_or_create_private(&me, other_user_id).await?;
    if private.created {
        metrics::record_room_created(private.room.room_type.as_str());
    }

    Ok(Json(RoomResponse::from(private.room)))
}

/// Update a group's name, avatar or visibility
pub async fn update_group(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<RoomResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let mut form = MultipartForm::read(multipart).await?;

    let request = UpdateGroupDto {
        name: form.text("name").map(str::to_string),
        is_public: form.flag("is_public")?,
        avatar: form.take_file("avatar"),
    };

    let room = state.rooms.update_group(room_id, me.user_id, request).await?;

    Ok(Json(RoomResponse::from(room)))
}

/// Delete a group room with everything in it
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    state.rooms.delete_group(room_id, me.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add users to a group
pub async fn invite_members(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
    Json(body): Json<InviteMembersRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    body.validate().map_err(validation_error)?;

    let room = state
        .rooms
        .invite_members(room_id, me.user_id, parse_id_list(&body.user_ids))
        .await?;

    Ok(Json(RoomResponse::from(room)))
}

/// Shareable link for a public group
pub async fn invite_link(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<Json<InviteLinkResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let invite_link = state.rooms.invite_link(room_id, me.user_id).await?;
    Ok(Json(InviteLinkResponse { invite_link }))
}

/// Join a public group
pub async fn join_public(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let room = state.rooms.join_public(room_id, me.user_id).await?;
    Ok(Json(RoomResponse::from(room)))
}

/// Members of a room (members only)
pub async fn get_members(
    State(state): State<AppState>,
    Extension(AuthUser(me)): Extension<AuthUser>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    let room_id = parse_id(&room_id, "room")?;
    let members = state.rooms.get_members(room_id, me.user_id).await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}
