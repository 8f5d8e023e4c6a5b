//! Request DTOs
//!
//! Data structures for API request bodies and query strings. Ids travel as
//! strings and are parsed in the handlers.

use serde::Deserialize;
use validator::Validate;

/// Start (or reopen) a private chat
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrivateRoomRequest {
    #[validate(length(min = 1, message = "other_user_id is required"))]
    pub other_user_id: String,
}

/// Invite users into a non-public group
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMembersRequest {
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub user_ids: Vec<String>,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(max = 4000, message = "Message content must be at most 4000 characters"))]
    pub content: String,

    /// TEXT (default), IMAGE, VIDEO, AUDIO or FILE
    #[serde(rename = "type")]
    pub message_type: Option<String>,

    pub file_url: Option<String>,
}

/// Edit message request
#[derive(Debug, Deserialize, Validate)]
pub struct EditMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message content must be 1-4000 characters"))]
    pub content: String,
}

/// Add reaction request
#[derive(Debug, Deserialize, Validate)]
pub struct AddReactionRequest {
    #[validate(length(min = 1, message = "Emoji is required"))]
    pub emoji: String,
}

/// `DELETE /messages/{id}` query
#[derive(Debug, Default, Deserialize)]
pub struct DeleteMessageQuery {
    #[serde(default)]
    pub for_all: bool,
}

/// `DELETE /messages/{id}/reactions` query
#[derive(Debug, Deserialize)]
pub struct RemoveReactionQuery {
    pub emoji: String,
}
