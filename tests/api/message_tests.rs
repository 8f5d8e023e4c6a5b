//! Message API Tests

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{Part, TestApp};

/// alice (1) and bob (2) share a group; mallory (3) is an outsider
struct Chat {
    app: TestApp,
    alice: String,
    bob: String,
    mallory: String,
    room_id: String,
}

impl Chat {
    async fn new() -> Self {
        let app = TestApp::new().await;
        let alice = app.login(1, "alice").await;
        let bob = app.login(2, "bob").await;
        let mallory = app.login(3, "mallory").await;
        let room_id = app.create_group(&alice, "general", &[2]).await;
        Self {
            app,
            alice,
            bob,
            mallory,
            room_id,
        }
    }

    fn messages_uri(&self) -> String {
        format!("/api/v1/rooms/{}/messages", self.room_id)
    }

    async fn list(&self) -> serde_json::Value {
        let (status, body) = self.app.get(&self.messages_uri(), None).await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

#[tokio::test]
async fn test_send_and_list_messages() {
    let chat = Chat::new().await;
    chat.app.send_text(&chat.alice, &chat.room_id, "hello").await;
    chat.app.send_text(&chat.bob, &chat.room_id, "hi alice").await;

    let messages = chat.list().await;
    let messages = messages.as_array().unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[0]["sender_username"], "alice");
    assert_eq!(messages[0]["type"], "TEXT");
    assert_eq!(messages[1]["sender_id"], "2");
    assert_eq!(messages[1]["is_edited"], false);
}

#[tokio::test]
async fn test_outsider_cannot_send() {
    let chat = Chat::new().await;

    let (status, _) = chat
        .app
        .post_json(&chat.messages_uri(), &chat.mallory, json!({ "content": "let me in" }))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(chat.list().await, json!([]));
}

#[tokio::test]
async fn test_send_validation() {
    let chat = Chat::new().await;
    let uri = chat.messages_uri();

    let (status, _) = chat.app.post_json(&uri, &chat.alice, json!({ "content": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = chat
        .app
        .post_json(&uri, &chat.alice, json!({ "content": "x", "type": "STICKER" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = chat
        .app
        .post_json(&uri, &chat.alice, json!({ "type": "IMAGE" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = chat
        .app
        .post_json(
            &uri,
            &chat.alice,
            json!({ "type": "IMAGE", "file_url": "/uploads/messages/a.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["file_url"], "/uploads/messages/a.png");
}

#[tokio::test]
async fn test_send_to_missing_room_is_404() {
    let chat = Chat::new().await;

    let (status, _) = chat
        .app
        .post_json("/api/v1/rooms/12345/messages", &chat.alice, json!({ "content": "hi" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = chat.app.get("/api/v1/rooms/not-a-number/messages", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_sender_edits() {
    let chat = Chat::new().await;
    let id = chat.app.send_text(&chat.alice, &chat.room_id, "helo").await;
    let uri = format!("/api/v1/messages/{}", id);

    let (status, _) = chat
        .app
        .request(Method::PATCH, &uri, Some(&chat.bob), Some(json!({ "content": "hacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = chat
        .app
        .request(Method::PATCH, &uri, Some(&chat.alice), Some(json!({ "content": "hello" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "hello");
    assert_eq!(body["is_edited"], true);
}

#[tokio::test]
async fn test_delete_for_all_leaves_tombstone() {
    let chat = Chat::new().await;
    let id = chat.app.send_text(&chat.alice, &chat.room_id, "oops").await;
    let uri = format!("/api/v1/messages/{}", id);

    let (status, body) = chat
        .app
        .request(Method::DELETE, &format!("{}?for_all=true", uri), Some(&chat.alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "tombstoned");

    let messages = chat.list().await;
    assert_eq!(messages[0]["deleted_for_all"], true);

    // Tombstones can't be edited
    let (status, _) = chat
        .app
        .request(Method::PATCH, &uri, Some(&chat.alice), Some(json!({ "content": "again" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_note_to_self_in_self_chat() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;

    let (status, room) = app
        .post_json("/api/v1/rooms/private", &alice, json!({ "other_user_id": "1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["members"], json!(["1"]));
    let room_id = room["id"].as_str().unwrap().to_string();

    app.send_text(&alice, &room_id, "note to self").await;

    let (status, messages) = app
        .get(&format!("/api/v1/rooms/{}/messages", room_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["sender_id"], "1");
    assert_eq!(messages[0]["content"], "note to self");
}

#[tokio::test]
async fn test_private_peer_deletes_for_both() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let bob = app.login(2, "bob").await;

    let (_, room) = app
        .post_json("/api/v1/rooms/private", &alice, json!({ "other_user_id": "2" }))
        .await;
    let room_id = room["id"].as_str().unwrap().to_string();
    let id = app.send_text(&alice, &room_id, "secret").await;

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/messages/{}?for_all=true", id),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "tombstoned");

    let (_, messages) = app
        .get(&format!("/api/v1/rooms/{}/messages", room_id), None)
        .await;
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], id.as_str());
    assert_eq!(messages[0]["deleted_for_all"], true);
}

#[tokio::test]
async fn test_plain_delete_is_sender_only() {
    let chat = Chat::new().await;
    let id = chat.app.send_text(&chat.alice, &chat.room_id, "temporary").await;
    let uri = format!("/api/v1/messages/{}", id);

    let (status, _) = chat.app.request(Method::DELETE, &uri, Some(&chat.bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A group member who didn't send it can't retract it for everyone either
    let (status, _) = chat
        .app
        .request(Method::DELETE, &format!("{}?for_all=true", uri), Some(&chat.bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = chat.app.request(Method::DELETE, &uri, Some(&chat.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "removed");
    assert_eq!(chat.list().await, json!([]));

    let (status, _) = chat.app.request(Method::DELETE, &uri, Some(&chat.alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reactions_are_idempotent_sets() {
    let chat = Chat::new().await;
    let id = chat.app.send_text(&chat.alice, &chat.room_id, "lunch?").await;
    let uri = format!("/api/v1/messages/{}/reactions", id);

    chat.app.post_json(&uri, &chat.bob, json!({ "emoji": "👍" })).await;
    let (status, body) = chat.app.post_json(&uri, &chat.bob, json!({ "emoji": "👍" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reactions"], json!({ "👍": ["2"] }));

    let (_, body) = chat.app.post_json(&uri, &chat.alice, json!({ "emoji": "👍" })).await;
    assert_eq!(body["reactions"], json!({ "👍": ["1", "2"] }));

    // 👍 percent-encoded
    let (status, body) = chat
        .app
        .request(
            Method::DELETE,
            &format!("{}?emoji=%F0%9F%91%8D", uri),
            Some(&chat.bob),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reactions"], json!({ "👍": ["1"] }));

    let (status, _) = chat.app.post_json(&uri, &chat.mallory, json!({ "emoji": "👎" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_first_read_wins_and_receipts_are_public() {
    let chat = Chat::new().await;
    let id = chat.app.send_text(&chat.alice, &chat.room_id, "read me").await;
    let read_uri = format!("/api/v1/messages/{}/read", id);

    let (status, first) = chat.app.request(Method::POST, &read_uri, Some(&chat.bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = chat.app.request(Method::POST, &read_uri, Some(&chat.bob), None).await;
    assert_eq!(second["read_at"], first["read_at"]);

    let (status, _) = chat
        .app
        .request(Method::POST, &read_uri, Some(&chat.mallory), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, receipts) = chat
        .app
        .get(&format!("/api/v1/messages/{}/reads", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipts.as_array().unwrap().len(), 1);
    assert_eq!(receipts[0]["username"], "bob");
    assert_eq!(receipts[0]["read_at"], first["read_at"]);
}

#[tokio::test]
async fn test_upload_creates_attachment_message() {
    let chat = Chat::new().await;
    let uri = format!("{}/upload", chat.messages_uri());

    let (status, body) = chat
        .app
        .multipart(
            Method::POST,
            &uri,
            &chat.alice,
            &[Part::File {
                name: "file",
                filename: "cat.png",
                content_type: "image/png",
                bytes: &[1, 2, 3, 4],
            }],
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["type"], "IMAGE");
    assert_eq!(body["content"], "cat.png");
    let file_url = body["file_url"].as_str().unwrap();
    assert!(file_url.starts_with("/uploads/messages/"));

    let (status, _) = chat.app.get(file_url, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_bad_files() {
    let chat = Chat::new().await;
    let uri = format!("{}/upload", chat.messages_uri());

    let (status, _) = chat
        .app
        .multipart(
            Method::POST,
            &uri,
            &chat.alice,
            &[Part::File {
                name: "file",
                filename: "setup.exe",
                content_type: "application/octet-stream",
                bytes: b"MZ",
            }],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = chat
        .app
        .multipart(Method::POST, &uri, &chat.alice, &[Part::Text("caption", "no file")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(chat.list().await, json!([]));
}
