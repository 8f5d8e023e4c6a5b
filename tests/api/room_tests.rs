//! Room API Tests

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{sign, Part, TestApp};

#[tokio::test]
async fn test_room_routes_require_authentication() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::POST, "/api/v1/rooms/private", None, Some(json!({ "other_user_id": "2" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 10003);

    let (status, _) = app
        .request(Method::POST, "/api/v1/rooms/private", Some("not-a-jwt"), Some(json!({ "other_user_id": "2" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new().await;
    let expired = sign(1, "alice", crate::common::JWT_SECRET, chrono::Duration::hours(-2));

    let (status, _) = app.get("/api/v1/rooms/1/members", Some(&expired)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_group_and_list_rooms() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    app.login(2, "bob").await;

    // 99 was never seen and is skipped
    let room_id = app.create_group(&alice, "general", &[2, 99]).await;

    let (status, rooms) = app.get("/api/v1/rooms", None).await;
    assert_eq!(status, StatusCode::OK);
    let rooms = rooms.as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["id"], room_id.as_str());
    assert_eq!(rooms[0]["name"], "general");
    assert_eq!(rooms[0]["type"], "GROUP");
    assert_eq!(rooms[0]["members"], json!(["1", "2"]));
}

#[tokio::test]
async fn test_duplicate_group_name_conflicts() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    app.create_group(&alice, "general", &[]).await;

    let (status, body) = app
        .multipart(Method::POST, "/api/v1/rooms/group", &alice, &[Part::Text("name", "general")])
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 10005);
}

#[tokio::test]
async fn test_blank_group_name_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;

    let (status, _) = app
        .multipart(Method::POST, "/api/v1/rooms/group", &alice, &[Part::Text("name", "   ")])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_private_room_is_shared_by_both_users() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let bob = app.login(2, "bob").await;

    let (status, first) = app
        .post_json("/api/v1/rooms/private", &alice, json!({ "other_user_id": "2" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["type"], "PRIVATE");
    assert_eq!(first["members"], json!(["1", "2"]));

    let (_, second) = app
        .post_json("/api/v1/rooms/private", &bob, json!({ "other_user_id": "1" }))
        .await;
    assert_eq!(second["id"], first["id"]);

    let (_, rooms) = app.get("/api/v1/rooms", None).await;
    assert_eq!(rooms.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_private_room_with_unknown_user_is_404() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;

    let (status, _) = app
        .post_json("/api/v1/rooms/private", &alice, json!({ "other_user_id": "42" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post_json("/api/v1/rooms/private", &alice, json!({ "other_user_id": "abc" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_members_update_a_group() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let mallory = app.login(3, "mallory").await;
    let room_id = app.create_group(&alice, "general", &[]).await;
    let uri = format!("/api/v1/rooms/{}", room_id);

    let (status, _) = app
        .multipart(Method::PATCH, &uri, &mallory, &[Part::Text("name", "hijacked")])
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, room) = app
        .multipart(Method::PATCH, &uri, &alice, &[Part::Text("name", "renamed")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["name"], "renamed");
}

#[tokio::test]
async fn test_invite_link_and_join_require_public_group() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let carol = app.login(3, "carol").await;
    let room_id = app.create_group(&alice, "book club", &[]).await;

    let link_uri = format!("/api/v1/rooms/{}/invite-link", room_id);
    let join_uri = format!("/api/v1/rooms/{}/join", room_id);

    let (status, _) = app.get(&link_uri, Some(&alice)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.request(Method::POST, &join_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, room) = app
        .multipart(
            Method::PATCH,
            &format!("/api/v1/rooms/{}", room_id),
            &alice,
            &[Part::Text("is_public", "true")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["is_public"], true);

    let (status, body) = app.get(&link_uri, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["invite_link"],
        format!("http://localhost:3000/join/{}", room_id)
    );

    let (status, room) = app.request(Method::POST, &join_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["members"], json!(["1", "3"]));
}

#[tokio::test]
async fn test_invite_members_and_list_them() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    app.login(2, "bob").await;
    let room_id = app.create_group(&alice, "team", &[]).await;

    let (status, room) = app
        .post_json(
            &format!("/api/v1/rooms/{}/invite", room_id),
            &alice,
            json!({ "user_ids": ["2", "77"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["members"], json!(["1", "2"]));

    let (status, members) = app
        .get(&format!("/api/v1/rooms/{}/members", room_id), Some(&alice))
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = members
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_outsiders_cannot_list_members() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let mallory = app.login(3, "mallory").await;
    let room_id = app.create_group(&alice, "team", &[]).await;

    let (status, _) = app
        .get(&format!("/api/v1/rooms/{}/members", room_id), Some(&mallory))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_group_removes_its_messages() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let room_id = app.create_group(&alice, "temp", &[]).await;
    app.send_text(&alice, &room_id, "bye").await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/rooms/{}", room_id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(&format!("/api/v1/rooms/{}/messages", room_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_avatar_is_stored_and_served() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let png = [0x89, b'P', b'N', b'G', 1, 2, 3];

    let (status, room) = app
        .multipart(
            Method::POST,
            "/api/v1/rooms/group",
            &alice,
            &[
                Part::Text("name", "pictures"),
                Part::File {
                    name: "avatar",
                    filename: "me.png",
                    content_type: "image/png",
                    bytes: &png,
                },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let avatar_url = room["avatar_url"].as_str().unwrap();
    assert!(avatar_url.starts_with("/uploads/avatars/"));
    assert!(avatar_url.ends_with(".png"));

    let (status, _) = app.get(avatar_url, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_image_avatar_creates_no_room() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;

    let (status, _) = app
        .multipart(
            Method::POST,
            "/api/v1/rooms/group",
            &alice,
            &[
                Part::Text("name", "docs"),
                Part::File {
                    name: "avatar",
                    filename: "notes.txt",
                    content_type: "text/plain",
                    bytes: b"hello",
                },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, rooms) = app.get("/api/v1/rooms", None).await;
    assert_eq!(rooms, json!([]));
}
