//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use chat_backend::config::Settings;
use chat_backend::domain::Identity;
use chat_backend::infrastructure::auth::Claims;
use chat_backend::presentation::http::routes::create_router;
use chat_backend::startup::AppState;

pub const JWT_SECRET: &str = "integration-test-secret-with-enough-length";

const BOUNDARY: &str = "chat-backend-test-boundary";

/// One part of a multipart request body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Test application on the in-memory store
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upload_dir: PathBuf,
}

impl TestApp {
    /// Create a new test application with a private upload directory
    pub async fn new() -> Self {
        let upload_dir =
            std::env::temp_dir().join(format!("chat-backend-test-{}", uuid::Uuid::new_v4()));
        let settings = Settings::for_tests(JWT_SECRET, &upload_dir.to_string_lossy())
            .expect("test settings");
        let state = AppState::in_memory(settings);

        Self {
            router: create_router(state.clone()),
            state,
            upload_dir,
        }
    }

    /// Make a user known to the directory and return a bearer token for them
    pub async fn login(&self, user_id: i64, username: &str) -> String {
        let identity = Identity {
            user_id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
        };
        self.state
            .users
            .remember(&identity)
            .await
            .expect("remember identity");
        token_for(user_id, username)
    }

    /// Send a request with an optional JSON body and return status plus JSON
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Send a multipart/form-data request
    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    /// Create a group through the API and return its id
    pub async fn create_group(&self, token: &str, name: &str, member_ids: &[i64]) -> String {
        let ids: Vec<String> = member_ids.iter().map(|id| id.to_string()).collect();
        let mut parts = vec![Part::Text("name", name)];
        parts.extend(ids.iter().map(|id| Part::Text("user_ids", id.as_str())));

        let (status, body) = self
            .multipart(Method::POST, "/api/v1/rooms/group", token, &parts)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Send a text message through the API and return its id
    pub async fn send_text(&self, token: &str, room_id: &str, content: &str) -> String {
        let (status, body) = self
            .post_json(
                &format!("/api/v1/rooms/{}/messages", room_id),
                token,
                serde_json::json!({ "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

/// Sign a token the way the auth service does
pub fn token_for(user_id: i64, username: &str) -> String {
    sign(user_id, username, JWT_SECRET, Duration::hours(1))
}

pub fn sign(user_id: i64, username: &str, secret: &str, expires_in: Duration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        exp: (now + expires_in).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
