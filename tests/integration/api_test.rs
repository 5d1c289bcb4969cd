//! HTTP API integration tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use dmrelay::backend::auth::sessions::create_token;

use crate::common::{add_user, bearer, seeded_users, test_app, TEST_SECRET};

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(user_id))
        .body(Body::empty())
        .unwrap()
}

fn send(method: Method, uri: &str, user_id: Uuid, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(user_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app(&seeded_users());
    let (status, body) = call(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 200);
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let users = seeded_users();
    let app = test_app(&users);

    let (status, body) = call(
        &app,
        Request::builder()
            .uri("/api/messages/unread-count")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    let forged = create_token(users.alice, "some-other-secret", 3600).unwrap();
    let (status, _) = call(
        &app,
        Request::builder()
            .uri("/api/messages/unread-count")
            .header(header::AUTHORIZATION, format!("Bearer {}", forged))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, but nobody the directory knows
    let (status, _) = call(&app, get("/api/messages/unread-count", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_send_list_and_unread_flow() {
    let users = seeded_users();
    let app = test_app(&users);

    let (status, body) = call(
        &app,
        send(
            Method::POST,
            "/api/messages/send",
            users.alice,
            json!({ "receiver_id": users.bob, "content": "hello bob" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Message sent successfully");
    assert_eq!(body["data"]["content"], "hello bob");
    assert_eq!(body["data"]["sender_name"], "Alice Archer");
    assert_eq!(body["data"]["is_read"], false);
    let conversation_id = body["data"]["conversation_id"].as_i64().unwrap();

    let (status, body) = call(&app, get("/api/messages/conversations", users.bob)).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], conversation_id);
    assert_eq!(list[0]["other_participant_name"], "Alice Archer");
    assert_eq!(list[0]["unread_count"], 1);

    let (_, body) = call(&app, get("/api/messages/unread-count", users.bob)).await;
    assert_eq!(body["data"], 1);

    let (status, body) = call(
        &app,
        send(
            Method::PUT,
            &format!("/api/messages/conversations/{}/read", conversation_id),
            users.bob,
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], true);

    let (_, body) = call(&app, get("/api/messages/unread-count", users.bob)).await;
    assert_eq!(body["data"], 0);
}

#[tokio::test]
async fn test_query_token_is_accepted() {
    let users = seeded_users();
    let app = test_app(&users);
    let token = create_token(users.bob, TEST_SECRET, 3600).unwrap();

    let (status, body) = call(
        &app,
        Request::builder()
            .uri(format!("/api/messages/unread-count?access_token={}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], 0);
}

#[tokio::test]
async fn test_conversation_access_errors() {
    let users = seeded_users();
    let mallory = add_user(&users, "Mallory", "Mole");
    let app = test_app(&users);

    let (_, body) = call(
        &app,
        send(
            Method::POST,
            &format!("/api/messages/conversations/with/{}", users.bob),
            users.alice,
            json!({}),
        ),
    )
    .await;
    let conversation_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["total_messages"], 0);

    let uri = format!("/api/messages/conversations/{}", conversation_id);
    let (status, body) = call(&app, get(&uri, mallory)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not part of this conversation");

    let (status, body) = call(&app, get("/api/messages/conversations/9999", users.alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Conversation not found");

    let (status, body) = call(
        &app,
        send(
            Method::POST,
            "/api/messages/send",
            users.alice,
            json!({ "receiver_id": users.alice, "content": "me" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let users = seeded_users();
    let app = test_app(&users);
    let (status, body) = call(&app, get("/api/nothing-here", users.alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}
