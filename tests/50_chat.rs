mod common;

use agency_api::permissions::{Action, MemoryPermissionStore};
use anyhow::Result;
use axum::http::StatusCode;
use common::{assert_error, TestApp, ROLE_ID, STAFF_ID};
use serde_json::json;

fn chatter() -> MemoryPermissionStore {
    MemoryPermissionStore::new().with_grant(ROLE_ID, "chat", &[Action::View, Action::Add])
}

#[tokio::test]
async fn blank_messages_are_422() -> Result<()> {
    let app = TestApp::new(chatter())?;
    let (status, body) = app.post("/api/chat/9", json!({ "body": "   " })).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error(&body, "UNPROCESSABLE_ENTITY");
    assert_eq!(body["field_errors"]["body"], "is required");
    Ok(())
}

#[tokio::test]
async fn long_messages_are_422() -> Result<()> {
    let app = TestApp::new(chatter())?;
    let (status, body) = app.post("/api/chat/9", json!({ "body": "a".repeat(2001) })).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field_errors"]["body"], "must be at most 2000 characters");
    Ok(())
}

#[tokio::test]
async fn messaging_yourself_is_refused() -> Result<()> {
    let app = TestApp::new(chatter())?;
    let (status, body) = app.post(&format!("/api/chat/{}", STAFF_ID), json!({ "body": "note to self" })).await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field_errors"]["receiver_id"], "cannot send a message to yourself");
    Ok(())
}

#[tokio::test]
async fn chat_requires_the_chat_page() -> Result<()> {
    let app = TestApp::new(MemoryPermissionStore::new().with_grant(ROLE_ID, "chat", &[Action::View]))?;

    let (status, body) = app.post("/api/chat/9", json!({ "body": "hello" })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(assert_error(&body, "FORBIDDEN"), "Permission denied: add on chat");

    let app = TestApp::without_grants()?;
    for uri in ["/api/chat/conversations", "/api/chat/unread", "/api/chat/9"] {
        let (status, _) = app.get(uri).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
    Ok(())
}
