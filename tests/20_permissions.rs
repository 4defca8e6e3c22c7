mod common;

use agency_api::permissions::{Action, MemoryPermissionStore};
use anyhow::Result;
use axum::http::StatusCode;
use common::{assert_error, TestApp, ROLE_ID};
use serde_json::json;

fn admin_of_permissions() -> MemoryPermissionStore {
    MemoryPermissionStore::new()
        .with_grant(ROLE_ID, "permissions", &[Action::View, Action::Edit])
        .with_grant(ROLE_ID, "tickets", &[Action::View, Action::Add])
        .with_role(5)
}

#[tokio::test]
async fn my_permissions_are_grouped_by_page() -> Result<()> {
    let app = TestApp::new(admin_of_permissions())?;
    let (status, body) = app.get("/api/auth/permissions").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tickets"], json!(["view", "add"]));
    assert_eq!(body["data"]["permissions"], json!(["view", "edit"]));
    assert!(body["data"].get("visas").is_none());
    Ok(())
}

#[tokio::test]
async fn role_matrix_covers_every_page() -> Result<()> {
    let app = TestApp::new(admin_of_permissions())?;
    let (status, body) = app.get(&format!("/api/roles/{}/permissions", ROLE_ID)).await?;

    assert_eq!(status, StatusCode::OK);
    let matrix = body["data"].as_object().expect("matrix object");
    assert_eq!(matrix.len(), agency_api::entities::pages().len());
    assert_eq!(matrix["tickets"], json!({ "view": true, "add": true, "edit": false, "delete": false }));
    assert_eq!(matrix["chat"], json!({ "view": false, "add": false, "edit": false, "delete": false }));
    Ok(())
}

#[tokio::test]
async fn replacing_grants_takes_effect_immediately() -> Result<()> {
    let app = TestApp::new(admin_of_permissions())?;

    let (status, body) = app
        .put("/api/roles/5/permissions", json!({ "visas": ["read", "create"], "analytics": ["view"] }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["visas"]["add"], true);

    let (status, body) = app.get("/api/roles/5/permissions").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["analytics"]["view"], true);
    assert_eq!(body["data"]["tickets"]["view"], false);
    Ok(())
}

#[tokio::test]
async fn unknown_pages_and_actions_are_422() -> Result<()> {
    let app = TestApp::new(admin_of_permissions())?;
    let (status, body) = app
        .put("/api/roles/5/permissions", json!({ "spaceships": ["view"], "tickets": ["approve"] }))
        .await?;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error(&body, "UNPROCESSABLE_ENTITY");
    assert_eq!(body["field_errors"]["spaceships"], "unknown page");
    assert_eq!(body["field_errors"]["tickets"], "unknown action 'approve'");
    Ok(())
}

#[tokio::test]
async fn matrix_needs_permissions_page() -> Result<()> {
    let app = TestApp::new(MemoryPermissionStore::new().with_grant(ROLE_ID, "permissions", &[Action::View]))?;

    let (status, _) = app.get(&format!("/api/roles/{}/permissions", ROLE_ID)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.put("/api/roles/1/permissions", json!({ "tickets": ["view"] })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(assert_error(&body, "FORBIDDEN"), "Permission denied: edit on permissions");
    Ok(())
}

#[tokio::test]
async fn grants_are_per_role() -> Result<()> {
    let app = TestApp::new(admin_of_permissions())?;
    let outsider = app.token_for(common::STAFF_ID, ROLE_ID + 1);

    let (status, body) = app
        .request(axum::http::Method::GET, "/api/roles/1/permissions", Some(&outsider), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(assert_error(&body, "FORBIDDEN"), "Permission denied: view on permissions");
    Ok(())
}

#[tokio::test]
async fn unknown_role_is_404_for_read_and_replace() -> Result<()> {
    let app = TestApp::new(admin_of_permissions())?;

    let (status, body) = app.get("/api/roles/99/permissions").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(assert_error(&body, "NOT_FOUND"), "Role 99 not found");

    let (status, body) = app.put("/api/roles/99/permissions", json!({ "tickets": ["view"] })).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(assert_error(&body, "NOT_FOUND"), "Role 99 not found");
    Ok(())
}
