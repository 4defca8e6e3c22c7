mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::{assert_error, LiveDb, TestApp, SEED_PASSWORD};
use serde_json::{json, Value};

async fn login(app: &TestApp, email: &str, password: &str) -> Result<(StatusCode, Value)> {
    app.request(
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn login_issues_a_working_token() -> Result<()> {
    let Some(db) = LiveDb::start().await? else { return Ok(()) };
    let seed = db.seed().await?;
    let app = TestApp::live(&db, &seed);

    // Email match ignores case and surrounding whitespace
    let (status, body) = login(&app, "  Amina@Agency.TEST ", SEED_PASSWORD).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let data = &body["data"];
    assert_eq!(data["staff"]["staff_id"], seed.staff_id);
    assert_eq!(data["staff"]["staff_email"], "amina@agency.test");
    assert_eq!(data["staff"]["role_name"], "Administrator");
    assert!(data["expires_in"].as_i64().unwrap_or_default() > 0);
    assert!(data["staff"].get("password").is_none());

    let token = data["token"].as_str().unwrap_or_default().to_string();
    let (status, body) = app.request(Method::GET, "/api/auth/whoami", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["staff_id"], seed.staff_id);
    assert_eq!(body["data"]["role_id"], seed.role_id);

    db.finish().await
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() -> Result<()> {
    let Some(db) = LiveDb::start().await? else { return Ok(()) };
    let seed = db.seed().await?;
    let app = TestApp::live(&db, &seed);

    let (status, wrong) = login(&app, "amina@agency.test", "not-the-password").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, unknown) = login(&app, "nobody@agency.test", SEED_PASSWORD).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(assert_error(&wrong, "UNAUTHORIZED"), "Invalid email or password");
    assert_eq!(wrong, unknown);

    db.finish().await
}

#[tokio::test]
async fn inactive_staff_are_refused_after_the_password_check() -> Result<()> {
    let Some(db) = LiveDb::start().await? else { return Ok(()) };
    let seed = db.seed().await?;
    db.insert_staff("Karim Nasser", "karim@agency.test", seed.role_id, "inactive").await?;
    let app = TestApp::live(&db, &seed);

    let (status, body) = login(&app, "karim@agency.test", SEED_PASSWORD).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(assert_error(&body, "FORBIDDEN"), "Account is inactive");

    // A wrong password never reveals the account state
    let (status, _) = login(&app, "karim@agency.test", "not-the-password").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    db.finish().await
}
