mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{LiveDb, Seed, TestApp};
use serde_json::{json, Value};

async fn unread(app: &TestApp, token: &str) -> Result<i64> {
    let (status, body) = app.request(Method::GET, "/api/chat/unread", Some(token), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    Ok(body["data"]["unread"].as_i64().unwrap_or(-1))
}

#[tokio::test]
async fn reading_a_thread_marks_incoming_messages_read() -> Result<()> {
    let Some(db) = LiveDb::start().await? else { return Ok(()) };
    let seed = db.seed().await?;
    let app = TestApp::live(&db, &seed);

    for body in ["Flight moved to 9am", "Can you confirm?"] {
        sqlx::query("INSERT INTO chat_messages (sender_id, receiver_id, body) VALUES ($1, $2, $3)")
            .bind(seed.colleague_id)
            .bind(seed.staff_id)
            .bind(body)
            .execute(&db.pool)
            .await?;
    }
    assert_eq!(unread(&app, &app.token()).await?, 2);

    let (status, body) = app.get("/api/chat/conversations").await?;
    assert_eq!(status, StatusCode::OK);
    let conversation = &body["data"][0];
    assert_eq!(conversation["staff_id"], seed.colleague_id);
    assert_eq!(conversation["staff_name"], "Bilal Saeed");
    assert_eq!(conversation["last_message"], "Can you confirm?");
    assert_eq!(conversation["last_from_me"], false);
    assert_eq!(conversation["unread"], 2);

    let (status, body) = app.get(&format!("/api/chat/{}", seed.colleague_id)).await?;
    assert_eq!(status, StatusCode::OK);
    let messages = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["body"], "Can you confirm?");
    assert_eq!(unread(&app, &app.token()).await?, 0);

    let (status, body) = app
        .post(&format!("/api/chat/{}", seed.colleague_id), json!({ "body": "  Confirmed  " }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["body"], "Confirmed");
    assert_eq!(body["data"]["is_read"], false);

    let colleague = app.token_for(seed.colleague_id, seed.role_id);
    assert_eq!(unread(&app, &colleague).await?, 1);

    db.finish().await
}

fn ticket(seed: &Seed, pnr: &str, net_price: i64, sale: i64) -> Value {
    json!({
        "pnr": pnr,
        "passenger_name": "Omar Haddad",
        "customer_id": seed.customer_id,
        "supp_id": seed.supplier_id,
        "from_place": "DXB",
        "to_place": "CAI",
        "flight_date": "2026-12-01",
        "net_price": net_price,
        "sale": sale,
        "currency_id": seed.currency_id
    })
}

/// Window around today wide enough to hold rows stamped in any database time zone
fn around_today() -> String {
    let today = Utc::now().date_naive();
    format!(
        "period=custom&from={}&to={}",
        today - Duration::days(2),
        today + Duration::days(2)
    )
}

#[tokio::test]
async fn analytics_roll_up_recorded_sales() -> Result<()> {
    let Some(db) = LiveDb::start().await? else { return Ok(()) };
    let seed = db.seed().await?;
    let app = TestApp::live(&db, &seed);

    for (pnr, net, sale) in [("AB12CD", 1000, 1300), ("EF34GH", 500, 700)] {
        let (status, body) = app.post("/api/data/tickets", ticket(&seed, pnr, net, sale)).await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }
    let colleague = app.token_for(seed.colleague_id, seed.role_id);
    let visa = json!({
        "passenger_name": "Noor Ali",
        "customer_id": seed.customer_id,
        "supp_id": seed.supplier_id,
        "country_name": "Oman",
        "net_price": 100,
        "sale": 250,
        "currency_id": seed.currency_id
    });
    let (status, body) = app.request(Method::POST, "/api/data/visas", Some(&colleague), Some(visa)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let expense_type: i64 =
        sqlx::query_scalar("INSERT INTO expense_types (expense_type) VALUES ('Rent') RETURNING expense_type_id")
            .fetch_one(&db.pool)
            .await?;
    sqlx::query(
        "INSERT INTO expenses (expense_type_id, amount, currency_id, expense_date) VALUES ($1, 150, $2, CURRENT_DATE)",
    )
    .bind(expense_type)
    .bind(seed.currency_id)
    .execute(&db.pool)
    .await?;

    let (status, body) = app.get(&format!("/api/analytics/summary?{}", around_today())).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let summary = &body["data"];
    assert_eq!(summary["period"], "custom");
    let tickets = summary["modules"]
        .as_array()
        .and_then(|m| m.iter().find(|m| m["module"] == "tickets"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(tickets["current"]["count"], 2);
    assert_eq!(tickets["current"]["sales"].as_f64(), Some(2000.0));
    assert_eq!(tickets["current"]["profit"].as_f64(), Some(500.0));
    assert_eq!(tickets["previous"]["count"], 0);
    assert_eq!(tickets["change"]["count"].as_f64(), Some(100.0));
    assert_eq!(summary["expenses"]["current"].as_f64(), Some(150.0));
    // 500 ticket profit + 150 visa profit - 150 expenses
    assert_eq!(summary["net_profit"]["current"].as_f64(), Some(500.0));

    let (status, body) = app.get(&format!("/api/analytics/staff?{}", around_today())).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let ranked = body["data"]["staff"].as_array().cloned().unwrap_or_default();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["staff_id"], seed.staff_id);
    assert_eq!(ranked[0]["staff_name"], "Amina Haddad");
    assert_eq!(ranked[0]["modules"]["tickets"]["count"], 2);
    assert_eq!(ranked[1]["staff_id"], seed.colleague_id);
    assert_eq!(ranked[1]["sales"].as_f64(), Some(250.0));

    let (year, month): (i32, i32) = sqlx::query_as(
        "SELECT EXTRACT(YEAR FROM created_at)::INT, EXTRACT(MONTH FROM created_at)::INT FROM tickets LIMIT 1",
    )
    .fetch_one(&db.pool)
    .await?;
    let (status, body) = app.get(&format!("/api/analytics/monthly?year={}", year)).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let buckets = body["data"]["modules"]["tickets"].as_array().cloned().unwrap_or_default();
    assert_eq!(buckets.len(), 12);
    let bucket = &buckets[(month - 1) as usize];
    assert_eq!(bucket["month"], month);
    assert_eq!(bucket["count"], 2);
    assert_eq!(bucket["sales"].as_f64(), Some(2000.0));
    let total: i64 = buckets.iter().filter_map(|b| b["count"].as_i64()).sum();
    assert_eq!(total, 2);

    db.finish().await
}
