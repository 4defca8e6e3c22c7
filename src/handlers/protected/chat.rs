// /api/chat/* - direct messages between staff members

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::{json_body, path_params, query_params};
use crate::middleware::{ApiResponse, ApiResult, AuthStaff};
use crate::permissions::{require, Action};

const PAGE: &str = "chat";
const MAX_BODY_CHARS: usize = 2000;
const DEFAULT_THREAD_LIMIT: i64 = 50;
const MAX_THREAD_LIMIT: i64 = 200;

#[derive(Debug, Serialize, FromRow)]
pub struct ChatMessage {
    pub message_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Conversation {
    pub staff_id: i64,
    pub staff_name: Option<String>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub last_from_me: bool,
    pub unread: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThreadQuery {
    /// Only messages older than this message id
    pub before: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub body: String,
}

/// Trimmed message text, 1 to 2000 characters
fn message_body(raw: &str) -> Result<String, ApiError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(ApiError::field_error("body", "is required"));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(ApiError::field_error(
            "body",
            format!("must be at most {} characters", MAX_BODY_CHARS),
        ));
    }
    Ok(body.to_string())
}

fn thread_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_THREAD_LIMIT).clamp(1, MAX_THREAD_LIMIT)
}

async fn staff_exists(state: &AppState, staff_id: i64) -> Result<(), ApiError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM staff WHERE staff_id = $1)")
        .bind(staff_id)
        .fetch_one(&state.pool)
        .await?;
    if found {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("staff {} not found", staff_id)))
    }
}

/// GET /api/chat/conversations - one row per counterpart, newest first
pub async fn conversations(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
) -> ApiResult<Vec<Conversation>> {
    require(&state, &staff, PAGE, Action::View).await?;

    let rows: Vec<Conversation> = sqlx::query_as(
        "SELECT l.staff_id, s.staff_name, l.last_message, l.last_message_at, l.last_from_me, \
                (SELECT COUNT(*) FROM chat_messages u \
                  WHERE u.sender_id = l.staff_id AND u.receiver_id = $1 AND NOT u.is_read) AS unread \
         FROM ( \
             SELECT DISTINCT ON (counterpart) counterpart AS staff_id, body AS last_message, \
                    created_at AS last_message_at, sender_id = $1 AS last_from_me \
             FROM ( \
                 SELECT m.*, CASE WHEN m.sender_id = $1 THEN m.receiver_id ELSE m.sender_id END AS counterpart \
                 FROM chat_messages m WHERE m.sender_id = $1 OR m.receiver_id = $1 \
             ) c \
             ORDER BY counterpart, created_at DESC, message_id DESC \
         ) l \
         LEFT JOIN staff s ON s.staff_id = l.staff_id \
         ORDER BY l.last_message_at DESC",
    )
    .bind(staff.staff_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(rows))
}

/// GET /api/chat/unread - total unread messages for the caller
pub async fn unread(State(state): State<AppState>, Extension(staff): Extension<AuthStaff>) -> ApiResult<Value> {
    require(&state, &staff, PAGE, Action::View).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE receiver_id = $1 AND NOT is_read")
        .bind(staff.staff_id)
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::success(json!({ "unread": count })))
}

/// GET /api/chat/:staff_id?before&limit - messages with one staff member,
/// newest first. Incoming messages are marked read.
pub async fn thread(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<ThreadQuery>, QueryRejection>,
) -> ApiResult<Vec<ChatMessage>> {
    let other = path_params(path)?;
    let query = query_params(query)?;
    require(&state, &staff, PAGE, Action::View).await?;
    staff_exists(&state, other).await?;

    let mut tx = state.pool.begin().await?;
    let marked = sqlx::query(
        "UPDATE chat_messages SET is_read = TRUE WHERE sender_id = $1 AND receiver_id = $2 AND NOT is_read",
    )
    .bind(other)
    .bind(staff.staff_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let messages: Vec<ChatMessage> = sqlx::query_as(
        "SELECT message_id, sender_id, receiver_id, body, is_read, created_at FROM chat_messages \
         WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)) \
           AND ($3::BIGINT IS NULL OR message_id < $3) \
         ORDER BY message_id DESC LIMIT $4",
    )
    .bind(staff.staff_id)
    .bind(other)
    .bind(query.before)
    .bind(thread_limit(query.limit))
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;

    if marked > 0 {
        tracing::debug!(staff_id = staff.staff_id, from = other, marked, "Marked messages read");
    }
    Ok(ApiResponse::success(messages))
}

/// POST /api/chat/:staff_id - send a message
pub async fn send(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthStaff>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<ChatMessage> {
    let receiver = path_params(path)?;
    require(&state, &staff, PAGE, Action::Add).await?;

    let body = message_body(&json_body(payload)?.body)?;
    if receiver == staff.staff_id {
        return Err(ApiError::field_error("receiver_id", "cannot send a message to yourself"));
    }
    staff_exists(&state, receiver).await?;

    let message: ChatMessage = sqlx::query_as(
        "INSERT INTO chat_messages (sender_id, receiver_id, body) VALUES ($1, $2, $3) \
         RETURNING message_id, sender_id, receiver_id, body, is_read, created_at",
    )
    .bind(staff.staff_id)
    .bind(receiver)
    .bind(&body)
    .fetch_one(&state.pool)
    .await?;

    tracing::debug!(message_id = message.message_id, from = staff.staff_id, to = receiver, "Chat message sent");
    Ok(ApiResponse::created(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_trimmed_and_bounded() {
        assert_eq!(message_body("  hello  ").unwrap(), "hello");
        assert!(message_body("   ").is_err());
        assert!(message_body(&"x".repeat(2000)).is_ok());
        let err = message_body(&"é".repeat(2001)).unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["body"], "must be at most 2000 characters");
    }

    #[test]
    fn thread_limit_is_clamped() {
        assert_eq!(thread_limit(None), 50);
        assert_eq!(thread_limit(Some(0)), 1);
        assert_eq!(thread_limit(Some(10_000)), 200);
    }
}
