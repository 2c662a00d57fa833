use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use hub_db::models::MessageRow;
use hub_types::api::{Ack, CreateMessageRequest, FeedResponse};
use hub_types::models::{Author, Message};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, json_body, malformed_body};
use crate::middleware::Identity;
use crate::ownership::delete_owned;
use crate::validation::{parse_id, validate_content};

/// GET /feed: every message, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> Result<Json<FeedResponse>, ApiError> {
    let rows = blocking(&state, |st| Ok(st.db.list_messages()?)).await?;

    Ok(Json(rows.into_iter().map(message_from_row).collect()))
}

/// POST /feed
pub async fn create_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let CreateMessageRequest { content } = json_body(body, malformed_body())?;
    validate_content(&content)?;

    let row = blocking(&state, move |st| {
        Ok(st.db.insert_message(identity.user_id, &content)?)
    })
    .await?;
    info!("Message {} posted by user {}", row.id, identity.user_id);

    Ok((StatusCode::CREATED, Json(message_from_row(row))))
}

/// DELETE /feed/{id}, author only. Replies go with the message.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Ack>, ApiError> {
    let id = parse_id(&raw_id)?;

    blocking(&state, move |st| {
        delete_owned(
            identity,
            "Message",
            id,
            |id| st.db.get_message(id),
            |id| st.db.delete_message(id),
        )
    })
    .await?;

    Ok(Json(Ack::new("Message deleted")))
}

pub(crate) fn message_from_row(row: MessageRow) -> Message {
    let created_at = parse_timestamp(&row.created_at, "message", row.id);
    Message {
        id: row.id,
        content: row.content,
        author_id: row.author_id,
        created_at,
        author: Author {
            name: row.author_name,
            email: row.author_email,
        },
    }
}

/// Stored timestamps are RFC 3339. Rows written by hand through the sqlite
/// shell may use SQLite's "YYYY-MM-DD HH:MM:SS" form instead.
pub(crate) fn parse_timestamp(raw: &str, kind: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, kind, id, e);
            DateTime::default()
        })
}
