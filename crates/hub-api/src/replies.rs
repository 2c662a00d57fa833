use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use hub_db::models::ReplyRow;
use hub_types::api::{Ack, CreateReplyRequest, ReplyPage};
use hub_types::models::{Author, Reply};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, json_body, malformed_body};
use crate::feed::parse_timestamp;
use crate::middleware::Identity;
use crate::ownership::delete_owned;
use crate::validation::{parse_id, validate_content, validate_message_id};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Paging parameters are taken leniently: anything unparsable or below 1
/// falls back to the default.
#[derive(Debug, Deserialize)]
pub struct ReplyQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ReplyQuery {
    fn page(&self) -> i64 {
        positive(self.page.as_deref()).unwrap_or(1)
    }

    fn limit(&self) -> i64 {
        positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }
}

fn positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).filter(|n| *n >= 1)
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

/// GET /reply/{message_id}?page=&limit=: oldest first, public.
pub async fn list_replies(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<ReplyQuery>,
) -> Result<Json<ReplyPage>, ApiError> {
    let message_id = parse_id(&raw_id)?;
    let page = query.page();
    let limit = query.limit();
    let offset = (page - 1).saturating_mul(limit);

    let (rows, total) = blocking(&state, move |st| {
        let rows = st.db.list_replies(message_id, offset, limit)?;
        let total = st.db.count_replies(message_id)?;
        Ok((rows, total))
    })
    .await?;

    Ok(Json(ReplyPage {
        replies: rows.into_iter().map(reply_from_row).collect(),
        total_pages: total_pages(total, limit),
    }))
}

/// POST /reply
pub async fn create_reply(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateReplyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let CreateReplyRequest {
        message_id,
        content,
    } = json_body(body, malformed_body())?;
    validate_message_id(message_id)?;
    validate_content(&content)?;

    let row = blocking(&state, move |st| {
        if st.db.get_message(message_id)?.is_none() {
            return Err(ApiError::NotFound("Message"));
        }
        Ok(st.db.insert_reply(message_id, identity.user_id, &content)?)
    })
    .await?;
    info!(
        "Reply {} to message {} posted by user {}",
        row.id, row.message_id, identity.user_id
    );

    Ok((StatusCode::CREATED, Json(reply_from_row(row))))
}

/// DELETE /reply/{id}, author only.
pub async fn delete_reply(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Ack>, ApiError> {
    let id = parse_id(&raw_id)?;

    blocking(&state, move |st| {
        delete_owned(
            identity,
            "Reply",
            id,
            |id| st.db.get_reply(id),
            |id| st.db.delete_reply(id),
        )
    })
    .await?;

    Ok(Json(Ack::new("Reply deleted")))
}

fn reply_from_row(row: ReplyRow) -> Reply {
    let created_at = parse_timestamp(&row.created_at, "reply", row.id);
    Reply {
        id: row.id,
        content: row.content,
        message_id: row.message_id,
        author_id: row.author_id,
        created_at,
        author: Author {
            name: row.author_name,
            email: row.author_email,
        },
    }
}
