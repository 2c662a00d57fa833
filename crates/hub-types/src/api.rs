use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::{Message, Reply, User};

// -- Session token claims --

/// Claims carried by the session token. `sub` is the user id rendered as a
/// decimal string, as registered JWT claims require a string subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Lenient request fields --
//
// Request bodies come from browser forms. A field that is missing, null or
// of the wrong JSON type reads as empty so validation can name it, and
// unknown keys are ignored.

/// A JSON string, or empty for anything else.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// An integer id given as a JSON number or a numeric string. Anything else
/// reads as 0, which is never a valid id.
fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

// -- Session --

#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

/// Plain acknowledgement body (`{"message": "..."}`).
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Feed --

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
}

pub type FeedResponse = Vec<Message>;

// -- Replies --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub message_id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPage {
    pub replies: Vec<Reply>,
    pub total_pages: i64,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
