use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a user. Safe to hand to clients: there is deliberately
/// no field that could carry the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Author summary embedded in messages and replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub author: Author,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i64,
    pub content: String,
    pub message_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub author: Author,
}
