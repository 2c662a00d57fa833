/// Database row types. These map directly to SQLite rows.
/// Distinct from hub-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Message joined with its author's public fields.
pub struct MessageRow {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub created_at: String,
}

/// Reply joined with its author's public fields.
pub struct ReplyRow {
    pub id: i64,
    pub content: String,
    pub message_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub created_at: String,
}
