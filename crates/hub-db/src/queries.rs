use crate::models::{MessageRow, ReplyRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, Row};

const MESSAGE_COLUMNS: &str =
    "SELECT m.id, m.content, m.author_id, u.name, u.email, m.created_at
     FROM messages m
     JOIN users u ON m.author_id = u.id";

const REPLY_COLUMNS: &str =
    "SELECT r.id, r.content, r.message_id, r.author_id, u.name, u.email, r.created_at
     FROM replies r
     JOIN users u ON r.author_id = u.id";

impl Database {
    // -- Users --

    /// Insert a user. Returns `None` when the email is already registered,
    /// which covers two signups racing past the existence check.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (name, email, password_hash) VALUES (?1, ?2, ?3)",
                (name, email, password_hash),
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
            query_user_by_id(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, author_id: i64, content: &str) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (content, author_id) VALUES (?1, ?2)",
                rusqlite::params![content, author_id],
            )?;
            query_message(conn, conn.last_insert_rowid())?
                .ok_or_else(|| anyhow::anyhow!("Inserted message vanished"))
        })
    }

    /// All messages, newest first.
    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{MESSAGE_COLUMNS} ORDER BY m.created_at DESC, m.id DESC"))?;
            let rows = stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Delete a message and, through the foreign key cascade, its replies.
    /// Returns whether a row was removed.
    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    // -- Replies --

    pub fn insert_reply(&self, message_id: i64, author_id: i64, content: &str) -> Result<ReplyRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO replies (content, message_id, author_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![content, message_id, author_id],
            )?;
            query_reply(conn, conn.last_insert_rowid())?
                .ok_or_else(|| anyhow::anyhow!("Inserted reply vanished"))
        })
    }

    /// One page of a message's replies, oldest first.
    pub fn list_replies(&self, message_id: i64, offset: i64, limit: i64) -> Result<Vec<ReplyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{REPLY_COLUMNS}
                 WHERE r.message_id = ?1
                 ORDER BY r.created_at ASC, r.id ASC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![message_id, limit, offset], reply_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_replies(&self, message_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM replies WHERE message_id = ?1",
                [message_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn get_reply(&self, id: i64) -> Result<Option<ReplyRow>> {
        self.with_conn(|conn| query_reply(conn, id))
    }

    pub fn delete_reply(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM replies WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        content: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get(3)?,
        author_email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyRow> {
    Ok(ReplyRow {
        id: row.get(0)?,
        content: row.get(1)?,
        message_id: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        author_email: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?1",
    )?;
    stmt.query_row([email], user_from_row).optional()
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?1")?;
    stmt.query_row([id], user_from_row).optional()
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!("{MESSAGE_COLUMNS} WHERE m.id = ?1"))?;
    stmt.query_row([id], message_from_row).optional()
}

fn query_reply(conn: &Connection, id: i64) -> Result<Option<ReplyRow>> {
    let mut stmt = conn.prepare(&format!("{REPLY_COLUMNS} WHERE r.id = ?1"))?;
    stmt.query_row([id], reply_from_row).optional()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
