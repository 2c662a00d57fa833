use tracing::{info, warn};

use hub_db::models::{MessageRow, ReplyRow};

use crate::error::ApiError;
use crate::middleware::Identity;

/// Content with a single, fixed author.
pub trait Authored {
    fn author_id(&self) -> i64;
}

impl Authored for MessageRow {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Authored for ReplyRow {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

/// Existence first, then ownership. Only the author gets the item back.
pub fn ensure_owner<T: Authored>(
    item: Option<T>,
    identity: Identity,
    kind: &'static str,
) -> Result<T, ApiError> {
    let item = item.ok_or(ApiError::NotFound(kind))?;

    if item.author_id() != identity.user_id {
        warn!(
            "User {} denied deleting {} owned by user {}",
            identity.user_id,
            kind,
            item.author_id()
        );
        return Err(ApiError::Forbidden);
    }

    Ok(item)
}

/// Fetch, check ownership, then delete. Shared by message and reply deletion
/// so both apply the checks in the same order.
pub fn delete_owned<T, F, D>(
    identity: Identity,
    kind: &'static str,
    id: i64,
    fetch: F,
    delete: D,
) -> Result<(), ApiError>
where
    T: Authored,
    F: FnOnce(i64) -> anyhow::Result<Option<T>>,
    D: FnOnce(i64) -> anyhow::Result<bool>,
{
    ensure_owner(fetch(id)?, identity, kind)?;

    if !delete(id)? {
        // Gone between the check and the delete.
        return Err(ApiError::NotFound(kind));
    }

    info!("{} {} deleted by user {}", kind, id, identity.user_id);
    Ok(())
}
