use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::{AppState, SESSION_COOKIE};
use crate::error::ApiError;
use crate::token::SessionKeys;

/// Authenticated caller, attached to the request by [`require_auth`].
///
/// Trusted from the token alone: the guard never reads the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

pub fn resolve_identity(keys: &SessionKeys, token: Option<&str>) -> Result<Identity, ApiError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthenticated)?;

    let user_id = keys.verify(token).map_err(|e| {
        debug!("Rejected session token: {}", e);
        ApiError::Unauthenticated
    })?;

    Ok(Identity { user_id })
}

/// Validate the session cookie and attach the caller's [`Identity`].
/// Requests without a valid token never reach the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = resolve_identity(&state.keys, jar.get(SESSION_COOKIE).map(|c| c.value()))?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
