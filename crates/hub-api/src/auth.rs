use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use hub_db::Database;
use hub_types::api::{Ack, CheckEmailRequest, CheckEmailResponse, LoginRequest, SignupRequest, UserResponse};

use crate::error::{ApiError, json_body, malformed_body};
use crate::password::PasswordHasher;
use crate::rate_limit::RateLimiter;
use crate::session;
use crate::token::{SESSION_TTL_DAYS, SessionKeys};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub keys: SessionKeys,
    pub hasher: PasswordHasher,
    /// Whether the session cookie gets the `Secure` attribute.
    pub cookie_secure: bool,
    pub session_limiter: RateLimiter,
}

/// Run store or hashing work on the blocking pool. Handlers reach SQLite
/// only through here, so no async worker waits on the connection lock.
pub async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let st = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&st)).await?
}

/// POST /session/check
pub async fn check_email(
    State(state): State<AppState>,
    body: Result<Json<CheckEmailRequest>, JsonRejection>,
) -> Result<Json<CheckEmailResponse>, ApiError> {
    let req = json_body(body, malformed_body())?;
    let exists = session::check_email_exists(&state, &req.email).await?;
    Ok(Json(CheckEmailResponse { exists }))
}

/// POST /session/signup
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body, malformed_body())?;
    let session = session::signup(&state, req).await?;
    let jar = jar.add(session_cookie(session.token, state.cookie_secure));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(UserResponse { user: session.user }),
    ))
}

/// POST /session/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body, ApiError::InvalidCredentials)?;
    let session = session::login(&state, req).await?;
    let jar = jar.add(session_cookie(session.token, state.cookie_secure));

    Ok((jar, Json(UserResponse { user: session.user })))
}

/// GET /session/me
pub async fn me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<UserResponse>, ApiError> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value());
    let user = session::current_user(&state, token).await?;
    Ok(Json(UserResponse { user }))
}

/// POST /session/logout clears the cookie. The token itself stays valid
/// until it expires.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(Ack::new("Logged out")))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}
