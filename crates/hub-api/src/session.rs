//! Signup, login and identity lookup.
//!
//! Sessions are stateless: a token stays valid until it expires, and logging
//! out only clears the client's cookie. There is no server-side revocation.

use tracing::{debug, info};

use hub_db::models::UserRow;
use hub_types::api::{LoginRequest, SignupRequest};
use hub_types::models::User;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;
use crate::middleware::resolve_identity;
use crate::validation::validate_signup;

/// A freshly authenticated user and the token to hand back to them.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub fn public_user(row: UserRow) -> User {
    User {
        id: row.id,
        name: row.name,
        email: row.email,
    }
}

/// Read-only lookup backing the signup form's "email taken" hint.
pub async fn check_email_exists(state: &AppState, email: &str) -> Result<bool, ApiError> {
    let email = email.to_owned();
    blocking(state, move |st| Ok(st.db.email_exists(&email)?)).await
}

pub async fn signup(state: &AppState, req: SignupRequest) -> Result<Session, ApiError> {
    validate_signup(&req.name, &req.email, &req.password, &req.confirm_password)?;

    if check_email_exists(state, &req.email).await? {
        return Err(ApiError::Conflict);
    }

    let SignupRequest {
        name,
        email,
        password,
        ..
    } = req;

    let digest = blocking(state, move |st| Ok(st.hasher.hash(&password)?)).await?;

    // The UNIQUE constraint settles a race between two signups for one email
    let row = blocking(state, move |st| {
        st.db
            .create_user(&name, &email, &digest)?
            .ok_or(ApiError::Conflict)
    })
    .await?;

    let token = state.keys.issue(row.id)?;
    info!("User {} signed up", row.id);

    Ok(Session {
        user: public_user(row),
        token,
    })
}

/// Unknown email and wrong password both end in `InvalidCredentials`, and
/// both pay for one Argon2 verification.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<Session, ApiError> {
    let LoginRequest { email, password } = req;

    let (user, verified) = blocking(state, move |st| {
        let user = st.db.get_user_by_email(&email)?;
        let digest = user.as_ref().map(|u| u.password_hash.as_str());
        let verified = st.hasher.verify_or_dummy(&password, digest);
        Ok((user, verified))
    })
    .await?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            debug!("Login rejected");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = state.keys.issue(user.id)?;
    info!("User {} logged in", user.id);

    Ok(Session {
        user: public_user(user),
        token,
    })
}

/// Resolve the token's subject to a user. The account may have disappeared
/// since the token was issued, which is `NotFound` rather than a 401.
pub async fn current_user(state: &AppState, token: Option<&str>) -> Result<User, ApiError> {
    let identity = resolve_identity(&state.keys, token)?;
    let row = blocking(state, move |st| Ok(st.db.get_user_by_id(identity.user_id)?))
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(public_user(row))
}
