use crate::error::ApiError;

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_CONTENT_CHARS: usize = 256;

/// Signup checks, in order. The first failure wins.
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ApiError> {
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(ApiError::validation("name", "Name is too short"));
    }
    if !is_valid_email(email) {
        return Err(ApiError::validation("email", "Invalid email"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::validation(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if password != confirm_password {
        return Err(ApiError::validation("confirmPassword", "Passwords do not match"));
    }
    Ok(())
}

/// Message or reply body: 1 to 256 characters.
pub fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.is_empty() {
        return Err(ApiError::validation("content", "Content cannot be empty"));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::validation(
            "content",
            "Content is too long (256 characters max)",
        ));
    }
    Ok(())
}

/// A reply must name the message it answers.
pub fn validate_message_id(message_id: i64) -> Result<(), ApiError> {
    if message_id < 1 {
        return Err(ApiError::validation("messageId", "Invalid message id"));
    }
    Ok(())
}

/// Path ids are numeric.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::validation("id", "Invalid id"))
}

/// Shape check only: `local@domain.tld` with a plain-ASCII local part and an
/// alphabetic top-level domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '\'' | '+' | '-'))
    {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
        && labels
            .last()
            .is_some_and(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
}
