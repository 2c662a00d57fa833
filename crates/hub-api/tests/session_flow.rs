mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;

fn signup_body(name: &str, email: &str, password: &str, confirm: &str) -> serde_json::Value {
    json!({
        "name": name,
        "email": email,
        "password": password,
        "confirmPassword": confirm,
    })
}

#[tokio::test]
async fn signup_login_me_logout_scenario() {
    let app = TestApp::new();

    let signup = app
        .send(
            Method::POST,
            "/api/session/signup",
            None,
            Some(signup_body("Alice", "a@x.com", "password1", "password1")),
        )
        .await;
    assert_eq!(signup.status, StatusCode::CREATED);
    assert_eq!(signup.body["user"]["name"], "Alice");
    assert_eq!(signup.body["user"]["email"], "a@x.com");
    let user = signup.body["user"].as_object().unwrap();
    assert_eq!(user.len(), 3, "public view is id, name and email only");
    assert!(!signup.body.to_string().contains("argon2"));

    let again = app
        .send(
            Method::POST,
            "/api/session/signup",
            None,
            Some(signup_body("Alice Two", "a@x.com", "password2", "password2")),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let login = app
        .send(
            Method::POST,
            "/api/session/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "password1" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.cookie.expect("login sets the session cookie");
    let attributes = login.set_cookie.unwrap().to_ascii_lowercase();
    assert!(attributes.contains("httponly"));
    assert!(attributes.contains("samesite=lax"));
    assert!(attributes.contains("path=/"));
    assert!(attributes.contains("max-age=604800"));

    let me = app.send(Method::GET, "/api/session/me", Some(&cookie), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["name"], "Alice");

    let logout = app.send(Method::POST, "/api/session/logout", Some(&cookie), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["message"], "Logged out");
    let cleared = logout.set_cookie.expect("logout clears the cookie");
    assert!(cleared.starts_with("session=;") || cleared.starts_with("session=\"\""));

    // Logout is client-side only: the same token still authenticates.
    let after = app.send(Method::GET, "/api/session/me", Some(&cookie), None).await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["user"]["name"], "Alice");
}

#[tokio::test]
async fn check_reports_registered_emails() {
    let app = TestApp::new();
    app.signup("Alice", "a@x.com").await;

    let known = app
        .send(Method::POST, "/api/session/check", None, Some(json!({ "email": "a@x.com" })))
        .await;
    assert_eq!(known.body, json!({ "exists": true }));

    let unknown = app
        .send(Method::POST, "/api/session/check", None, Some(json!({ "email": "b@x.com" })))
        .await;
    assert_eq!(unknown.body, json!({ "exists": false }));
}

#[tokio::test]
async fn signup_validation_reports_first_field() {
    let app = TestApp::new();

    let short_name = app
        .send(
            Method::POST,
            "/api/session/signup",
            None,
            Some(signup_body("A", "bad-email", "short", "nope")),
        )
        .await;
    assert_eq!(short_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(short_name.body["field"], "name");

    let mismatch = app
        .send(
            Method::POST,
            "/api/session/signup",
            None,
            Some(signup_body("Alice", "a@x.com", "password1", "password2")),
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.body["field"], "confirmPassword");
    assert!(mismatch.cookie.is_none());

    // Nothing was created by the rejected attempts.
    app.signup("Alice", "a@x.com").await;
}

#[tokio::test]
async fn login_failures_look_identical() {
    let app = TestApp::new();
    app.signup("Alice", "a@x.com").await;

    let wrong_password = app
        .send(
            Method::POST,
            "/api/session/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "password2" })),
        )
        .await;
    let unknown_email = app
        .send(
            Method::POST,
            "/api/session/login",
            None,
            Some(json!({ "email": "nobody@x.com", "password": "password1" })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert!(wrong_password.cookie.is_none());
    assert!(unknown_email.cookie.is_none());
}

#[tokio::test]
async fn me_rejects_missing_forged_and_expired_tokens() {
    let app = TestApp::new();
    let cookie = app.signup("Alice", "a@x.com").await;

    let missing = app.send(Method::GET, "/api/session/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let mut chars: Vec<char> = cookie.chars().collect();
    let i = chars.len() - 5;
    chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
    let forged: String = chars.into_iter().collect();
    let tampered = app.send(Method::GET, "/api/session/me", Some(&forged), None).await;
    assert_eq!(tampered.status, StatusCode::UNAUTHORIZED);

    let user_id = app
        .send(Method::GET, "/api/session/me", Some(&cookie), None)
        .await
        .body["user"]["id"]
        .as_i64()
        .unwrap();
    let stale = app
        .state
        .keys
        .issue_at(user_id, Utc::now() - Duration::days(8))
        .unwrap();
    let expired = app
        .send(Method::GET, "/api/session/me", Some(&format!("session={stale}")), None)
        .await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired.body, tampered.body);
}

#[tokio::test]
async fn me_for_unknown_subject_is_not_found() {
    let app = TestApp::new();
    let token = app.state.keys.issue(4242).unwrap();

    let me = app
        .send(Method::GET, "/api/session/me", Some(&format!("session={token}")), None)
        .await;
    assert_eq!(me.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let health = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, json!({ "ok": true }));
}
