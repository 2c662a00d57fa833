#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use hub_api::auth::{AppState, AppStateInner};
use hub_api::password::PasswordHasher;
use hub_api::rate_limit::RateLimiter;
use hub_api::token::SessionKeys;
use hub_db::Database;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct Outcome {
    pub status: StatusCode,
    /// `session=<token>` from Set-Cookie, if the response set one.
    pub cookie: Option<String>,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limiter(RateLimiter::for_sessions())
    }

    /// App whose session routes allow `limit` requests per client per hour.
    pub fn with_session_limit(limit: u32) -> Self {
        Self::with_limiter(RateLimiter::new(limit, Duration::from_secs(3600)))
    }

    fn with_limiter(session_limiter: RateLimiter) -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            keys: SessionKeys::new(SECRET),
            hasher: PasswordHasher::with_min_cost().unwrap(),
            cookie_secure: false,
            session_limiter,
        });
        Self {
            router: hub_api::router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Outcome {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    /// POST a body verbatim, with the given content type.
    pub async fn post_raw(&self, uri: &str, cookie: Option<&str>, content_type: &str, body: &str) -> Outcome {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.dispatch(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// GET as if from the given peer address.
    pub async fn get_from(&self, peer: &str, uri: &str) -> Outcome {
        let peer: SocketAddr = peer.parse().unwrap();
        let mut request = Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> Outcome {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let cookie = set_cookie
            .as_deref()
            .and_then(|v| v.split(';').next())
            .filter(|pair| pair.starts_with("session=") && pair.len() > "session=".len())
            .map(String::from);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Outcome {
            status,
            cookie,
            set_cookie,
            body,
        }
    }

    /// Sign up and return the session cookie pair.
    pub async fn signup(&self, name: &str, email: &str) -> String {
        let reply = self
            .send(
                Method::POST,
                "/api/session/signup",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "password1",
                    "confirmPassword": "password1",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.cookie.expect("signup sets the session cookie")
    }

    pub async fn post_message(&self, cookie: &str, content: &str) -> i64 {
        let reply = self
            .send(Method::POST, "/api/feed", Some(cookie), Some(json!({ "content": content })))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["id"].as_i64().unwrap()
    }

    pub async fn post_reply(&self, cookie: &str, message_id: i64, content: &str) -> i64 {
        let reply = self
            .send(
                Method::POST,
                "/api/reply",
                Some(cookie),
                Some(json!({ "messageId": message_id, "content": content })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["id"].as_i64().unwrap()
    }
}
