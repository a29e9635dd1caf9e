#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use hemocare::auth::StaticTokenVerifier;
use hemocare::db::repositories::LocalRepository;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_UID: &str = "admin-1";

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind and serializes access to the
/// process environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn admin_verifier() -> StaticTokenVerifier {
    StaticTokenVerifier::new().with_token(ADMIN_TOKEN, ADMIN_UID)
}

#[cfg(feature = "http-server")]
pub mod app {
    use super::*;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use hemocare::http::{create_router, AppState};
    use hemocare::services::assistant::{AssistantConfig, GeminiAssistant};

    /// Router over a fresh in-memory store, the admin token table and an
    /// assistant with no API key. The store handle shares state with the
    /// router.
    pub fn test_app() -> (Router, LocalRepository) {
        let repo = LocalRepository::new();
        let assistant = GeminiAssistant::new(AssistantConfig::default()).unwrap();
        let state = AppState::new(
            Arc::new(repo.clone()),
            Arc::new(admin_verifier()),
            Arc::new(assistant),
        );
        (create_router(state), repo)
    }

    pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Send one request and decode the JSON response body.
    pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        send(app, request(Method::GET, uri, token, None)).await
    }

    pub async fn post(
        app: &Router,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(app, request(Method::POST, uri, token, body)).await
    }

    pub async fn put(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        send(app, request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        send(app, request(Method::DELETE, uri, token, None)).await
    }
}
