//! Helpers shared by the integration tests.
//!
//! Each test file is compiled as its own crate, so helpers used by only one
//! of them would warn as dead code.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use backend::config::AccessPolicy;
use backend::{router, AppState, Config};

pub struct TestApp {
    router: Router,
}

pub struct Account {
    pub token: String,
    pub user_id: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(AccessPolicy::Owner)
    }

    pub fn with_policy(policy: AccessPolicy) -> Self {
        let config = Config {
            access_policy: policy,
            ..Config::default()
        };
        Self {
            router: router(AppState::in_memory(&config)),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    /// Registers `email` and logs in, returning the bearer token.
    pub async fn account(&self, email: &str) -> Account {
        let credentials = json!({ "email": email, "password": "correct horse" });
        let (status, _) = self
            .request(Method::POST, "/api/register", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(Method::POST, "/api/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK);
        Account {
            token: body["data"]["token"].as_str().unwrap().to_string(),
            user_id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a task and returns its JSON.
    pub async fn create_task(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/tasks",
                Some(token),
                Some(json!({ "title": title, "description": format!("{title} details") })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }
}
