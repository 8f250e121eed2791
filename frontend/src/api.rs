//! Calls to the `/api` endpoints.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{
    CreateTaskRequest, Credentials, DataResponse, ErrorResponse, LoginData, MessageResponse,
    Task, UpdateTaskRequest,
};
use thiserror::Error;
use uuid::Uuid;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{console, window, Request, RequestInit, Response};

use crate::session::Session;

const API_BASE: &str = "/api";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Response { status: u16, message: String },

    /// The request went out but nothing usable came back.
    #[error("no response from server: {0}")]
    NoResponse(String),

    /// The request could not be built.
    #[error("request setup failed: {0}")]
    Setup(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Response { status: 401, .. })
    }

    pub fn log(&self, context: &str) {
        let line = match self {
            ClientError::Response { status, message } => {
                format!("{context}: server responded with {status}: {message}")
            }
            ClientError::NoResponse(detail) => format!("{context}: request sent, no response: {detail}"),
            ClientError::Setup(detail) => format!("{context}: request setup failed: {detail}"),
        };
        console::error_1(&line.into());
    }
}

/// Pulls `error` out of a `{"error": ...}` body, falling back to the raw text.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.trim().to_string(),
    }
}

fn decode<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, ClientError> {
    serde_json::from_str(text).map_err(|e| ClientError::Response {
        status,
        message: format!("unexpected response body: {e}"),
    })
}

async fn send<B: Serialize>(
    method: &str,
    path: &str,
    session: Option<&Session>,
    body: Option<&B>,
) -> Result<(u16, String), ClientError> {
    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(body) = body {
        let json = serde_json::to_string(body).map_err(|e| ClientError::Setup(e.to_string()))?;
        opts.set_body(&JsValue::from_str(&json));
    }

    let url = format!("{API_BASE}{path}");
    let request = Request::new_with_str_and_init(&url, &opts)
        .map_err(|_| ClientError::Setup(format!("invalid request {method} {url}")))?;
    let headers = request.headers();
    headers
        .set("Accept", "application/json")
        .map_err(|_| ClientError::Setup("failed to set header".into()))?;
    if body.is_some() {
        headers
            .set("Content-Type", "application/json")
            .map_err(|_| ClientError::Setup("failed to set header".into()))?;
    }
    if let Some(session) = session {
        headers
            .set("Authorization", &session.authorization())
            .map_err(|_| ClientError::Setup("failed to set header".into()))?;
    }

    let window = window().ok_or_else(|| ClientError::Setup("no window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| ClientError::NoResponse(format!("{e:?}")))?
        .into();

    let status = response.status();
    let text_promise = response
        .text()
        .map_err(|_| ClientError::NoResponse("unreadable body".into()))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| ClientError::NoResponse("failed to read body".into()))?
        .as_string()
        .unwrap_or_default();

    if !response.ok() {
        return Err(ClientError::Response {
            status,
            message: error_message(status, &text),
        });
    }
    Ok((status, text))
}

async fn send_json<B: Serialize, T: DeserializeOwned>(
    method: &str,
    path: &str,
    session: Option<&Session>,
    body: Option<&B>,
) -> Result<T, ClientError> {
    let (status, text) = send(method, path, session, body).await?;
    decode(status, &text)
}

pub async fn login(credentials: Credentials) -> Result<LoginData, ClientError> {
    let response: DataResponse<LoginData> =
        send_json("POST", "/login", None, Some(&credentials)).await?;
    Ok(response.data)
}

pub async fn logout(session: &Session) -> Result<(), ClientError> {
    send::<()>("POST", "/logout", Some(session), None).await?;
    Ok(())
}

pub async fn fetch_user_tasks(session: &Session) -> Result<Vec<Task>, ClientError> {
    let path = format!("/user/{}/tasks", session.user_id);
    let response: DataResponse<Vec<Task>> =
        send_json::<(), _>("GET", &path, Some(session), None).await?;
    Ok(response.data)
}

pub async fn create_task(
    session: &Session,
    request: CreateTaskRequest,
) -> Result<Task, ClientError> {
    let response: MessageResponse<Task> =
        send_json("POST", "/tasks", Some(session), Some(&request)).await?;
    response.data.ok_or_else(|| ClientError::Response {
        status: 201,
        message: "created task missing from response".into(),
    })
}

pub async fn update_task(
    session: &Session,
    id: Uuid,
    request: UpdateTaskRequest,
) -> Result<Task, ClientError> {
    let path = format!("/tasks/{id}");
    let response: MessageResponse<Task> =
        send_json("PUT", &path, Some(session), Some(&request)).await?;
    response.data.ok_or_else(|| ClientError::Response {
        status: 200,
        message: "updated task missing from response".into(),
    })
}

pub async fn delete_task(session: &Session, id: Uuid) -> Result<(), ClientError> {
    let path = format!("/tasks/{id}");
    send::<()>("DELETE", &path, Some(session), None).await?;
    Ok(())
}
