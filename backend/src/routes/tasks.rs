use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use shared::{
    CreateTaskRequest, DataResponse, ListMeta, ListResponse, MessageResponse, Task,
    UpdateTaskRequest,
};

use crate::config::AccessPolicy;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::service::ServiceError;
use crate::state::AppState;
use crate::store::{Page, Pagination};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Unparseable ids cannot name a task, so they are reported as missing.
fn task_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::task_not_found())
}

/// Under the owner policy every id-addressed endpoint needs a caller.
fn require_caller(
    policy: AccessPolicy,
    caller: Option<AuthUser>,
) -> Result<Option<AuthUser>, ApiError> {
    match (policy, caller) {
        (AccessPolicy::Owner, None) => Err(ApiError::unauthorized()),
        (_, caller) => Ok(caller),
    }
}

/// Loads a task the caller may act on; tasks owned by someone else look absent.
async fn accessible_task(
    state: &AppState,
    id: Uuid,
    caller: Option<&AuthUser>,
) -> Result<Task, ApiError> {
    let task = state
        .tasks
        .find_one(id)
        .await?
        .ok_or_else(ApiError::task_not_found)?;
    let caller_id = caller.map(|c| c.id);
    if !state.policy.permits(&task, caller_id) {
        tracing::warn!(task_id = %id, caller = ?caller_id, "access to foreign task refused");
        return Err(ApiError::task_not_found());
    }
    Ok(task)
}

pub async fn index(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<Task>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let pagination = Pagination::new(query.page, query.per_page);

    let page = match require_caller(state.policy, caller)? {
        Some(caller) if state.policy == AccessPolicy::Owner => {
            let tasks = state.tasks.find_tasks_for_user(caller.id).await?;
            let total = tasks.len();
            Page {
                items: pagination.slice(tasks),
                total,
            }
        }
        _ => state.tasks.find_all(pagination).await?,
    };

    Ok(Json(ListResponse {
        data: page.items,
        meta: ListMeta {
            page: pagination.page,
            per_page: pagination.per_page,
            total: page.total,
        },
    }))
}

pub async fn store(
    State(state): State<AppState>,
    caller: AuthUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse<Task>>), ApiError> {
    let Json(attributes) = payload?;
    let task = state
        .tasks
        .create(caller.id, attributes)
        .await
        .map_err(|e| match e {
            ServiceError::Store(cause) => {
                tracing::error!(error = %cause, owner = %caller.id, "task creation failed");
                ApiError::BadRequest("Failed to create the task".to_string())
            }
            other => other.into(),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_data("Task created successfully", task)),
    ))
}

pub async fn show(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Task>>, ApiError> {
    let caller = require_caller(state.policy, caller)?;
    let task = accessible_task(&state, task_id(&id)?, caller.as_ref()).await?;
    Ok(Json(DataResponse::new(task)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<MessageResponse<Task>>, ApiError> {
    let caller = require_caller(state.policy, caller)?;
    let id = task_id(&id)?;
    let Json(attributes) = payload?;
    accessible_task(&state, id, caller.as_ref()).await?;

    let task = state.tasks.update_task(attributes, id).await?;
    Ok(Json(MessageResponse::with_data(
        "Task updated successfully",
        task,
    )))
}

pub async fn destroy(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse<()>>, ApiError> {
    let caller = require_caller(state.policy, caller)?;
    let id = task_id(&id)?;
    accessible_task(&state, id, caller.as_ref()).await?;

    if !state.tasks.destroy(id).await? {
        return Err(ApiError::task_not_found());
    }
    Ok(Json(MessageResponse::message("Task deleted successfully")))
}

/// `GET /api/user/{user_id}/tasks`: only the user themself may list.
pub async fn for_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<DataResponse<Vec<Task>>>, ApiError> {
    match Uuid::parse_str(&user_id) {
        Ok(user_id) if user_id == caller.id => {
            let tasks = state.tasks.find_tasks_for_user(user_id).await?;
            Ok(Json(DataResponse::new(tasks)))
        }
        _ => {
            tracing::warn!(caller = %caller.id, requested = %user_id, "cross-user listing refused");
            Err(ApiError::unauthorized())
        }
    }
}
