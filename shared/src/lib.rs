use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod envelope;
mod validation;

pub use envelope::{DataResponse, ErrorResponse, ListMeta, ListResponse, MessageResponse};
pub use validation::{FieldError, ValidationErrors, MAX_TITLE_LEN, MIN_PASSWORD_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub finished: bool,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /api/tasks`.
///
/// Missing `title`/`description` deserialize as empty strings so that they
/// surface as validation errors instead of JSON rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
}

impl Task {
    pub fn new(owner: Uuid, request: CreateTaskRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            due_date: request.due_date,
            finished: request.finished.unwrap_or(false),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies every field present in `update`. The owner is never touched.
    pub fn apply(&mut self, update: UpdateTaskRequest, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description.trim().to_string();
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(finished) = update.finished {
            self.finished = finished;
        }
        self.updated_at = now;
    }
}

impl UpdateTaskRequest {
    pub fn finish() -> Self {
        Self {
            finished: Some(true),
            ..Self::default()
        }
    }

    pub fn text(title: String, description: String) -> Self {
        Self {
            title: Some(title),
            description: Some(description),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// Email/password pair used by both register and login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, description: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: description.to_string(),
            ..CreateTaskRequest::default()
        }
    }

    #[test]
    fn new_task_defaults_to_unfinished() {
        let owner = Uuid::new_v4();
        let task = Task::new(owner, request("Buy milk", "Two litres"));

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "Two litres");
        assert!(!task.finished);
        assert_eq!(task.owner, owner);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut task = Task::new(Uuid::new_v4(), request("Title", "Body"));
        let owner = task.owner;
        let later = task.created_at + chrono::Duration::seconds(5);

        task.apply(UpdateTaskRequest::finish(), later);

        assert!(task.finished);
        assert_eq!(task.title, "Title");
        assert_eq!(task.description, "Body");
        assert_eq!(task.owner, owner);
        assert_eq!(task.updated_at, later);
    }

    #[test]
    fn task_json_omits_absent_due_date() {
        let task = Task::new(Uuid::new_v4(), request("a", "b"));
        let json = serde_json::to_value(&task).unwrap();

        assert!(json.get("due_date").is_none());
        assert_eq!(json["finished"], false);
        assert_eq!(json["owner"], task.owner.to_string());
    }

    #[test]
    fn create_request_tolerates_missing_fields() {
        let parsed: CreateTaskRequest = serde_json::from_str(r#"{"title":"only"}"#).unwrap();

        assert_eq!(parsed.title, "only");
        assert_eq!(parsed.description, "");
        assert_eq!(parsed.finished, None);
    }

    #[test]
    fn update_request_serializes_only_set_fields() {
        let json = serde_json::to_string(&UpdateTaskRequest::finish()).unwrap();
        assert_eq!(json, r#"{"finished":true}"#);
    }
}
