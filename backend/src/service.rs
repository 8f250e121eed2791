//! Task operations sitting between the HTTP handlers and the store.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use shared::{CreateTaskRequest, Task, UpdateTaskRequest, ValidationErrors};

use crate::store::{Page, Pagination, StoreError, TaskStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("task {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Every task regardless of owner, one page at a time.
    pub async fn find_all(&self, pagination: Pagination) -> Result<Page<Task>, ServiceError> {
        Ok(self.store.list(pagination).await?)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Option<Task>, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    /// Validates and persists a new task owned by `owner`.
    pub async fn create(
        &self,
        owner: Uuid,
        attributes: CreateTaskRequest,
    ) -> Result<Task, ServiceError> {
        attributes.validate()?;
        let task = Task::new(owner, attributes);
        self.store.put(&task).await?;
        tracing::info!(task_id = %task.id, owner = %owner, "task created");
        Ok(task)
    }

    pub async fn update_task(
        &self,
        attributes: UpdateTaskRequest,
        id: Uuid,
    ) -> Result<Task, ServiceError> {
        attributes.validate()?;
        let mut task = self
            .store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;
        task.apply(attributes, Utc::now());
        self.store.put(&task).await?;
        tracing::debug!(task_id = %id, finished = task.finished, "task updated");
        Ok(task)
    }

    /// Returns `false` when the id was unknown.
    pub async fn destroy(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.store.delete(id).await?;
        if removed {
            tracing::info!(task_id = %id, "task deleted");
        }
        Ok(removed)
    }

    pub async fn find_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store.list_by_owner(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> TaskService {
        TaskService::new(Arc::new(MemoryStore::new()))
    }

    fn attributes(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: "details".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_find_one() {
        let service = service();
        let owner = Uuid::new_v4();

        let task = service.create(owner, attributes("Write report")).await.unwrap();
        let found = service.find_one(task.id).await.unwrap();

        assert_eq!(found, Some(task));
    }

    #[tokio::test]
    async fn invalid_attributes_persist_nothing() {
        let service = service();

        let result = service
            .create(Uuid::new_v4(), CreateTaskRequest::default())
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(service.find_all(Pagination::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let id = Uuid::new_v4();
        let result = service().update_task(UpdateTaskRequest::finish(), id).await;

        assert!(matches!(result, Err(ServiceError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn update_marks_finished() {
        let service = service();
        let task = service.create(Uuid::new_v4(), attributes("a")).await.unwrap();

        let updated = service
            .update_task(UpdateTaskRequest::finish(), task.id)
            .await
            .unwrap();

        assert!(updated.finished);
        assert!(updated.updated_at >= task.updated_at);
        assert!(service.find_one(task.id).await.unwrap().unwrap().finished);
    }

    #[tokio::test]
    async fn find_tasks_for_user_scopes_by_owner() {
        let service = service();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        service.create(alice, attributes("a1")).await.unwrap();
        service.create(alice, attributes("a2")).await.unwrap();
        service.create(bob, attributes("b1")).await.unwrap();

        let tasks = service.find_tasks_for_user(alice).await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.owner == alice));
    }
}
