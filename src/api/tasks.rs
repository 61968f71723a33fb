//! Task CRUD against `/tasks`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ClientError;
use crate::http::{ApiRequest, HttpClient};
use crate::models::{NewTask, Task, TaskStatus, TaskUpdate};

const TASKS_PATH: &str = "/tasks/";

fn task_path(id: i64) -> String {
    format!("/tasks/{}", id)
}

/// Typed access to the current user's tasks. Every call carries the bearer
/// token and is transparently retried once after a token refresh.
#[derive(Clone)]
pub struct TaskApi {
    client: Arc<HttpClient>,
}

impl TaskApi {
    pub fn new(client: Arc<HttpClient>) -> Self {
        TaskApi { client }
    }

    /// `GET /tasks/`, optionally filtered by status.
    pub async fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>, ClientError> {
        let mut request = ApiRequest::get(TASKS_PATH);
        if let Some(status) = status {
            request = request.query("status", status.as_str());
        }
        let tasks: Vec<Task> = self.client.send_json(request).await?;
        debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    pub async fn get(&self, id: i64) -> Result<Task, ClientError> {
        self.client.send_json(ApiRequest::get(task_path(id))).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, ClientError> {
        let created: Task = self
            .client
            .send_json(ApiRequest::post(TASKS_PATH).json(task)?)
            .await?;
        info!(event_name = "tasks.created", task_id = created.id, "Created task");
        Ok(created)
    }

    pub async fn update(&self, id: i64, update: &TaskUpdate) -> Result<Task, ClientError> {
        self.client
            .send_json(ApiRequest::put(task_path(id)).json(update)?)
            .await
    }

    /// `DELETE /tasks/{id}`; the backend answers 204 with no body.
    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.client.send(ApiRequest::delete(task_path(id))).await?;
        info!(event_name = "tasks.deleted", task_id = id, "Deleted task");
        Ok(())
    }
}
