use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a task as reported by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "Unknown task status '{}'. Valid values: pending, in_progress, done",
                other
            )),
        }
    }
}

/// A task owned by the authenticated user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub owner_id: i64,
}

/// Body of `POST /tasks/`. New tasks always start as pending.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of `PUT /tasks/{id}`; unset fields are left untouched by the backend.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        TaskUpdate {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_status_wire_names() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "title": "Write report",
            "description": null,
            "status": "in_progress",
            "owner_id": 7
        }))
        .expect("task should deserialize");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!("done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_partial_update_omits_unset_fields() {
        let body = serde_json::to_value(TaskUpdate::status(TaskStatus::Done)).unwrap();
        assert_eq!(body, json!({"status": "done"}));
    }
}
