// task.rs — Task: a unit of work embedded in a goal.
//
// Tasks have no store of their own. They live inside their parent Goal and
// are persisted whenever the goal is. The state machine is:
//   New → Pending → Completed
//   (submission is also accepted again from Pending and Completed)

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_text, SprintError};

/// The lifecycle state of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created, nothing submitted yet.
    New,
    /// Work submitted by the author, waiting for a mentor.
    Pending,
    /// Approved by a mentor.
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::New => write!(f, "new"),
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl TaskStatus {
    /// Check whether moving from this status to `next` is valid.
    ///
    /// Submitting never checks the prior status, so `Pending` is reachable
    /// from every state. `Completed` is only reachable from `Pending`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (_, TaskStatus::Pending) | (TaskStatus::Pending, TaskStatus::Completed)
        )
    }
}

/// Work handed in by the goal's author for review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission {
    pub comment: String,
    pub link: String,
}

impl Submission {
    pub fn new(comment: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            link: link.into(),
        }
    }

    /// The comment is required, 10-50 characters. The link is free-form.
    pub fn validate(&self) -> Result<(), SprintError> {
        require_text("Comment", &self.comment, 10..=50)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,

    pub desc: String,

    /// Username of the author or mentor who created the task.
    pub assigned_by: String,

    /// Checked against the goal deadline once, at creation.
    pub deadline: DateTime<Utc>,

    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task in the `New` state.
    pub fn new(
        desc: impl Into<String>,
        deadline: DateTime<Utc>,
        assigned_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            desc: desc.into(),
            assigned_by: assigned_by.into(),
            deadline,
            status: TaskStatus::New,
            submission: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a submission and move to `Pending`, replacing any earlier one.
    pub fn submit(&mut self, submission: Submission) {
        self.submission = Some(submission);
        self.status = TaskStatus::Pending;
        self.updated_at = Utc::now();
    }

    /// Move a `Pending` task to `Completed`. Returns false (and leaves the
    /// task alone) when there is no pending submission.
    pub fn approve(&mut self) -> bool {
        if !self.status.can_transition_to(TaskStatus::Completed) {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.updated_at = Utc::now();
        true
    }

    /// The submission, but only while it is awaiting review.
    pub fn pending_submission(&self) -> Option<&Submission> {
        match self.status {
            TaskStatus::Pending => self.submission.as_ref(),
            _ => None,
        }
    }
}

/// Ordered task collection with an id index.
///
/// Order is most recent first. On disk this is a plain JSON array, so a goal
/// document still embeds its task list as a sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Task>", into = "Vec<Task>")]
pub struct TaskList {
    by_id: HashMap<String, Task>,
    order: Vec<String>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.by_id.get(task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.by_id.get_mut(task_id)
    }

    /// Insert at the front (index 0).
    pub fn prepend(&mut self, task: Task) {
        self.order.retain(|id| id != &task.id);
        self.order.insert(0, task.id.clone());
        self.by_id.insert(task.id.clone(), task);
    }

    pub fn remove(&mut self, task_id: &str) -> Option<Task> {
        let task = self.by_id.remove(task_id)?;
        self.order.retain(|id| id != task_id);
        Some(task)
    }

    /// Position of a task in listing order.
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.order.iter().position(|id| id == task_id)
    }

    /// Tasks in listing order, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

impl From<Vec<Task>> for TaskList {
    fn from(tasks: Vec<Task>) -> Self {
        let mut list = TaskList::new();
        for task in tasks {
            // First occurrence of an id wins.
            if list.by_id.contains_key(&task.id) {
                continue;
            }
            list.order.push(task.id.clone());
            list.by_id.insert(task.id.clone(), task);
        }
        list
    }
}

impl From<TaskList> for Vec<Task> {
    fn from(mut list: TaskList) -> Self {
        list.order
            .iter()
            .filter_map(|id| list.by_id.remove(id))
            .collect()
    }
}
