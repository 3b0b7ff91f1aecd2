// error.rs — Error types for the goal/task lifecycle.
//
// Every rejected operation maps to one named variant. Variants are grouped
// into an ErrorKind so the request layer can pick a stable status code
// without matching on every variant.

use std::ops::RangeInclusive;

use thiserror::Error;

/// Coarse classification of a [`SprintError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced goal, task, invite code, submission, or profile is missing.
    NotFound,
    /// An authorization or invariant precondition failed.
    BadRequest,
    /// A uniqueness or optimistic-concurrency check failed at write time.
    Conflict,
    /// The caller's role is not allowed to use the operation at all.
    Forbidden,
    /// Storage or serialization failure.
    Internal,
}

impl ErrorKind {
    /// HTTP status the request layer reports for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::BadRequest => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden => 403,
            ErrorKind::Internal => 500,
        }
    }
}

/// Errors that can occur during goal, task, and profile operations.
#[derive(Debug, Error)]
pub enum SprintError {
    #[error("Could not find goal: {goal_id}")]
    GoalNotFound { goal_id: String },

    #[error("Could not find goal with invite code: {code}")]
    InviteCodeNotFound { code: String },

    #[error("Could not find task: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("There is no submission for task: {task_id}")]
    NoSubmission { task_id: String },

    #[error("Could not find profile for user: {username}")]
    ProfileNotFound { username: String },

    #[error("Could not find goal: {goal_id} in profile of user: {username}")]
    ProfileGoalNotFound { username: String, goal_id: String },

    #[error("User: {username} is not the author of goal: {goal_id}")]
    NotAuthor { username: String, goal_id: String },

    #[error("User: {username} is not a mentor of goal: {goal_id}")]
    NotMentor { username: String, goal_id: String },

    #[error("User: {username} is not the author or mentor of the goal: {goal_id}")]
    NotMember { username: String, goal_id: String },

    #[error("Goal: {goal_id} is already completed")]
    GoalCompleted { goal_id: String },

    #[error("Author: {username} can't join a goal as a mentor")]
    AuthorCannotMentor { username: String },

    #[error("Goal: {goal_id} already has two mentors")]
    MentorSlotsFull { goal_id: String },

    #[error("User: {username} is already a mentor for goal: {goal_id}")]
    AlreadyMentor { username: String, goal_id: String },

    #[error("New deadline cannot be previous deadline")]
    DeadlineNotExtended { goal_id: String },

    #[error("Cannot create a task after goal deadline")]
    TaskAfterGoalDeadline { goal_id: String },

    #[error("invalid username '{username}': {reason}")]
    InvalidUsername { username: String, reason: String },

    #[error("{field} is mandatory")]
    MissingField { field: &'static str },

    #[error("{field} must be at least {min} characters and at most {max} characters")]
    FieldLength {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("goal {goal_id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        goal_id: String,
        expected: u64,
        found: u64,
    },

    #[error("goal already exists: {goal_id}")]
    GoalExists { goal_id: String },

    #[error("invite code already in use: {code}")]
    InviteCodeTaken { code: String },

    #[error("Username: {username} already exists")]
    ProfileExists { username: String },

    #[error("role '{role}' may not {action}")]
    RoleNotAllowed { role: String, action: &'static str },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize a stored document.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A store mutex was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl SprintError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SprintError::GoalNotFound { .. }
            | SprintError::InviteCodeNotFound { .. }
            | SprintError::TaskNotFound { .. }
            | SprintError::NoSubmission { .. }
            | SprintError::ProfileNotFound { .. }
            | SprintError::ProfileGoalNotFound { .. } => ErrorKind::NotFound,

            SprintError::NotAuthor { .. }
            | SprintError::NotMentor { .. }
            | SprintError::NotMember { .. }
            | SprintError::GoalCompleted { .. }
            | SprintError::AuthorCannotMentor { .. }
            | SprintError::MentorSlotsFull { .. }
            | SprintError::AlreadyMentor { .. }
            | SprintError::DeadlineNotExtended { .. }
            | SprintError::TaskAfterGoalDeadline { .. }
            | SprintError::InvalidUsername { .. }
            | SprintError::MissingField { .. }
            | SprintError::FieldLength { .. } => ErrorKind::BadRequest,

            SprintError::VersionConflict { .. }
            | SprintError::GoalExists { .. }
            | SprintError::InviteCodeTaken { .. }
            | SprintError::ProfileExists { .. } => ErrorKind::Conflict,

            SprintError::RoleNotAllowed { .. } => ErrorKind::Forbidden,

            SprintError::IoError { .. }
            | SprintError::SerializationError(_)
            | SprintError::LockPoisoned(_) => ErrorKind::Internal,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    pub(crate) fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        SprintError::IoError {
            path: path.to_string(),
            source,
        }
    }
}

/// Reject blank text, then text whose length falls outside `len`.
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    len: RangeInclusive<usize>,
) -> Result<(), SprintError> {
    if value.trim().is_empty() {
        return Err(SprintError::MissingField { field });
    }
    if !len.contains(&value.chars().count()) {
        return Err(SprintError::FieldLength {
            field,
            min: *len.start(),
            max: *len.end(),
        });
    }
    Ok(())
}
