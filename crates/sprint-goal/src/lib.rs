//! # sprint-goal
//!
//! Goal and task lifecycle, authorization, and the profile read-model for
//! Sprint.
//!
//! An author creates a [`Goal`] with a deadline, invites up to two mentors
//! with an invite code, and breaks the goal into [`Task`]s. The author
//! submits work on a task; a mentor approves it. Mentors may extend the
//! deadline and mark the goal completed, which freezes it.
//!
//! ## Key components
//!
//! - [`GoalLifecycle`] — create, invite, join, leave, extend, complete, delete
//! - [`TaskLifecycle`] — create, submit, approve, read submission, delete
//! - [`ProfileAggregator`] — per-user summaries of authored and mentored goals
//! - [`GoalStore`] — whole-document persistence with compare-and-swap
//!   (`MemoryGoalStore`, `JsonGoalStore`)
//! - [`Access`] / [`role_in_goal`] — who may do what on a goal
//! - [`SprintService`] — all of the above wired to one set of stores

pub mod config;
pub mod error;
pub mod goal;
pub mod goal_lifecycle;
mod json_dir;
pub mod profile;
pub mod roles;
pub mod service;
pub mod store;
pub mod task;
pub mod task_lifecycle;

pub use config::{ProjectLayout, SprintConfig};
pub use error::{ErrorKind, SprintError};
pub use goal::{Goal, GoalStatus, GoalSummary, MentorSlot};
pub use goal_lifecycle::{generate_invite_code, GoalLifecycle, INVITE_CODE_LENGTH};
pub use profile::{
    JsonProfileStore, MemoryProfileStore, NewUser, ProfileAggregator, ProfileStore, UserProfile,
};
pub use roles::{role_in_goal, Access, GoalRole, Principal};
pub use service::SprintService;
pub use store::{GoalStore, JsonGoalStore, MemoryGoalStore};
pub use task::{Submission, Task, TaskList, TaskStatus};
pub use task_lifecycle::TaskLifecycle;
