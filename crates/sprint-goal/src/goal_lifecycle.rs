// goal_lifecycle.rs — GoalLifecycle: every state change of a Goal aggregate.
//
// Each operation follows the same shape:
//   1. load the goal (missing → NotFound, before any field is read)
//   2. run the preconditions in a fixed order
//   3. mutate the in-memory copy
//   4. replace the whole document (stale copy → Conflict)
//   5. mirror membership changes into profiles
//
// A failed precondition returns before step 3, so a rejected call never
// leaves a partially modified goal behind. Profile updates in step 5 are
// best-effort: the goal is authoritative, and a missing profile is logged
// rather than undoing the transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::SprintConfig;
use crate::error::SprintError;
use crate::goal::{Goal, GoalStatus};
use crate::profile::ProfileAggregator;
use crate::roles::{Access, Principal};
use crate::store::GoalStore;

/// Load a goal or fail with NotFound.
pub(crate) fn load_goal(store: &dyn GoalStore, goal_id: &str) -> Result<Goal, SprintError> {
    store.get(goal_id)?.ok_or_else(|| SprintError::GoalNotFound {
        goal_id: goal_id.to_string(),
    })
}

/// Reject any mutation of a completed goal.
pub(crate) fn ensure_in_progress(goal: &Goal) -> Result<(), SprintError> {
    if goal.is_completed() {
        return Err(SprintError::GoalCompleted {
            goal_id: goal.id.clone(),
        });
    }
    Ok(())
}

/// Length of every issued invite code.
pub const INVITE_CODE_LENGTH: usize = 10;

/// Random alphanumeric invite code of [`INVITE_CODE_LENGTH`] characters.
pub fn generate_invite_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LENGTH)
        .map(char::from)
        .collect()
}

pub struct GoalLifecycle {
    goals: Arc<dyn GoalStore>,
    profiles: ProfileAggregator,
    config: SprintConfig,
}

impl GoalLifecycle {
    pub fn new(goals: Arc<dyn GoalStore>, profiles: ProfileAggregator, config: SprintConfig) -> Self {
        Self {
            goals,
            profiles,
            config,
        }
    }

    pub fn get_goal(&self, goal_id: &str) -> Result<Goal, SprintError> {
        tracing::debug!(goal_id, "fetching goal");
        load_goal(self.goals.as_ref(), goal_id)
    }

    /// Every goal, newest first. Restricted to the configured roles.
    pub fn get_all_goals(&self, principal: &Principal) -> Result<Vec<Goal>, SprintError> {
        principal
            .require_role(&self.config.list_all_roles, "list all goals")
            .inspect_err(|e| tracing::warn!(username = %principal.username, "{}", e))?;
        tracing::info!(username = %principal.username, "fetching all goals");
        self.goals.list()
    }

    /// Create a goal owned by `username`. Returns the new goal id.
    pub fn create_goal(
        &self,
        username: &str,
        title: &str,
        desc: &str,
        deadline: DateTime<Utc>,
    ) -> Result<String, SprintError> {
        Goal::validate_text(title, desc)
            .inspect_err(|e| tracing::warn!(username, "create goal rejected: {}", e))?;
        let goal = Goal::new(username, title, desc, deadline);
        self.goals.insert(&goal)?;
        tracing::info!(goal_id = %goal.id, username, "created goal");

        self.mirror("add authored goal", self.profiles.add_goal(&goal, username));
        Ok(goal.id)
    }

    /// Return the goal's invite code, issuing one on first request.
    pub fn invite(&self, goal_id: &str, username: &str) -> Result<String, SprintError> {
        self.try_invite(goal_id, username)
            .inspect_err(|e| tracing::warn!(goal_id, username, "invite rejected: {}", e))
    }

    fn try_invite(&self, goal_id: &str, username: &str) -> Result<String, SprintError> {
        let mut goal = load_goal(self.goals.as_ref(), goal_id)?;
        Access::Author.check(&goal, username)?;
        ensure_in_progress(&goal)?;

        if let Some(code) = &goal.inv_code {
            tracing::info!(goal_id, "fetching invite code");
            return Ok(code.clone());
        }

        // One regeneration on collision; a second collision surfaces as a conflict.
        let code = match self.issue_invite_code(&mut goal) {
            Err(SprintError::InviteCodeTaken { .. }) => {
                tracing::debug!(goal_id, "invite code collision, regenerating");
                self.issue_invite_code(&mut goal)?
            }
            other => other?,
        };
        tracing::info!(goal_id, "generated invite code");
        Ok(code)
    }

    fn issue_invite_code(&self, goal: &mut Goal) -> Result<String, SprintError> {
        let code = generate_invite_code();
        goal.inv_code = Some(code.clone());
        if let Err(e) = self.goals.replace(goal) {
            goal.inv_code = None;
            return Err(e);
        }
        Ok(code)
    }

    /// Join the goal holding `inv_code` as a mentor. Returns the goal id.
    pub fn join(&self, inv_code: &str, username: &str) -> Result<String, SprintError> {
        self.try_join(inv_code, username)
            .inspect_err(|e| tracing::warn!(inv_code, username, "join rejected: {}", e))
    }

    fn try_join(&self, inv_code: &str, username: &str) -> Result<String, SprintError> {
        let mut goal = self
            .goals
            .find_by_invite_code(inv_code)?
            .ok_or_else(|| SprintError::InviteCodeNotFound {
                code: inv_code.to_string(),
            })?;
        ensure_in_progress(&goal)?;
        if goal.author == username {
            return Err(SprintError::AuthorCannotMentor {
                username: username.to_string(),
            });
        }
        if !goal.has_free_mentor_slot() {
            return Err(SprintError::MentorSlotsFull {
                goal_id: goal.id.clone(),
            });
        }
        if goal.is_mentor(username) {
            return Err(SprintError::AlreadyMentor {
                username: username.to_string(),
                goal_id: goal.id.clone(),
            });
        }

        let slot = goal.seat_mentor(username);
        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id = %goal.id, username, ?slot, "added mentor");

        self.mirror("add mentored goal", self.profiles.add_mentored(&goal, username));
        Ok(goal.id)
    }

    /// Give up a mentor slot. Returns the goal id.
    pub fn leave_goal(&self, goal_id: &str, username: &str) -> Result<String, SprintError> {
        self.try_leave_goal(goal_id, username)
            .inspect_err(|e| tracing::warn!(goal_id, username, "leave rejected: {}", e))
    }

    fn try_leave_goal(&self, goal_id: &str, username: &str) -> Result<String, SprintError> {
        let mut goal = load_goal(self.goals.as_ref(), goal_id)?;
        ensure_in_progress(&goal)?;
        Access::Mentor.check(&goal, username)?;

        goal.unseat_mentor(username);
        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, username, "mentor left goal");

        self.mirror(
            "remove mentored goal",
            self.profiles.remove_mentored(goal_id, username),
        );
        Ok(goal.id)
    }

    /// Move the deadline strictly later. Returns the goal id.
    pub fn extend_deadline(
        &self,
        goal_id: &str,
        username: &str,
        new_deadline: DateTime<Utc>,
    ) -> Result<String, SprintError> {
        self.try_extend_deadline(goal_id, username, new_deadline)
            .inspect_err(|e| tracing::warn!(goal_id, username, "extend rejected: {}", e))
    }

    fn try_extend_deadline(
        &self,
        goal_id: &str,
        username: &str,
        new_deadline: DateTime<Utc>,
    ) -> Result<String, SprintError> {
        let mut goal = load_goal(self.goals.as_ref(), goal_id)?;
        ensure_in_progress(&goal)?;
        Access::Mentor.check(&goal, username)?;
        if new_deadline <= goal.deadline {
            return Err(SprintError::DeadlineNotExtended {
                goal_id: goal_id.to_string(),
            });
        }

        let previous = goal.deadline;
        goal.deadline = new_deadline;
        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, %previous, %new_deadline, "deadline extended");
        Ok(goal.id)
    }

    /// Mark the goal completed. Terminal. Returns the goal id.
    pub fn complete_goal(&self, goal_id: &str, username: &str) -> Result<String, SprintError> {
        self.try_complete_goal(goal_id, username)
            .inspect_err(|e| tracing::warn!(goal_id, username, "complete rejected: {}", e))
    }

    fn try_complete_goal(&self, goal_id: &str, username: &str) -> Result<String, SprintError> {
        let mut goal = load_goal(self.goals.as_ref(), goal_id)?;
        Access::Mentor.check(&goal, username)?;
        ensure_in_progress(&goal)?;

        goal.status = GoalStatus::Completed;
        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, username, "goal completed");

        for (who, e) in self.profiles.record_completion(&goal) {
            tracing::warn!(goal_id, username = %who, "profile counter not updated: {}", e);
        }
        Ok(goal.id)
    }

    /// Delete the goal regardless of status. Author only.
    pub fn delete_goal(&self, goal_id: &str, username: &str) -> Result<(), SprintError> {
        self.try_delete_goal(goal_id, username)
            .inspect_err(|e| tracing::warn!(goal_id, username, "delete rejected: {}", e))
    }

    fn try_delete_goal(&self, goal_id: &str, username: &str) -> Result<(), SprintError> {
        let goal = load_goal(self.goals.as_ref(), goal_id)?;
        Access::Author.check(&goal, username)?;

        self.goals.delete(goal_id)?;
        tracing::info!(goal_id, username, "deleted goal");

        self.mirror(
            "remove authored goal",
            self.profiles.remove_goal(goal_id, &goal.author),
        );
        for mentor in goal.mentors() {
            self.mirror(
                "remove mentored goal",
                self.profiles.remove_mentored(goal_id, mentor),
            );
        }
        Ok(())
    }

    fn mirror(&self, what: &str, result: Result<(), SprintError>) {
        if let Err(e) = result {
            tracing::warn!("profile read-model not updated ({}): {}", what, e);
        }
    }
}
