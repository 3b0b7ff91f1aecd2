// task_lifecycle.rs — TaskLifecycle: create, submit, approve, read, delete.
//
// Tasks are stored inside their goal, so every operation loads the goal,
// edits its task list, and replaces the whole goal. Who may act differs per
// operation:
//   create / read submission / delete — author or mentor
//   submit                             — author only
//   approve                            — mentor only

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::SprintError;
use crate::goal::Goal;
use crate::goal_lifecycle::{ensure_in_progress, load_goal};
use crate::roles::Access;
use crate::store::GoalStore;
use crate::task::{Submission, Task};

fn task_not_found(task_id: &str) -> SprintError {
    SprintError::TaskNotFound {
        task_id: task_id.to_string(),
    }
}

pub struct TaskLifecycle {
    goals: Arc<dyn GoalStore>,
}

impl TaskLifecycle {
    pub fn new(goals: Arc<dyn GoalStore>) -> Self {
        Self { goals }
    }

    fn load(&self, goal_id: &str) -> Result<Goal, SprintError> {
        load_goal(self.goals.as_ref(), goal_id)
    }

    /// Add a task at the front of the goal's list. Returns the task id.
    pub fn create_task(
        &self,
        goal_id: &str,
        username: &str,
        desc: &str,
        deadline: DateTime<Utc>,
    ) -> Result<String, SprintError> {
        self.try_create_task(goal_id, username, desc, deadline)
            .inspect_err(|e| tracing::warn!(goal_id, username, "create task rejected: {}", e))
    }

    fn try_create_task(
        &self,
        goal_id: &str,
        username: &str,
        desc: &str,
        deadline: DateTime<Utc>,
    ) -> Result<String, SprintError> {
        let mut goal = self.load(goal_id)?;
        Access::Member.check(&goal, username)?;
        ensure_in_progress(&goal)?;
        // Equal to the goal deadline is allowed.
        if deadline > goal.deadline {
            return Err(SprintError::TaskAfterGoalDeadline {
                goal_id: goal_id.to_string(),
            });
        }

        let task = Task::new(desc, deadline, username);
        let task_id = task.id.clone();
        goal.tasks.prepend(task);
        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, task_id = %task_id, username, "added task");
        Ok(task_id)
    }

    /// Hand in work for a task. Returns the goal id.
    pub fn submit_task(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
        submission: Submission,
    ) -> Result<String, SprintError> {
        self.try_submit_task(goal_id, task_id, username, submission)
            .inspect_err(|e| tracing::warn!(goal_id, task_id, username, "submit rejected: {}", e))
    }

    fn try_submit_task(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
        submission: Submission,
    ) -> Result<String, SprintError> {
        submission.validate()?;
        let mut goal = self.load(goal_id)?;
        Access::Author.check(&goal, username)?;
        ensure_in_progress(&goal)?;
        let task = goal
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| task_not_found(task_id))?;

        task.submit(submission);
        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, task_id, "added a new submission");
        Ok(goal.id)
    }

    /// Approve a pending submission. Returns the goal id.
    pub fn approve_task(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
    ) -> Result<String, SprintError> {
        self.try_approve_task(goal_id, task_id, username)
            .inspect_err(|e| tracing::warn!(goal_id, task_id, username, "approve rejected: {}", e))
    }

    fn try_approve_task(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
    ) -> Result<String, SprintError> {
        let mut goal = self.load(goal_id)?;
        Access::Mentor.check(&goal, username)?;
        ensure_in_progress(&goal)?;
        let task = goal
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| task_not_found(task_id))?;
        if !task.approve() {
            return Err(SprintError::NoSubmission {
                task_id: task_id.to_string(),
            });
        }

        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, task_id, username, "approved task");
        Ok(goal.id)
    }

    /// The submission of a task awaiting review.
    pub fn get_submission(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
    ) -> Result<Submission, SprintError> {
        let goal = self.load(goal_id)?;
        Access::Member
            .check(&goal, username)
            .inspect_err(|e| tracing::warn!(goal_id, username, "{}", e))?;
        let task = goal.tasks.get(task_id).ok_or_else(|| task_not_found(task_id))?;
        let submission = task
            .pending_submission()
            .cloned()
            .ok_or_else(|| SprintError::NoSubmission {
                task_id: task_id.to_string(),
            })?;
        tracing::debug!(goal_id, task_id, "fetching submission");
        Ok(submission)
    }

    /// Remove a task. Returns the goal id.
    pub fn delete_task(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
    ) -> Result<String, SprintError> {
        self.try_delete_task(goal_id, task_id, username)
            .inspect_err(|e| tracing::warn!(goal_id, task_id, username, "delete task rejected: {}", e))
    }

    fn try_delete_task(
        &self,
        goal_id: &str,
        task_id: &str,
        username: &str,
    ) -> Result<String, SprintError> {
        let mut goal = self.load(goal_id)?;
        Access::Member.check(&goal, username)?;
        ensure_in_progress(&goal)?;
        goal.tasks
            .remove(task_id)
            .ok_or_else(|| task_not_found(task_id))?;

        self.goals.replace(&mut goal)?;
        tracing::info!(goal_id, task_id, username, "removed task");
        Ok(goal.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;
    use crate::store::MemoryGoalStore;
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryGoalStore>,
        tasks: TaskLifecycle,
        goal_id: String,
        deadline: DateTime<Utc>,
    }

    /// Goal by alice with bobby as mentor1, due in a week.
    fn fixture() -> Fixture {
        let store = Arc::new(MemoryGoalStore::new());
        let deadline = Utc::now() + Duration::days(7);
        let mut goal = Goal::new("alice", "Ship it", "Release 1.0", deadline);
        goal.mentor1 = Some("bobby".into());
        store.insert(&goal).unwrap();
        Fixture {
            tasks: TaskLifecycle::new(store.clone()),
            store,
            goal_id: goal.id,
            deadline,
        }
    }

    fn goal(f: &Fixture) -> Goal {
        f.store.get(&f.goal_id).unwrap().unwrap()
    }

    fn new_task(f: &Fixture, who: &str) -> String {
        f.tasks
            .create_task(&f.goal_id, who, "write docs", f.deadline - Duration::days(1))
            .unwrap()
    }

    fn submission() -> Submission {
        Submission::new("first pass is done", "https://example.com/pr/1")
    }

    #[test]
    fn task_after_goal_deadline_rejected() {
        let f = fixture();
        let err = f
            .tasks
            .create_task(&f.goal_id, "alice", "late", f.deadline + Duration::days(1))
            .unwrap_err();
        assert!(matches!(err, SprintError::TaskAfterGoalDeadline { .. }));
        assert_eq!(err.to_string(), "Cannot create a task after goal deadline");
        assert!(goal(&f).tasks.is_empty());
    }

    #[test]
    fn task_on_goal_deadline_allowed_and_prepended() {
        let f = fixture();
        let first = new_task(&f, "alice");
        let second = f
            .tasks
            .create_task(&f.goal_id, "bobby", "review", f.deadline)
            .unwrap();

        let g = goal(&f);
        assert_eq!(g.tasks.position(&second), Some(0));
        assert_eq!(g.tasks.position(&first), Some(1));
        let t = g.tasks.get(&second).unwrap();
        assert_eq!(t.status, TaskStatus::New);
        assert_eq!(t.assigned_by, "bobby");
    }

    #[test]
    fn outsider_cannot_create_task() {
        let f = fixture();
        assert!(matches!(
            f.tasks
                .create_task(&f.goal_id, "eve", "x", f.deadline),
            Err(SprintError::NotMember { .. })
        ));
        assert!(matches!(
            f.tasks.create_task("missing", "alice", "x", f.deadline),
            Err(SprintError::GoalNotFound { .. })
        ));
    }

    #[test]
    fn submit_then_approve_round_trip() {
        let f = fixture();
        let task_id = new_task(&f, "alice");

        assert_eq!(
            f.tasks
                .submit_task(&f.goal_id, &task_id, "alice", submission())
                .unwrap(),
            f.goal_id
        );
        let g = goal(&f);
        let t = g.tasks.get(&task_id).unwrap();
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.submission, Some(submission()));

        f.tasks.approve_task(&f.goal_id, &task_id, "bobby").unwrap();
        assert_eq!(
            goal(&f).tasks.get(&task_id).unwrap().status,
            TaskStatus::Completed
        );

        assert!(matches!(
            f.tasks.approve_task(&f.goal_id, &task_id, "bobby"),
            Err(SprintError::NoSubmission { .. })
        ));
    }

    #[test]
    fn only_author_submits() {
        let f = fixture();
        let task_id = new_task(&f, "bobby");
        assert!(matches!(
            f.tasks
                .submit_task(&f.goal_id, &task_id, "bobby", submission()),
            Err(SprintError::NotAuthor { .. })
        ));
        assert!(matches!(
            f.tasks
                .submit_task(&f.goal_id, "no-such-task", "alice", submission()),
            Err(SprintError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn submit_finds_tasks_beyond_the_first() {
        let f = fixture();
        let older = new_task(&f, "alice");
        new_task(&f, "alice");
        f.tasks
            .submit_task(&f.goal_id, &older, "alice", submission())
            .unwrap();
        assert_eq!(
            goal(&f).tasks.get(&older).unwrap().status,
            TaskStatus::Pending
        );
    }

    #[test]
    fn resubmission_allowed() {
        let f = fixture();
        let task_id = new_task(&f, "alice");
        f.tasks
            .submit_task(&f.goal_id, &task_id, "alice", submission())
            .unwrap();
        f.tasks
            .submit_task(
                &f.goal_id,
                &task_id,
                "alice",
                Submission::new("second pass is done", "https://example.com/pr/2"),
            )
            .unwrap();
        let got = f
            .tasks
            .get_submission(&f.goal_id, &task_id, "bobby")
            .unwrap();
        assert_eq!(got.comment, "second pass is done");
    }

    #[test]
    fn resubmitting_approved_task_reopens_review() {
        let f = fixture();
        let task_id = new_task(&f, "alice");
        f.tasks
            .submit_task(&f.goal_id, &task_id, "alice", submission())
            .unwrap();
        f.tasks.approve_task(&f.goal_id, &task_id, "bobby").unwrap();

        let redo = Submission::new("follow-up after review", "https://example.com/pr/3");
        f.tasks
            .submit_task(&f.goal_id, &task_id, "alice", redo.clone())
            .unwrap();
        let t = goal(&f).tasks.get(&task_id).unwrap().clone();
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.submission, Some(redo.clone()));
        assert_eq!(
            f.tasks
                .get_submission(&f.goal_id, &task_id, "bobby")
                .unwrap(),
            redo
        );
    }

    #[test]
    fn submission_comment_is_validated_first() {
        let f = fixture();
        let task_id = new_task(&f, "alice");
        let before = goal(&f);

        assert!(matches!(
            f.tasks.submit_task(
                &f.goal_id,
                &task_id,
                "alice",
                Submission::new("", "https://example.com")
            ),
            Err(SprintError::MissingField { field: "Comment" })
        ));
        assert!(matches!(
            f.tasks.submit_task(
                &f.goal_id,
                &task_id,
                "alice",
                Submission::new("short", "https://example.com")
            ),
            Err(SprintError::FieldLength { field: "Comment", .. })
        ));
        assert!(matches!(
            f.tasks.submit_task(
                &f.goal_id,
                &task_id,
                "alice",
                Submission::new("x".repeat(51), "https://example.com")
            ),
            Err(SprintError::FieldLength { field: "Comment", .. })
        ));
        // Input is checked before the goal is even loaded.
        assert!(matches!(
            f.tasks.submit_task(
                "missing",
                &task_id,
                "alice",
                Submission::new("", "https://example.com")
            ),
            Err(SprintError::MissingField { .. })
        ));
        assert_eq!(goal(&f), before);
    }

    #[test]
    fn approve_requires_mentor_and_pending() {
        let f = fixture();
        let task_id = new_task(&f, "alice");
        assert!(matches!(
            f.tasks.approve_task(&f.goal_id, &task_id, "alice"),
            Err(SprintError::NotMentor { .. })
        ));
        assert!(matches!(
            f.tasks.approve_task(&f.goal_id, &task_id, "bobby"),
            Err(SprintError::NoSubmission { .. })
        ));
        assert!(matches!(
            f.tasks.approve_task(&f.goal_id, "ghost", "bobby"),
            Err(SprintError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn get_submission_rules() {
        let f = fixture();
        let task_id = new_task(&f, "alice");

        assert!(matches!(
            f.tasks.get_submission(&f.goal_id, &task_id, "alice"),
            Err(SprintError::NoSubmission { .. })
        ));
        f.tasks
            .submit_task(&f.goal_id, &task_id, "alice", submission())
            .unwrap();
        assert_eq!(
            f.tasks
                .get_submission(&f.goal_id, &task_id, "alice")
                .unwrap(),
            submission()
        );
        assert!(matches!(
            f.tasks.get_submission(&f.goal_id, &task_id, "eve"),
            Err(SprintError::NotMember { .. })
        ));
        assert!(matches!(
            f.tasks.get_submission("missing", &task_id, "alice"),
            Err(SprintError::GoalNotFound { .. })
        ));
        assert!(matches!(
            f.tasks.get_submission(&f.goal_id, "ghost", "alice"),
            Err(SprintError::TaskNotFound { .. })
        ));

        // Once approved, the submission is no longer served.
        f.tasks.approve_task(&f.goal_id, &task_id, "bobby").unwrap();
        assert!(matches!(
            f.tasks.get_submission(&f.goal_id, &task_id, "bobby"),
            Err(SprintError::NoSubmission { .. })
        ));
    }

    #[test]
    fn delete_task_by_member() {
        let f = fixture();
        let task_id = new_task(&f, "alice");
        assert!(matches!(
            f.tasks.delete_task(&f.goal_id, &task_id, "eve"),
            Err(SprintError::NotMember { .. })
        ));
        f.tasks.delete_task(&f.goal_id, &task_id, "bobby").unwrap();
        assert!(goal(&f).tasks.is_empty());
        assert!(matches!(
            f.tasks.delete_task(&f.goal_id, &task_id, "alice"),
            Err(SprintError::TaskNotFound { .. })
        ));
    }

    #[test]
    fn completed_goal_freezes_tasks() {
        let f = fixture();
        let task_id = new_task(&f, "alice");
        let pending = new_task(&f, "alice");
        f.tasks
            .submit_task(&f.goal_id, &pending, "alice", submission())
            .unwrap();
        let mut g = goal(&f);
        g.status = crate::goal::GoalStatus::Completed;
        f.store.replace(&mut g).unwrap();

        assert!(matches!(
            f.tasks.create_task(&f.goal_id, "alice", "x", f.deadline),
            Err(SprintError::GoalCompleted { .. })
        ));
        assert!(matches!(
            f.tasks.delete_task(&f.goal_id, &task_id, "alice"),
            Err(SprintError::GoalCompleted { .. })
        ));
        assert!(matches!(
            f.tasks
                .submit_task(&f.goal_id, &task_id, "alice", submission()),
            Err(SprintError::GoalCompleted { .. })
        ));
        assert!(matches!(
            f.tasks.approve_task(&f.goal_id, &pending, "bobby"),
            Err(SprintError::GoalCompleted { .. })
        ));
        // Role checks still come first.
        assert!(matches!(
            f.tasks.approve_task(&f.goal_id, &pending, "alice"),
            Err(SprintError::NotMentor { .. })
        ));

        let g = goal(&f);
        assert_eq!(g.tasks.len(), 2);
        assert_eq!(g.tasks.get(&task_id).unwrap().status, TaskStatus::New);
        assert_eq!(g.tasks.get(&pending).unwrap().status, TaskStatus::Pending);
        // Reading a pending submission is not a mutation.
        assert!(f.tasks.get_submission(&f.goal_id, &pending, "bobby").is_ok());
    }

    #[test]
    fn rejected_call_leaves_goal_untouched() {
        let f = fixture();
        let before = goal(&f);
        let _ = f
            .tasks
            .create_task(&f.goal_id, "alice", "late", f.deadline + Duration::hours(1));
        assert_eq!(goal(&f), before);
    }
}
