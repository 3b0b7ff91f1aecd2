// store.rs — GoalStore: persistence for Goal aggregates.
//
// A goal is always written whole, tasks included. `replace` is a
// compare-and-swap on `Goal::version`: a writer holding a stale copy is
// rejected with a conflict instead of silently overwriting someone else's
// join or task. Invite codes are unique across the store; both `insert` and
// `replace` reject a code another goal already holds.
//
// Two backends:
// - MemoryGoalStore — a map behind a mutex, for tests and embedding.
// - JsonGoalStore   — `<store_dir>/<goal_id>.json`, easy to inspect by hand.
//   Writers hold the directory lock from the version check to the rename, so
//   two `sprint` processes joining the same goal cannot both win.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;

use crate::error::SprintError;
use crate::goal::Goal;
use crate::json_dir::JsonDir;

/// Storage contract the lifecycle engines rely on.
pub trait GoalStore: Send + Sync {
    fn get(&self, goal_id: &str) -> Result<Option<Goal>, SprintError>;

    fn find_by_invite_code(&self, code: &str) -> Result<Option<Goal>, SprintError>;

    /// All goals, newest first.
    fn list(&self) -> Result<Vec<Goal>, SprintError>;

    /// Store a brand-new goal. Fails if the id or invite code is taken.
    fn insert(&self, goal: &Goal) -> Result<(), SprintError>;

    /// Replace a stored goal if its version still matches `goal.version`.
    /// On success `goal.version` and `goal.updated_at` are advanced to what
    /// was written.
    fn replace(&self, goal: &mut Goal) -> Result<(), SprintError>;

    /// Returns false if the goal did not exist.
    fn delete(&self, goal_id: &str) -> Result<bool, SprintError>;
}

/// Checks shared by both backends before a replace is applied.
fn check_replace(
    stored: Option<&Goal>,
    goal: &Goal,
    code_owner: Option<&str>,
) -> Result<(), SprintError> {
    let stored = stored.ok_or_else(|| SprintError::GoalNotFound {
        goal_id: goal.id.clone(),
    })?;
    if stored.version != goal.version {
        return Err(SprintError::VersionConflict {
            goal_id: goal.id.clone(),
            expected: goal.version,
            found: stored.version,
        });
    }
    check_code_free(goal, code_owner)
}

fn check_code_free(goal: &Goal, code_owner: Option<&str>) -> Result<(), SprintError> {
    match (&goal.inv_code, code_owner) {
        (Some(code), Some(owner)) if owner != goal.id => Err(SprintError::InviteCodeTaken {
            code: code.clone(),
        }),
        _ => Ok(()),
    }
}

fn newest_first(mut goals: Vec<Goal>) -> Vec<Goal> {
    goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    goals
}

/// In-memory goal store.
#[derive(Default)]
pub struct MemoryGoalStore {
    goals: Mutex<HashMap<String, Goal>>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Goal>>, SprintError> {
        self.goals
            .lock()
            .map_err(|_| SprintError::LockPoisoned("memory goal store"))
    }
}

fn code_owner<'a>(goals: impl IntoIterator<Item = &'a Goal>, goal: &Goal) -> Option<String> {
    let code = goal.inv_code.as_deref()?;
    goals
        .into_iter()
        .find(|g| g.inv_code.as_deref() == Some(code))
        .map(|g| g.id.clone())
}

impl GoalStore for MemoryGoalStore {
    fn get(&self, goal_id: &str) -> Result<Option<Goal>, SprintError> {
        Ok(self.lock()?.get(goal_id).cloned())
    }

    fn find_by_invite_code(&self, code: &str) -> Result<Option<Goal>, SprintError> {
        Ok(self
            .lock()?
            .values()
            .find(|g| g.inv_code.as_deref() == Some(code))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Goal>, SprintError> {
        Ok(newest_first(self.lock()?.values().cloned().collect()))
    }

    fn insert(&self, goal: &Goal) -> Result<(), SprintError> {
        let mut goals = self.lock()?;
        if goals.contains_key(&goal.id) {
            return Err(SprintError::GoalExists {
                goal_id: goal.id.clone(),
            });
        }
        check_code_free(goal, code_owner(goals.values(), goal).as_deref())?;
        goals.insert(goal.id.clone(), goal.clone());
        Ok(())
    }

    fn replace(&self, goal: &mut Goal) -> Result<(), SprintError> {
        let mut goals = self.lock()?;
        let owner = code_owner(goals.values(), goal);
        check_replace(goals.get(&goal.id), goal, owner.as_deref())?;
        goal.version += 1;
        goal.updated_at = Utc::now();
        goals.insert(goal.id.clone(), goal.clone());
        Ok(())
    }

    fn delete(&self, goal_id: &str) -> Result<bool, SprintError> {
        Ok(self.lock()?.remove(goal_id).is_some())
    }
}

/// JSON-file goal store: one document per goal.
pub struct JsonGoalStore {
    docs: JsonDir,
}

impl JsonGoalStore {
    /// Create a store backed by the given directory, creating it if needed.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, SprintError> {
        Ok(Self {
            docs: JsonDir::open(store_dir)?,
        })
    }

    pub fn store_dir(&self) -> &Path {
        self.docs.dir()
    }
}

impl GoalStore for JsonGoalStore {
    fn get(&self, goal_id: &str) -> Result<Option<Goal>, SprintError> {
        self.docs.read(goal_id)
    }

    fn find_by_invite_code(&self, code: &str) -> Result<Option<Goal>, SprintError> {
        Ok(self
            .docs
            .list::<Goal>()?
            .into_iter()
            .find(|g| g.inv_code.as_deref() == Some(code)))
    }

    fn list(&self) -> Result<Vec<Goal>, SprintError> {
        Ok(newest_first(self.docs.list()?))
    }

    fn insert(&self, goal: &Goal) -> Result<(), SprintError> {
        let _lock = self.docs.lock()?;
        if self.docs.read::<Goal>(&goal.id)?.is_some() {
            return Err(SprintError::GoalExists {
                goal_id: goal.id.clone(),
            });
        }
        let all = self.docs.list::<Goal>()?;
        check_code_free(goal, code_owner(&all, goal).as_deref())?;
        self.docs.write(&goal.id, goal)
    }

    fn replace(&self, goal: &mut Goal) -> Result<(), SprintError> {
        let _lock = self.docs.lock()?;
        let stored = self.docs.read::<Goal>(&goal.id)?;
        let owner = match goal.inv_code {
            Some(_) => code_owner(&self.docs.list::<Goal>()?, goal),
            None => None,
        };
        check_replace(stored.as_ref(), goal, owner.as_deref())?;

        let mut next = goal.clone();
        next.version += 1;
        next.updated_at = Utc::now();
        self.docs.write(&next.id, &next)?;
        *goal = next;
        Ok(())
    }

    fn delete(&self, goal_id: &str) -> Result<bool, SprintError> {
        let _lock = self.docs.lock()?;
        self.docs.remove(goal_id)
    }
}
