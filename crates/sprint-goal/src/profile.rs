// profile.rs — UserProfile read-model and the ProfileAggregator.
//
// Profiles are a denormalized mirror of goal membership: each holds short
// summaries of the goals a user authored and the goals they mentor, so a
// profile page never has to scan every goal. Goals remain the source of
// truth; the lifecycle engine updates profiles after a goal write succeeds.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SprintError;
use crate::goal::{Goal, GoalSummary};
use crate::json_dir::JsonDir;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{3,15}$").expect("username pattern compiles"));

/// Registration data for a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Usernames are 4–10 characters of `[a-z0-9_-]`; names must not be blank.
    pub fn validate(&self) -> Result<(), SprintError> {
        let len = self.username.chars().count();
        if !USERNAME_PATTERN.is_match(&self.username) || !(4..=10).contains(&len) {
            return Err(SprintError::InvalidUsername {
                username: self.username.clone(),
                reason: "must be 4-10 characters of a-z, 0-9, '_' or '-'".to_string(),
            });
        }
        if self.first_name.trim().is_empty() {
            return Err(SprintError::MissingField {
                field: "First name",
            });
        }
        if self.last_name.trim().is_empty() {
            return Err(SprintError::MissingField { field: "Last name" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    #[serde(default)]
    pub num_goals_completed: u64,

    #[serde(default)]
    pub num_goals_mentored: u64,

    /// Goals this user authored.
    #[serde(default)]
    pub goals: Vec<GoalSummary>,

    /// Goals this user mentors.
    #[serde(default)]
    pub mentored: Vec<GoalSummary>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user: &NewUser) -> Self {
        let now = Utc::now();
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            num_goals_completed: 0,
            num_goals_mentored: 0,
            goals: Vec::new(),
            mentored: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Storage contract for profiles, keyed by username.
pub trait ProfileStore: Send + Sync {
    fn get(&self, username: &str) -> Result<Option<UserProfile>, SprintError>;

    /// Store a new profile. Fails with a conflict if the username is taken.
    fn insert(&self, profile: &UserProfile) -> Result<(), SprintError>;

    /// Read, modify and write one profile as a single step: no other
    /// update of the same store can interleave. Stamps `updated_at`.
    /// NotFound if the profile is missing; an error from `apply` leaves the
    /// stored profile unchanged.
    fn update(
        &self,
        username: &str,
        apply: &mut dyn FnMut(&mut UserProfile) -> Result<(), SprintError>,
    ) -> Result<(), SprintError>;
}

fn profile_not_found(username: &str) -> SprintError {
    SprintError::ProfileNotFound {
        username: username.to_string(),
    }
}

/// In-memory profile store.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, UserProfile>>, SprintError> {
        self.profiles
            .lock()
            .map_err(|_| SprintError::LockPoisoned("memory profile store"))
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, username: &str) -> Result<Option<UserProfile>, SprintError> {
        Ok(self.lock()?.get(username).cloned())
    }

    fn insert(&self, profile: &UserProfile) -> Result<(), SprintError> {
        let mut profiles = self.lock()?;
        if profiles.contains_key(&profile.username) {
            return Err(SprintError::ProfileExists {
                username: profile.username.clone(),
            });
        }
        profiles.insert(profile.username.clone(), profile.clone());
        Ok(())
    }

    fn update(
        &self,
        username: &str,
        apply: &mut dyn FnMut(&mut UserProfile) -> Result<(), SprintError>,
    ) -> Result<(), SprintError> {
        let mut profiles = self.lock()?;
        let stored = profiles
            .get_mut(username)
            .ok_or_else(|| profile_not_found(username))?;
        let mut next = stored.clone();
        apply(&mut next)?;
        next.updated_at = Utc::now();
        *stored = next;
        Ok(())
    }
}

/// JSON-file profile store: `<dir>/<username>.json`. Writers hold the
/// directory lock, so updates from separate processes do not overwrite
/// each other.
pub struct JsonProfileStore {
    docs: JsonDir,
}

impl JsonProfileStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, SprintError> {
        Ok(Self {
            docs: JsonDir::open(dir)?,
        })
    }
}

impl ProfileStore for JsonProfileStore {
    fn get(&self, username: &str) -> Result<Option<UserProfile>, SprintError> {
        self.docs.read(username)
    }

    fn insert(&self, profile: &UserProfile) -> Result<(), SprintError> {
        let _lock = self.docs.lock()?;
        if self.docs.read::<UserProfile>(&profile.username)?.is_some() {
            return Err(SprintError::ProfileExists {
                username: profile.username.clone(),
            });
        }
        self.docs.write(&profile.username, profile)
    }

    fn update(
        &self,
        username: &str,
        apply: &mut dyn FnMut(&mut UserProfile) -> Result<(), SprintError>,
    ) -> Result<(), SprintError> {
        let _lock = self.docs.lock()?;
        let mut profile = self
            .docs
            .read::<UserProfile>(username)?
            .ok_or_else(|| profile_not_found(username))?;
        apply(&mut profile)?;
        profile.updated_at = Utc::now();
        self.docs.write(username, &profile)
    }
}

/// Maintains the profile read-model.
#[derive(Clone)]
pub struct ProfileAggregator {
    store: Arc<dyn ProfileStore>,
}

impl ProfileAggregator {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Register a user with an empty profile.
    pub fn create_profile(&self, user: &NewUser) -> Result<UserProfile, SprintError> {
        user.validate()?;
        let profile = UserProfile::new(user);
        self.store.insert(&profile)?;
        tracing::info!(username = %profile.username, "created profile");
        Ok(profile)
    }

    pub fn get_profile(&self, username: &str) -> Result<UserProfile, SprintError> {
        self.store
            .get(username)?
            .ok_or_else(|| profile_not_found(username))
    }

    pub fn add_goal(&self, goal: &Goal, username: &str) -> Result<(), SprintError> {
        self.update(username, |p| {
            p.goals.push(goal.summary());
            Ok(())
        })?;
        tracing::info!(goal_id = %goal.id, username, "added goal to profile");
        Ok(())
    }

    pub fn add_mentored(&self, goal: &Goal, username: &str) -> Result<(), SprintError> {
        self.update(username, |p| {
            p.mentored.push(goal.summary());
            Ok(())
        })?;
        tracing::info!(goal_id = %goal.id, username, "added mentored goal to profile");
        Ok(())
    }

    pub fn remove_goal(&self, goal_id: &str, username: &str) -> Result<(), SprintError> {
        self.update(username, |p| remove_summary(&mut p.goals, goal_id, username))?;
        tracing::info!(goal_id, username, "removed goal from profile");
        Ok(())
    }

    pub fn remove_mentored(&self, goal_id: &str, username: &str) -> Result<(), SprintError> {
        self.update(username, |p| {
            remove_summary(&mut p.mentored, goal_id, username)
        })?;
        tracing::info!(goal_id, username, "removed mentored goal from profile");
        Ok(())
    }

    /// Count a completed goal for its author and current mentors.
    pub fn record_completion(&self, goal: &Goal) -> Vec<(String, SprintError)> {
        let mut failures = Vec::new();
        if let Err(e) = self.update(&goal.author, |p| {
            p.num_goals_completed += 1;
            Ok(())
        }) {
            failures.push((goal.author.clone(), e));
        }
        for mentor in goal.mentors() {
            if let Err(e) = self.update(mentor, |p| {
                p.num_goals_mentored += 1;
                Ok(())
            }) {
                failures.push((mentor.to_string(), e));
            }
        }
        failures
    }

    fn update(
        &self,
        username: &str,
        mut apply: impl FnMut(&mut UserProfile) -> Result<(), SprintError>,
    ) -> Result<(), SprintError> {
        self.store.update(username, &mut apply)
    }
}

fn remove_summary(
    list: &mut Vec<GoalSummary>,
    goal_id: &str,
    username: &str,
) -> Result<(), SprintError> {
    let index = list.iter().position(|s| s.id == goal_id).ok_or_else(|| {
        SprintError::ProfileGoalNotFound {
            username: username.to_string(),
            goal_id: goal_id.to_string(),
        }
    })?;
    list.remove(index);
    Ok(())
}
