// service.rs — SprintService: the three engines wired to one set of stores.

use std::sync::Arc;

use crate::config::{ProjectLayout, SprintConfig};
use crate::error::SprintError;
use crate::goal_lifecycle::GoalLifecycle;
use crate::profile::{JsonProfileStore, MemoryProfileStore, ProfileAggregator, ProfileStore};
use crate::store::{GoalStore, JsonGoalStore, MemoryGoalStore};
use crate::task_lifecycle::TaskLifecycle;

pub struct SprintService {
    pub goals: GoalLifecycle,
    pub tasks: TaskLifecycle,
    pub profiles: ProfileAggregator,
}

impl SprintService {
    pub fn new(
        goal_store: Arc<dyn GoalStore>,
        profile_store: Arc<dyn ProfileStore>,
        config: SprintConfig,
    ) -> Self {
        let profiles = ProfileAggregator::new(profile_store);
        Self {
            goals: GoalLifecycle::new(goal_store.clone(), profiles.clone(), config),
            tasks: TaskLifecycle::new(goal_store),
            profiles,
        }
    }

    /// JSON-backed service for a project's `.sprint/` directory.
    pub fn open(layout: &ProjectLayout, config: SprintConfig) -> Result<Self, SprintError> {
        let goal_store = Arc::new(JsonGoalStore::new(&layout.goals_dir)?);
        let profile_store = Arc::new(JsonProfileStore::new(&layout.profiles_dir)?);
        tracing::debug!(dir = %layout.sprint_dir.display(), "opened project stores");
        Ok(Self::new(goal_store, profile_store, config))
    }

    pub fn in_memory(config: SprintConfig) -> Self {
        Self::new(
            Arc::new(MemoryGoalStore::new()),
            Arc::new(MemoryProfileStore::new()),
            config,
        )
    }
}
