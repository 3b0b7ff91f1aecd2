// goal.rs — Goal: the aggregate root for one tracked objective.
//
// A Goal owns its author, up to two mentors, a deadline, an optional invite
// code, and its embedded task list. Status only ever moves forward:
//   InProgress → Completed
//
// The lifecycle engines decide *whether* a change is allowed. The methods
// here only apply changes that have already been validated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{require_text, SprintError};
use crate::task::TaskList;

/// The lifecycle state of a Goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    InProgress,
    /// Terminal.
    Completed,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::InProgress => write!(f, "in_progress"),
            GoalStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Which of the two mentor slots a user occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentorSlot {
    First,
    Second,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    /// Unique identifier, assigned at creation.
    pub id: String,

    /// Username of the creator.
    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor2: Option<String>,

    /// Only ever moves later.
    pub deadline: DateTime<Utc>,

    pub title: String,

    pub desc: String,

    pub status: GoalStatus,

    /// Issued on the first invite request, then fixed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inv_code: Option<String>,

    /// Most recent task first.
    #[serde(default)]
    pub tasks: TaskList,

    /// Optimistic-concurrency stamp. Bumped by the store on every replace.
    #[serde(default)]
    pub version: u64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Create a new goal in the `InProgress` state with no mentors or tasks.
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        desc: impl Into<String>,
        deadline: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.into(),
            mentor1: None,
            mentor2: None,
            deadline,
            title: title.into(),
            desc: desc.into(),
            status: GoalStatus::InProgress,
            inv_code: None,
            tasks: TaskList::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Title 10-100 characters, description 10-500, neither blank.
    pub fn validate_text(title: &str, desc: &str) -> Result<(), SprintError> {
        require_text("Title", title, 10..=100)?;
        require_text("Description", desc, 10..=500)
    }

    pub fn is_completed(&self) -> bool {
        self.status == GoalStatus::Completed
    }

    /// The slot `username` occupies, if any.
    pub fn mentor_slot(&self, username: &str) -> Option<MentorSlot> {
        if self.mentor1.as_deref() == Some(username) {
            Some(MentorSlot::First)
        } else if self.mentor2.as_deref() == Some(username) {
            Some(MentorSlot::Second)
        } else {
            None
        }
    }

    pub fn is_mentor(&self, username: &str) -> bool {
        self.mentor_slot(username).is_some()
    }

    pub fn mentors(&self) -> impl Iterator<Item = &str> {
        self.mentor1
            .as_deref()
            .into_iter()
            .chain(self.mentor2.as_deref())
    }

    pub fn has_free_mentor_slot(&self) -> bool {
        self.mentor1.is_none() || self.mentor2.is_none()
    }

    /// Seat a mentor. Mentor1 is filled unless it is taken and mentor2 is
    /// free. Returns `None` when both slots are occupied.
    pub fn seat_mentor(&mut self, username: impl Into<String>) -> Option<MentorSlot> {
        let slot = match (&self.mentor1, &self.mentor2) {
            (Some(_), None) => MentorSlot::Second,
            (None, _) => MentorSlot::First,
            (Some(_), Some(_)) => return None,
        };
        match slot {
            MentorSlot::First => self.mentor1 = Some(username.into()),
            MentorSlot::Second => self.mentor2 = Some(username.into()),
        }
        Some(slot)
    }

    /// Clear whichever slot `username` occupies.
    pub fn unseat_mentor(&mut self, username: &str) -> Option<MentorSlot> {
        let slot = self.mentor_slot(username)?;
        match slot {
            MentorSlot::First => self.mentor1 = None,
            MentorSlot::Second => self.mentor2 = None,
        }
        Some(slot)
    }

    /// Lightweight summary used by profile read-models.
    pub fn summary(&self) -> GoalSummary {
        GoalSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            desc: self.desc.clone(),
            author: self.author.clone(),
        }
    }
}

/// Denormalized view of a goal stored inside user profiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GoalSummary {
    pub id: String,
    pub title: String,
    pub desc: String,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_goal() -> Goal {
        Goal::new(
            "alice",
            "Run a marathon",
            "Train for the spring race",
            Utc::now() + Duration::days(7),
        )
    }

    #[test]
    fn new_goal_starts_in_progress_and_empty() {
        let g = test_goal();
        assert_eq!(g.status, GoalStatus::InProgress);
        assert!(g.mentor1.is_none());
        assert!(g.mentor2.is_none());
        assert!(g.inv_code.is_none());
        assert!(g.tasks.is_empty());
        assert_eq!(g.version, 0);
    }

    #[test]
    fn seat_mentor_prefers_first_slot() {
        let mut g = test_goal();
        assert_eq!(g.seat_mentor("bob"), Some(MentorSlot::First));
        assert_eq!(g.seat_mentor("carol"), Some(MentorSlot::Second));
        assert_eq!(g.seat_mentor("dave"), None);
    }

    #[test]
    fn seat_mentor_refills_vacated_first_slot() {
        let mut g = test_goal();
        g.mentor2 = Some("carol".into());
        assert_eq!(g.seat_mentor("bob"), Some(MentorSlot::First));
        assert_eq!(g.mentor1.as_deref(), Some("bob"));
    }

    #[test]
    fn unseat_clears_matching_slot_only() {
        let mut g = test_goal();
        g.seat_mentor("bob");
        g.seat_mentor("carol");
        assert_eq!(g.unseat_mentor("carol"), Some(MentorSlot::Second));
        assert_eq!(g.mentor1.as_deref(), Some("bob"));
        assert!(g.mentor2.is_none());
        assert_eq!(g.unseat_mentor("carol"), None);
    }

    #[test]
    fn mentors_iterates_occupied_slots() {
        let mut g = test_goal();
        g.mentor2 = Some("carol".into());
        assert_eq!(g.mentors().collect::<Vec<_>>(), vec!["carol"]);
    }

    #[test]
    fn title_and_description_limits() {
        assert!(Goal::validate_text("Run a marathon", "Train for the spring race").is_ok());
        assert!(matches!(
            Goal::validate_text("", "Train for the spring race"),
            Err(SprintError::MissingField { field: "Title" })
        ));
        assert!(matches!(
            Goal::validate_text("Run", "Train for the spring race"),
            Err(SprintError::FieldLength { field: "Title", .. })
        ));
        assert!(matches!(
            Goal::validate_text("Run a marathon", &"x".repeat(501)),
            Err(SprintError::FieldLength { field: "Description", .. })
        ));
        assert!(matches!(
            Goal::validate_text("Run a marathon", "  "),
            Err(SprintError::MissingField { field: "Description" })
        ));
    }

    #[test]
    fn empty_mentor_slots_omitted_from_json() {
        let g = test_goal();
        let json = serde_json::to_string_pretty(&g).unwrap();
        assert!(!json.contains("mentor1"));
        assert!(!json.contains("inv_code"));
        assert!(json.contains("\"IN_PROGRESS\""));
        let restored: Goal = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, g);
    }
}
