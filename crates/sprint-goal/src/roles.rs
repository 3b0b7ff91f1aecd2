// roles.rs — Who a caller is with respect to a goal.
//
// Authorization is resolved in one place: `role_in_goal` maps a username to
// its role on a goal, and each operation names the `Access` it needs. The
// check order inside the engines stays explicit; this module only answers
// "is this user allowed" and builds the matching rejection.

use serde::{Deserialize, Serialize};

use crate::error::SprintError;
use crate::goal::Goal;

/// A caller's relationship to one goal.
///
/// The author can never be a mentor, so every username resolves to exactly
/// one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalRole {
    Author,
    Mentor,
    Outsider,
}

pub fn role_in_goal(goal: &Goal, username: &str) -> GoalRole {
    if goal.author == username {
        GoalRole::Author
    } else if goal.is_mentor(username) {
        GoalRole::Mentor
    } else {
        GoalRole::Outsider
    }
}

/// The role set an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Author only.
    Author,
    /// Either mentor.
    Mentor,
    /// Author or either mentor.
    Member,
}

impl Access {
    pub fn allows(self, role: GoalRole) -> bool {
        matches!(
            (self, role),
            (Access::Author, GoalRole::Author)
                | (Access::Mentor, GoalRole::Mentor)
                | (Access::Member, GoalRole::Author | GoalRole::Mentor)
        )
    }

    /// Resolve `username`'s role and reject it if this access level does not
    /// cover it.
    pub fn check(self, goal: &Goal, username: &str) -> Result<GoalRole, SprintError> {
        let role = role_in_goal(goal, username);
        if self.allows(role) {
            return Ok(role);
        }
        let (username, goal_id) = (username.to_string(), goal.id.clone());
        Err(match self {
            Access::Author => SprintError::NotAuthor { username, goal_id },
            Access::Mentor => SprintError::NotMentor { username, goal_id },
            Access::Member => SprintError::NotMember { username, goal_id },
        })
    }
}

/// An already-authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: String,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
        }
    }

    /// Coarse allow-list check on the principal's role (case-insensitive).
    pub fn require_role(&self, allowed: &[String], action: &'static str) -> Result<(), SprintError> {
        if allowed.iter().any(|r| r.eq_ignore_ascii_case(&self.role)) {
            return Ok(());
        }
        Err(SprintError::RoleNotAllowed {
            role: self.role.clone(),
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn goal_with_mentor() -> Goal {
        let mut g = Goal::new("alice", "t", "d", Utc::now() + Duration::days(1));
        g.mentor2 = Some("bob".into());
        g
    }

    #[test]
    fn resolves_each_role() {
        let g = goal_with_mentor();
        assert_eq!(role_in_goal(&g, "alice"), GoalRole::Author);
        assert_eq!(role_in_goal(&g, "bob"), GoalRole::Mentor);
        assert_eq!(role_in_goal(&g, "eve"), GoalRole::Outsider);
    }

    #[test]
    fn access_levels_cover_expected_roles() {
        assert!(Access::Member.allows(GoalRole::Author));
        assert!(Access::Member.allows(GoalRole::Mentor));
        assert!(!Access::Member.allows(GoalRole::Outsider));
        assert!(!Access::Mentor.allows(GoalRole::Author));
        assert!(!Access::Author.allows(GoalRole::Mentor));
    }

    #[test]
    fn check_reports_operation_specific_error() {
        let g = goal_with_mentor();
        assert!(matches!(
            Access::Author.check(&g, "bob"),
            Err(SprintError::NotAuthor { .. })
        ));
        assert!(matches!(
            Access::Mentor.check(&g, "alice"),
            Err(SprintError::NotMentor { .. })
        ));
        assert!(matches!(
            Access::Member.check(&g, "eve"),
            Err(SprintError::NotMember { .. })
        ));
        assert_eq!(Access::Member.check(&g, "bob").unwrap(), GoalRole::Mentor);
    }

    #[test]
    fn principal_role_allow_list() {
        let allowed = vec!["ADMIN".to_string()];
        assert!(Principal::new("root", "admin")
            .require_role(&allowed, "list all goals")
            .is_ok());
        let err = Principal::new("alice", "USER")
            .require_role(&allowed, "list all goals")
            .unwrap_err();
        assert_eq!(err.http_status(), 403);
    }
}
