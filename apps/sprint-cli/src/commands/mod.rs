pub mod goal;
pub mod profile;
pub mod task;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sprint_goal::{Principal, SprintService};

/// Everything a command needs: the engines and who is calling.
pub struct Context {
    pub service: SprintService,
    pub principal: Option<Principal>,
    pub json: bool,
}

impl Context {
    pub fn principal(&self) -> anyhow::Result<&Principal> {
        self.principal
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no user given; pass --user or set SPRINT_USER"))
    }

    pub fn username(&self) -> anyhow::Result<&str> {
        Ok(&self.principal()?.username)
    }
}

/// Parse an RFC 3339 timestamp (e.g. `2026-11-01T17:00:00Z`).
pub fn parse_deadline(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid deadline '{}': expected RFC 3339 timestamp", raw))?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let d = parse_deadline("2026-11-01T19:00:00+02:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2026-11-01T17:00:00+00:00");
    }

    #[test]
    fn rejects_malformed_deadline() {
        let err = parse_deadline("next friday").unwrap_err();
        assert!(err.to_string().contains("invalid deadline"));
    }

    #[test]
    fn truncate_long_titles() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long goal title", 10), "a very ...");
    }

    #[test]
    fn missing_user_is_reported() {
        let ctx = Context {
            principal: None,
            ..test_support::context("alice")
        };
        assert!(ctx.username().unwrap_err().to_string().contains("--user"));
    }
}
