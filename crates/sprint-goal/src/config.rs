// config.rs — Project configuration and on-disk layout.
//
// Everything lives under `<project>/.sprint/`:
//   config.toml   — optional overrides (this file's SprintConfig)
//   goals/        — JsonGoalStore, one document per goal
//   profiles/     — JsonProfileStore, one document per user

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tunables read from `.sprint/config.toml`. Every field has a default, so
/// an empty or missing file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SprintConfig {
    /// Principal roles allowed to list every goal.
    #[serde(default = "default_list_all_roles")]
    pub list_all_roles: Vec<String>,

    /// tracing-subscriber filter used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            list_all_roles: default_list_all_roles(),
            log_filter: default_log_filter(),
        }
    }
}

// Serde default functions
fn default_list_all_roles() -> Vec<String> {
    vec!["ADMIN".to_string()]
}

fn default_log_filter() -> String {
    "sprint_goal=info,sprint=info".to_string()
}

impl SprintConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load config, returning defaults if the file is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), "ignoring unreadable config: {}", e);
                }
                Self::default()
            }
        }
    }
}

/// Where a project's state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub sprint_dir: PathBuf,
    pub config_file: PathBuf,
    pub goals_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

impl ProjectLayout {
    /// Standard `.sprint/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let sprint_dir = root.join(".sprint");
        Self {
            root,
            config_file: sprint_dir.join("config.toml"),
            goals_dir: sprint_dir.join("goals"),
            profiles_dir: sprint_dir.join("profiles"),
            sprint_dir,
        }
    }

    pub fn load_config(&self) -> SprintConfig {
        SprintConfig::load_or_default(&self.config_file)
    }
}
