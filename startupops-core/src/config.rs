use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::board::TaskBoard;
use crate::error::OpsError;
use crate::models::{default_lanes, Lane};
use crate::session::Role;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "STARTUPOPS_CONFIG";
/// Environment variable overriding the workspace file location
pub const WORKSPACE_ENV_VAR: &str = "STARTUPOPS_WORKSPACE";
/// Workspace file used when nothing else is configured
pub const DEFAULT_WORKSPACE_FILE: &str = "startupops.yaml";

/// User configuration, stored as YAML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Path to the workspace YAML file
    #[serde(default = "default_workspace_path")]
    pub workspace_path: String,

    /// Optional SQLite document store mirroring saved records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<String>,

    /// Board lanes, in display order. New tasks enter the first one.
    #[serde(default = "default_lanes")]
    pub lanes: Vec<Lane>,

    /// Lane counted as finished for the execution score
    #[serde(default = "default_done_lane")]
    pub done_lane: String,

    /// Milestone tags offered when adding tasks
    #[serde(default = "default_milestones")]
    pub milestones: Vec<String>,

    /// Role assumed when the CLI is not told otherwise
    #[serde(default)]
    pub default_role: Role,
}

fn default_workspace_path() -> String {
    DEFAULT_WORKSPACE_FILE.to_string()
}

fn default_done_lane() -> String {
    "done".to_string()
}

fn default_milestones() -> Vec<String> {
    vec!["MVP".to_string(), "Beta".to_string(), "Growth".to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace_path: default_workspace_path(),
            documents_path: None,
            lanes: default_lanes(),
            done_lane: default_done_lane(),
            milestones: default_milestones(),
            default_role: Role::default(),
        }
    }
}

impl AppConfig {
    /// Loads and validates the config at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`, falling back to defaults when the file
    /// does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            log::debug!("No config at {:?}, using defaults", path.as_ref());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let content = serde_yaml::to_string(&self)?;

        // Ensure parent directories exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Writes the default config if no file exists yet
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        if path.as_ref().exists() {
            return Ok(());
        }
        Self::default().save(path)
    }

    /// Checks lanes are non-empty and unique and the done lane is one of them
    pub fn validate(&self) -> Result<(), OpsError> {
        if self.lanes.is_empty() {
            return Err(OpsError::InvalidConfig("at least one lane is required".to_string()));
        }

        let mut seen = HashSet::new();
        for lane in &self.lanes {
            if lane.id.trim().is_empty() {
                return Err(OpsError::InvalidConfig("lane ids cannot be empty".to_string()));
            }
            if !seen.insert(lane.id.as_str()) {
                return Err(OpsError::InvalidConfig(format!("duplicate lane id: {}", lane.id)));
            }
        }

        if !seen.contains(self.done_lane.as_str()) {
            return Err(OpsError::InvalidConfig(format!(
                "done lane '{}' is not one of the configured lanes",
                self.done_lane
            )));
        }

        Ok(())
    }

    /// An empty board laid out with the configured lanes
    pub fn new_board(&self) -> Result<TaskBoard, OpsError> {
        self.validate()?;
        let mut board = TaskBoard::new(self.lanes.clone());
        board.set_done_lane(&self.done_lane)?;
        Ok(board)
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join("startupops").join("config.yaml"))
}

/// Determines the workspace file: an explicit path wins, then
/// `STARTUPOPS_WORKSPACE`, then the config file's `workspace_path`.
pub fn determine_workspace_path(explicit: Option<&Path>, config: &AppConfig) -> PathBuf {
    let from_env = std::env::var(WORKSPACE_ENV_VAR).ok();
    resolve_workspace_path(explicit, from_env.as_deref(), config)
}

fn resolve_workspace_path(explicit: Option<&Path>, from_env: Option<&str>, config: &AppConfig) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = from_env.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    if !config.workspace_path.trim().is_empty() {
        return PathBuf::from(&config.workspace_path);
    }
    PathBuf::from(DEFAULT_WORKSPACE_FILE)
}
