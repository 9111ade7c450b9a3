use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::queue::{DEFAULT_PLATFORM_TAGS, QueueConfig, SortMode, StatusFilter};

/// Project-level settings from `.backlog/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Team the backlog belongs to; sent with every mutation.
    #[serde(default = "default_team")]
    pub team: String,
    /// Snapshot file, relative to the project root.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default)]
    pub queue: QueueDefaults,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            team: default_team(),
            snapshot: None,
            queue: QueueDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueDefaults {
    #[serde(default = "default_platform_tags")]
    pub platform_tags: Vec<String>,
    #[serde(default = "default_sort")]
    pub default_sort: String,
    #[serde(default = "default_status")]
    pub default_status: String,
}

impl Default for QueueDefaults {
    fn default() -> Self {
        Self {
            platform_tags: default_platform_tags(),
            default_sort: default_sort(),
            default_status: default_status(),
        }
    }
}

impl ProjectConfig {
    /// Starting [`QueueConfig`] before command-line filters are layered on.
    ///
    /// # Errors
    ///
    /// Returns an error if `default_sort` or `default_status` is not a known value.
    pub fn to_queue_config(&self) -> Result<QueueConfig> {
        let sort: SortMode = self
            .queue
            .default_sort
            .parse()
            .context("Invalid queue.default_sort in .backlog/config.toml")?;
        let status: StatusFilter = self
            .queue
            .default_status
            .parse()
            .context("Invalid queue.default_status in .backlog/config.toml")?;
        Ok(QueueConfig {
            sort,
            status,
            platform_tags: self.queue.platform_tags.clone(),
            ..QueueConfig::default()
        })
    }

    /// Snapshot path resolved against `project_root`.
    #[must_use]
    pub fn snapshot_path(&self, project_root: &Path) -> PathBuf {
        self.snapshot.as_ref().map_or_else(
            || project_root.join(".backlog/snapshot.json"),
            |p| project_root.join(p),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".backlog/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error if the user config exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("backlog/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config layers and settle the output mode.
///
/// # Errors
///
/// Returns an error if either config file is malformed.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// `--json` beats `FORMAT`, which beats the user config; otherwise pretty on
/// a terminal and text when piped.
fn resolve_output(cli_json: bool, user_output: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_team() -> String {
    "default".to_string()
}

fn default_platform_tags() -> Vec<String> {
    DEFAULT_PLATFORM_TAGS
        .iter()
        .map(|t| (*t).to_string())
        .collect()
}

fn default_sort() -> String {
    "priority".to_string()
}

fn default_status() -> String {
    "all".to_string()
}
