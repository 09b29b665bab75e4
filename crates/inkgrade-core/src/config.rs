//! Tool configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level inkgrade configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkgradeConfig {
    /// Max concurrent analyses in a batch run.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Best-score change, in points, below which `compare` reports no change.
    #[serde(default = "default_regression_threshold")]
    pub regression_threshold: f64,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./inkgrade-results")
}
fn default_regression_threshold() -> f64 {
    5.0
}

impl Default for InkgradeConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            regression_threshold: default_regression_threshold(),
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `inkgrade.toml` in the current directory
/// 2. `~/.config/inkgrade/config.toml`
///
/// Environment variable overrides: `INKGRADE_PARALLELISM`, `INKGRADE_OUTPUT_DIR`.
pub fn load_config() -> Result<InkgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<InkgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("inkgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<InkgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => InkgradeConfig::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Apply `INKGRADE_*` overrides read through `lookup`.
pub fn apply_env_overrides(
    mut config: InkgradeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> InkgradeConfig {
    if let Some(value) = lookup("INKGRADE_PARALLELISM") {
        match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => config.parallelism = n,
            _ => tracing::warn!("ignoring INKGRADE_PARALLELISM={value:?}: expected a positive integer"),
        }
    }
    if let Some(dir) = lookup("INKGRADE_OUTPUT_DIR") {
        if !dir.is_empty() {
            config.output_dir = PathBuf::from(dir);
        }
    }
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("inkgrade"))
}
