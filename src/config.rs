use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::projector::Alignment;
use crate::predict::{DEFAULT_MAX_STEPS, Method};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "DAPLOT_CONFIG";

/// Runtime settings. Every field has a default, so a config file only needs
/// the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_method: Method,
    pub default_steps: usize,
    pub max_steps: usize,
    /// Rows returned with an upload.
    pub preview_rows: usize,
    pub plot_alignment: Alignment,
    /// Wall-clock ceiling for fitting one model. `0` disables it.
    pub fit_time_limit_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_method: Method::Linear,
            default_steps: 10,
            max_steps: DEFAULT_MAX_STEPS,
            preview_rows: 5,
            plot_alignment: Alignment::Independent,
            fit_time_limit_secs: 30,
        }
    }
}

impl AppConfig {
    /// Read the file named by `DAPLOT_CONFIG`, or fall back to defaults when
    /// the variable is unset.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn fit_time_limit(&self) -> Option<Duration> {
        (self.fit_time_limit_secs > 0).then(|| Duration::from_secs(self.fit_time_limit_secs))
    }
}
