use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::HexViewError;
use crate::layout::Layout;
use crate::ranges::DEFAULT_LAYER_COUNT;
use crate::render::{Palette, DEFAULT_RETRY_INTERVAL};

/// Persistent viewer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub layout: Layout,
    pub palette: Palette,
    /// Delay between two polls for missing data, in milliseconds.
    pub retry_interval_ms: u64,
    /// Number of colored range layers created up front.
    pub layer_count: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            palette: Palette::default(),
            retry_interval_ms: DEFAULT_RETRY_INTERVAL.as_millis() as u64,
            layer_count: DEFAULT_LAYER_COUNT,
        }
    }
}

impl ViewerConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check the layout and the values the viewer can't run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.layout.validate()?;
        if self.layer_count == 0 {
            return Err(HexViewError::invalid("at least one range layer is needed"));
        }
        if self.retry_interval_ms == 0 {
            return Err(HexViewError::invalid("retry interval must be positive"));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
