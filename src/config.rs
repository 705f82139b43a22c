use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::placement::Placement;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// When wheel zoom/scale changes reach the scene store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WheelCommit {
    /// One commit per effective wheel tick
    #[default]
    EachTick,
    /// One commit once the wheel has been quiet for `delay_ms`
    Debounced { delay_ms: u64 },
}

/// Editor tuning; every field has a default so partial files are fine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Zoom change per wheel tick
    pub zoom_step: f32,
    /// Plane scale change per wheel tick
    pub scale_step: f32,
    /// Second tap on the same plane within this window hides the tooltip
    pub double_tap_window_ms: u64,
    /// Tooltip distance from the pointer, in pixels
    pub tooltip_offset: f32,
    /// Plane size used for hit testing when the image size is unknown
    pub plane_extent: [f32; 2],
    pub wheel_commit: WheelCommit,
    pub placement: Placement,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom_step: 0.05,
            scale_step: 0.1,
            double_tap_window_ms: 500,
            tooltip_offset: 15.0,
            plane_extent: [200.0, 150.0],
            wheel_commit: WheelCommit::EachTick,
            placement: Placement::Cascade,
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("zoom_step", self.zoom_step)?;
        positive("scale_step", self.scale_step)?;
        positive("plane_extent[0]", self.plane_extent[0])?;
        positive("plane_extent[1]", self.plane_extent[1])?;
        if !self.tooltip_offset.is_finite() {
            return Err(ConfigError::Invalid {
                field: "tooltip_offset",
                reason: "must be finite".to_string(),
            });
        }
        if let WheelCommit::Debounced { delay_ms: 0 } = self.wheel_commit {
            return Err(ConfigError::Invalid {
                field: "wheel_commit.delay_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    /// Debounce delay, or `None` when every tick commits
    pub fn wheel_delay(&self) -> Option<Duration> {
        match self.wheel_commit {
            WheelCommit::EachTick => None,
            WheelCommit::Debounced { delay_ms } => Some(Duration::from_millis(delay_ms)),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}
