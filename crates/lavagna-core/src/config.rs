//! Canvas configuration loaded from JSON.

use crate::background::Background;
use crate::color::InkColor;
use crate::history::MAX_UNDO_HISTORY;
use crate::ruler::{DEFAULT_EDGE_TOLERANCE, DEFAULT_RULER_LENGTH, DEFAULT_RULER_THICKNESS};
use crate::tools::{ToolKind, ToolProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
    #[error("Invalid config: {0}")]
    Parse(String),
    #[error("Unusable font {}", .0.display())]
    Font(PathBuf),
}

/// Startup settings for a [`Canvas`](crate::Canvas). Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub history_capacity: usize,
    pub background: Background,
    pub tool: ToolConfig,
    /// TrueType/OpenType font for the text tool.
    pub font_path: Option<PathBuf>,
    pub ruler: RulerConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            history_capacity: MAX_UNDO_HISTORY,
            background: Background::default(),
            tool: ToolConfig::default(),
            font_path: None,
            ruler: RulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub tool: ToolKind,
    pub size: f64,
    pub color: InkColor,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let profile = ToolProfile::default();
        Self {
            tool: profile.tool,
            size: profile.size,
            color: profile.color,
        }
    }
}

impl ToolConfig {
    pub fn profile(&self) -> ToolProfile {
        ToolProfile::new(self.tool, self.color, self.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulerConfig {
    pub length: f64,
    pub thickness: f64,
    pub tolerance: f64,
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_RULER_LENGTH,
            thickness: DEFAULT_RULER_THICKNESS,
            tolerance: DEFAULT_EDGE_TOLERANCE,
        }
    }
}

impl CanvasConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
