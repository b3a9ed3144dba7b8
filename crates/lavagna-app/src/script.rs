//! Gesture scripts: a JSON list of steps replayed against a canvas.

use anyhow::{Context, Result, bail};
use kurbo::Point;
use lavagna_core::{
    Background, BackgroundPattern, Canvas, CanvasConfig, InkColor, Mode, RawInput, ToolKind,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A replayable session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    /// Canvas settings; defaults apply when absent.
    #[serde(default)]
    pub config: Option<CanvasConfig>,
    pub steps: Vec<Step>,
}

/// One host action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// A raw pointer event.
    Input { event: RawInput },
    /// Press, drag through `points`, release.
    Stroke { points: Vec<Point> },
    Tool { tool: ToolKind },
    Size { size: f64 },
    Color { color: InkColor },
    Mode { mode: Mode },
    Background {
        pattern: BackgroundPattern,
        #[serde(default)]
        color: Option<InkColor>,
    },
    /// Stamp text at `at`, or at the last text-tool tap.
    Text {
        text: String,
        #[serde(default)]
        at: Option<Point>,
    },
    ShowRuler {
        center: Point,
        #[serde(default)]
        angle: f64,
    },
    HideRuler,
    /// Import an image, centered on the board or dropped at `at`.
    ImportImage {
        path: PathBuf,
        #[serde(default)]
        at: Option<Point>,
    },
    DeleteSelection,
    Clear,
    Undo,
    Redo,
    Resize { width: u32, height: u32 },
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Build a canvas from the script's config, or `fallback` when it has none.
    pub fn canvas(&self, fallback: &CanvasConfig) -> Result<Canvas> {
        let config = self.config.as_ref().unwrap_or(fallback);
        Ok(Canvas::from_config(config)?)
    }
}

/// Apply every step in order. Paths in steps are resolved against `base_dir`.
pub fn replay(canvas: &mut Canvas, steps: &[Step], base_dir: &Path) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        apply(canvas, step, base_dir).with_context(|| format!("Step {} failed", index + 1))?;
    }
    log::info!(
        "Replayed {} steps, history at {}/{}",
        steps.len(),
        canvas.history().cursor() + 1,
        canvas.history().len()
    );
    Ok(())
}

fn apply(canvas: &mut Canvas, step: &Step, base_dir: &Path) -> Result<()> {
    log::debug!("Step: {:?}", step);
    match step {
        Step::Input { event } => canvas.handle_input(event),
        Step::Stroke { points } => {
            let Some((first, rest)) = points.split_first() else {
                bail!("Stroke needs at least one point");
            };
            canvas.handle_input(&RawInput::MouseDown { position: *first });
            for &position in rest {
                canvas.handle_input(&RawInput::MouseMove { position });
            }
            canvas.handle_input(&RawInput::MouseUp {
                position: points[points.len() - 1],
            });
        }
        Step::Tool { tool } => canvas.set_tool(*tool),
        Step::Size { size } => canvas.set_size(*size),
        Step::Color { color } => canvas.set_color(*color),
        Step::Mode { mode } => canvas.set_mode(*mode),
        Step::Background { pattern, color } => {
            let color = color.unwrap_or(canvas.background().color);
            canvas.set_background(Background {
                pattern: *pattern,
                color,
            });
        }
        Step::Text { text, at } => {
            let drawn = match at {
                Some(point) => canvas.stamp_text(*point, text),
                None => canvas.commit_text(text),
            };
            if !drawn {
                log::warn!("Text {:?} was not drawn", text);
            }
        }
        Step::ShowRuler { center, angle } => {
            canvas.show_ruler(*center);
            if let Some(ruler) = canvas.ruler_mut() {
                ruler.angle = *angle;
            }
        }
        Step::HideRuler => canvas.hide_ruler(),
        Step::ImportImage { path, at } => {
            let path = base_dir.join(path);
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            match at {
                Some(drop) => canvas.import_image_at(&bytes, *drop)?,
                None => canvas.import_image(&bytes)?,
            };
        }
        Step::DeleteSelection => {
            canvas.delete_selection();
        }
        Step::Clear => canvas.clear_all(),
        Step::Undo => {
            if !canvas.undo() {
                log::debug!("Nothing to undo");
            }
        }
        Step::Redo => {
            if !canvas.redo() {
                log::debug!("Nothing to redo");
            }
        }
        Step::Resize { width, height } => canvas.resize(*width, *height),
    }
    Ok(())
}
