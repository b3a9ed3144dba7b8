//! Lavagna Core Library
//!
//! Raster whiteboard engine: drawing surface, tools, pointer normalization,
//! snapshot-based undo history and lasso selection.

pub mod background;
pub mod canvas;
pub mod color;
pub mod config;
pub mod history;
pub mod import;
pub mod input;
pub mod project;
pub mod ruler;
pub mod selection;
pub mod snapshot;
pub mod storage;
pub mod surface;
pub mod tools;

pub use background::{Background, BackgroundPattern};
pub use canvas::{Canvas, Mode};
pub use color::InkColor;
pub use config::{CanvasConfig, ConfigError};
pub use history::{History, MAX_UNDO_HISTORY};
pub use import::{Bitmap, ImageFormat, ImportError, PageRenderer};
pub use input::{Gesture, PointerPipeline, RawInput, ViewportMapping};
pub use project::{Project, ProjectError};
pub use ruler::{Ruler, RulerEdge};
pub use selection::{LassoSelection, SelectedRegion, point_in_polygon};
pub use snapshot::{Snapshot, SnapshotError};
pub use surface::{FontError, Surface};
pub use tools::{CompositeMode, LineCap, LineJoin, RenderParams, ToolKind, ToolProfile};
