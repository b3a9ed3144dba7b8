//! Canvas session: the surface plus everything that edits it.

use crate::background::Background;
use crate::config::{CanvasConfig, ConfigError, RulerConfig};
use crate::color::InkColor;
use crate::history::History;
use crate::import::{
    Bitmap, IMAGE_FIT_RATIO, ImportError, PDF_FIT_RATIO, PageRenderer, decode_image, fit_at,
    fit_centered, render_pdf_page,
};
use crate::input::{Gesture, PointerPipeline, RawInput, ViewportMapping};
use crate::project::{Project, ProjectError};
use crate::ruler::{Ruler, RulerEdge};
use crate::selection::{LassoSelection, SelectedRegion};
use crate::snapshot::{Snapshot, SnapshotError};
use crate::surface::{FontError, Surface};
use crate::tools::{ToolKind, ToolProfile};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// What pointer gestures do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Draw,
    Lasso,
}

/// The gesture currently being dispatched.
#[derive(Debug, Clone, Copy)]
enum ActiveGesture {
    Stroke,
    Erase { last: Point },
    GuidedLine { edge: RulerEdge, start: Point, end: Point },
    Lasso,
}

/// A whiteboard editing session.
///
/// Owns the surface and its undo history. Every committed change records one
/// snapshot, so the current history entry always matches the board.
#[derive(Debug)]
pub struct Canvas {
    surface: Surface,
    history: History,
    profile: ToolProfile,
    pipeline: PointerPipeline,
    mode: Mode,
    gesture: Option<ActiveGesture>,
    lasso: LassoSelection,
    /// Regions picked by the last lasso, waiting for deletion.
    selection: Vec<SelectedRegion>,
    /// Where the next text stamp goes.
    text_anchor: Option<Point>,
    ruler: Option<Ruler>,
    ruler_config: RulerConfig,
    background: Background,
    /// Id of the loaded project, reused when saving.
    project_id: Option<String>,
}

impl Canvas {
    /// Create a blank canvas with default settings.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(&CanvasConfig {
            width,
            height,
            ..CanvasConfig::default()
        })
    }

    fn with_config(config: &CanvasConfig) -> Self {
        let surface = Surface::new(config.width, config.height);
        let mut history = History::new(config.history_capacity);
        history.reset(surface.capture_snapshot());
        let pipeline = PointerPipeline::new(ViewportMapping::identity(surface.size()));
        Self {
            surface,
            history,
            profile: config.tool.profile(),
            pipeline,
            mode: Mode::Draw,
            gesture: None,
            lasso: LassoSelection::new(),
            selection: Vec::new(),
            text_anchor: None,
            ruler: None,
            ruler_config: config.ruler,
            background: config.background,
            project_id: None,
        }
    }

    /// Create a canvas from configuration, loading the font if one is set.
    pub fn from_config(config: &CanvasConfig) -> Result<Self, ConfigError> {
        let mut canvas = Self::with_config(config);
        if let Some(path) = &config.font_path {
            let data = std::fs::read(path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            canvas
                .surface
                .set_font(data)
                .map_err(|_| ConfigError::Font(path.clone()))?;
            log::info!("Loaded font {}", path.display());
        }
        Ok(canvas)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn profile(&self) -> &ToolProfile {
        &self.profile
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn ruler(&self) -> Option<&Ruler> {
        self.ruler.as_ref()
    }

    pub fn pending_selection(&self) -> &[SelectedRegion] {
        &self.selection
    }

    pub fn text_anchor(&self) -> Option<Point> {
        self.text_anchor
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    // --- Settings ---

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.profile.set_tool(tool);
    }

    pub fn set_size(&mut self, size: f64) {
        self.profile.set_size(size);
    }

    pub fn set_color(&mut self, color: InkColor) {
        self.profile.set_color(color);
    }

    /// Switch between drawing and lasso selection. An open gesture is finished first.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.finish_gesture();
        if mode == Mode::Draw {
            self.selection.clear();
        }
        self.mode = mode;
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn set_font(&mut self, data: Vec<u8>) -> Result<(), FontError> {
        self.surface.set_font(data)
    }

    pub fn set_viewport(&mut self, mapping: ViewportMapping) {
        self.pipeline.set_mapping(ViewportMapping {
            surface: self.surface.size(),
            ..mapping
        });
    }

    pub fn set_calibration(&mut self, offset: Vec2) {
        self.pipeline.set_calibration(offset);
    }

    pub fn reset_calibration(&mut self) {
        self.pipeline.reset_calibration();
    }

    /// Place a ruler centered at `center`.
    pub fn show_ruler(&mut self, center: Point) {
        let RulerConfig {
            length,
            thickness,
            tolerance,
        } = self.ruler_config;
        self.ruler = Some(Ruler {
            length,
            thickness,
            tolerance,
            ..Ruler::new(center)
        });
    }

    pub fn hide_ruler(&mut self) {
        self.ruler = None;
    }

    pub fn ruler_mut(&mut self) -> Option<&mut Ruler> {
        self.ruler.as_mut()
    }

    // --- Input ---

    /// Feed a raw pointer event.
    pub fn handle_input(&mut self, input: &RawInput) {
        for gesture in self.pipeline.process(input) {
            self.handle_gesture(gesture);
        }
    }

    /// Dispatch a gesture already in surface coordinates.
    pub fn handle_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Begin(point) => {
                if self.gesture.is_some() {
                    self.end_gesture();
                }
                let point = self.surface.clamp_point(point);
                self.begin_gesture(point);
            }
            Gesture::Move(point) => {
                let point = self.surface.clamp_point(point);
                self.move_gesture(point);
            }
            Gesture::End => self.end_gesture(),
        }
    }

    fn begin_gesture(&mut self, point: Point) {
        if self.mode == Mode::Lasso {
            self.selection.clear();
            self.lasso.begin(point, &mut self.surface);
            self.gesture = Some(ActiveGesture::Lasso);
            return;
        }

        let params = self.profile.render_params();
        if self.profile.tool.draws_strokes() {
            if let Some(ruler) = &self.ruler {
                if let Some(edge) = ruler.edge_at(point) {
                    let start = self.surface.clamp_point(ruler.snap(point, edge));
                    log::debug!("Guided line on {:?} edge from {:?}", edge, start);
                    self.gesture = Some(ActiveGesture::GuidedLine {
                        edge,
                        start,
                        end: start,
                    });
                    self.surface.draw_overlay_line(start, start, &params);
                    return;
                }
            }
        }

        self.gesture = match self.profile.tool {
            ToolKind::Pencil | ToolKind::Pen | ToolKind::Marker | ToolKind::Fountain => {
                self.surface.begin_stroke(point, params);
                Some(ActiveGesture::Stroke)
            }
            ToolKind::Eraser => {
                self.surface.erase(point, params.line_width / 2.0);
                Some(ActiveGesture::Erase { last: point })
            }
            ToolKind::Text => {
                self.text_anchor = Some(point);
                None
            }
        };
    }

    fn move_gesture(&mut self, point: Point) {
        let Some(gesture) = self.gesture else {
            return;
        };
        match gesture {
            ActiveGesture::Stroke => {
                self.surface.extend_stroke(point);
            }
            ActiveGesture::Erase { last } => {
                let radius = self.profile.render_params().line_width / 2.0;
                self.erase_segment(last, point, radius);
                self.gesture = Some(ActiveGesture::Erase { last: point });
            }
            ActiveGesture::GuidedLine { edge, start, .. } => {
                let Some(ruler) = &self.ruler else {
                    return;
                };
                let end = self.surface.clamp_point(ruler.snap(point, edge));
                self.surface
                    .draw_overlay_line(start, end, &self.profile.render_params());
                self.gesture = Some(ActiveGesture::GuidedLine { edge, start, end });
            }
            ActiveGesture::Lasso => self.lasso.extend(point, &mut self.surface),
        }
    }

    fn end_gesture(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        match gesture {
            ActiveGesture::Stroke => {
                self.surface.end_stroke();
                self.record();
            }
            ActiveGesture::Erase { .. } => self.record(),
            ActiveGesture::GuidedLine { start, end, .. } => {
                self.surface.clear_overlay();
                self.surface
                    .draw_line(start, end, &self.profile.render_params());
                self.record();
            }
            ActiveGesture::Lasso => {
                self.selection = self.lasso.complete(&mut self.surface);
            }
        }
    }

    /// End any gesture in progress, committing what it drew.
    fn finish_gesture(&mut self) {
        self.end_gesture();
        self.pipeline.reset();
    }

    fn erase_segment(&mut self, from: Point, to: Point, radius: f64) {
        let spacing = (radius / 2.0).max(0.5);
        let steps = (from.distance(to) / spacing).ceil().max(1.0) as usize;
        for i in 1..=steps {
            self.surface.erase(from.lerp(to, i as f64 / steps as f64), radius);
        }
    }

    fn record(&mut self) {
        self.history.record(self.surface.capture_snapshot());
    }

    // --- Edits ---

    /// Stamp text at `point` with the text tool's size and the current color.
    ///
    /// Records a snapshot when anything was drawn.
    pub fn stamp_text(&mut self, point: Point, text: &str) -> bool {
        self.finish_gesture();
        let params = ToolProfile {
            tool: ToolKind::Text,
            ..self.profile.clone()
        }
        .render_params();
        let drawn = self.surface.stamp_text(point, text, &params);
        if drawn {
            self.record();
        }
        drawn
    }

    /// Stamp text at the anchor set by the last text-tool tap.
    pub fn commit_text(&mut self, text: &str) -> bool {
        match self.text_anchor.take() {
            Some(anchor) => self.stamp_text(anchor, text),
            None => false,
        }
    }

    /// Wipe the board.
    pub fn clear_all(&mut self) {
        self.finish_gesture();
        self.surface.clear_all();
        self.selection.clear();
        self.record();
    }

    /// Composite a bitmap into `rect`. Records when something was drawn.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, rect: Rect) -> bool {
        self.finish_gesture();
        let drawn = self.surface.draw_bitmap(bitmap, rect);
        if drawn {
            self.record();
        }
        drawn
    }

    /// Decode an image and place it centered on the board.
    pub fn import_image(&mut self, bytes: &[u8]) -> Result<Rect, ImportError> {
        let bitmap = decode_image(bytes)?;
        let rect = fit_centered(bitmap.size(), self.surface.size(), IMAGE_FIT_RATIO);
        self.draw_bitmap(&bitmap, rect);
        log::info!("Imported image at {:?}", rect);
        Ok(rect)
    }

    /// Decode a dropped image and center it on the client point `drop`.
    ///
    /// The drop point goes through the viewport mapping without the stylus
    /// calibration offset. The image may hang off the board edges.
    pub fn import_image_at(&mut self, bytes: &[u8], drop: Point) -> Result<Rect, ImportError> {
        let bitmap = decode_image(bytes)?;
        let mapping = ViewportMapping {
            calibration: Vec2::ZERO,
            ..*self.pipeline.mapping()
        };
        let center = mapping.client_to_surface(drop);
        let rect = fit_at(bitmap.size(), self.surface.size(), IMAGE_FIT_RATIO, center);
        self.draw_bitmap(&bitmap, rect);
        log::info!("Dropped image at {:?}", rect);
        Ok(rect)
    }

    /// Render a 1-based PDF page and place it centered beneath the board's ink.
    pub fn import_pdf_page(
        &mut self,
        renderer: &dyn PageRenderer,
        page: u32,
    ) -> Result<Rect, ImportError> {
        let bitmap = render_pdf_page(renderer, page)?;
        let rect = fit_centered(bitmap.size(), self.surface.size(), PDF_FIT_RATIO);
        self.finish_gesture();
        if self.surface.draw_bitmap_beneath(&bitmap, rect) {
            self.record();
        }
        log::info!("Imported PDF page {} at {:?}", page, rect);
        Ok(rect)
    }

    /// Clear the pending lasso selection. Returns the number of regions removed.
    pub fn delete_selection(&mut self) -> usize {
        self.finish_gesture();
        let regions = std::mem::take(&mut self.selection);
        if regions.is_empty() {
            return 0;
        }
        for region in &regions {
            self.surface.clear_rect(region.rect());
        }
        self.record();
        regions.len()
    }

    pub fn undo(&mut self) -> bool {
        self.finish_gesture();
        match self.history.undo() {
            Some(snapshot) => {
                self.surface.restore_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.finish_gesture();
        match self.history.redo() {
            Some(snapshot) => {
                self.surface.restore_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Resize the board, keeping content anchored top-left.
    ///
    /// An open stroke is committed first. The resized board is recorded so the
    /// current history entry keeps matching it.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.finish_gesture();
        self.surface.resize(width, height);
        self.pipeline.set_surface_size(self.surface.size());
        self.record();
    }

    // --- Persistence ---

    /// Encode the board (without background) as a snapshot blob.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        self.surface.capture_snapshot().to_png()
    }

    /// Decode a snapshot blob onto the board and record it.
    pub fn import_snapshot(&mut self, blob: &[u8]) -> Result<Snapshot, SnapshotError> {
        let snapshot = Snapshot::from_png(blob)?;
        self.finish_gesture();
        self.surface.restore_snapshot(&snapshot);
        self.record();
        Ok(snapshot)
    }

    /// Start over with a blank board of the current size.
    pub fn new_project(&mut self) {
        self.finish_gesture();
        self.surface.clear_all();
        self.reset_session();
        self.project_id = None;
        log::info!("Started new project ({}x{})", self.width(), self.height());
    }

    /// Capture the board as a project. A loaded project keeps its id.
    pub fn to_project(&self, name: &str) -> Result<Project, ProjectError> {
        let mut project = Project::new(name, &self.surface.capture_snapshot(), self.background)?;
        if let Some(id) = &self.project_id {
            project.id = id.clone();
        }
        Ok(project)
    }

    /// Replace the board with a saved project. History restarts from it.
    pub fn load_project(&mut self, project: &Project) -> Result<(), ProjectError> {
        let snapshot = project.snapshot()?;
        self.finish_gesture();
        self.surface.resize(snapshot.width(), snapshot.height());
        self.pipeline.set_surface_size(self.surface.size());
        self.surface.restore_snapshot(&snapshot);
        self.background = project.background;
        self.reset_session();
        self.project_id = Some(project.id.clone());
        log::info!(
            "Loaded project {:?} ({}x{})",
            project.name,
            project.width,
            project.height
        );
        Ok(())
    }

    fn reset_session(&mut self) {
        self.history.reset(self.surface.capture_snapshot());
        self.selection.clear();
        self.text_anchor = None;
        self.surface.clear_overlay();
    }

    /// The board composed over its background.
    pub fn flatten(&self) -> Pixmap {
        let board = self.surface.pixmap();
        match self.background.render(board.width(), board.height()) {
            Some(mut out) => {
                out.draw_pixmap(
                    0,
                    0,
                    board.as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
                out
            }
            None => board.clone(),
        }
    }

    /// Encode the flattened board as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, SnapshotError> {
        Snapshot::from_pixmap(&self.flatten()).to_png()
    }
}
