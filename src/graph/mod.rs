//! Interactive JSON graph widget
//!
//! # Architecture
//!
//! ```text
//! JSON text
//!     │
//!     ▼
//! builder (bounded DFS, auto-repair)
//!     │
//!     ▼
//! GraphDocument {nodes, edges, adjacency}
//!     │
//!     ▼
//! LayoutEngine (ranked left-to-right positions)
//!     │
//!     ├──► VisibilityController (collapse + debounced viewport culling)
//!     ├──► SearchEngine (matches, ancestor expansion, navigation)
//!     │
//!     ▼
//! GraphRenderer (egui painter)
//!     ▲
//!     │
//! InputHandler ──► Camera2D (pan/zoom)
//! ```
//!
//! The widget is handed to the shell by reference (no ambient singleton);
//! centering commands flow through the widget's own camera.

pub mod animation;
pub mod builder;
pub mod camera;
pub mod input;
pub mod layout;
pub mod render;
pub mod search;
pub mod spatial;
pub mod types;
pub mod visibility;

pub use camera::Camera2D;
pub use layout::LayoutEngine;
pub use render::GraphRenderer;
pub use search::SearchEngine;
pub use spatial::SpatialIndex;
pub use types::*;
pub use visibility::VisibilityController;

use egui::{Align2, Color32, FontId, Rect, Sense, Vec2};
use input::InputHandler;
use tracing::debug;

/// A match navigation step waiting for the settle delay before the camera
/// centers on it. `due` is set on the first frame that sees it.
#[derive(Debug, Clone)]
struct PendingCenter {
    id: NodeId,
    due: Option<f64>,
}

// =============================================================================
// GRAPH WIDGET
// =============================================================================

/// Main widget: owns one parse's document plus the interaction controllers
pub struct JsonGraphWidget {
    document: Option<GraphDocument>,
    visibility: VisibilityController,
    search: SearchEngine,
    camera: Camera2D,
    spatial: SpatialIndex,
    renderer: GraphRenderer,
    layout: LayoutEngine,
    /// Auto-fit on the first render after a parse
    needs_initial_fit: bool,
    pending_center: Option<PendingCenter>,
    /// Last parse failure, shown without touching the current graph
    last_error: Option<String>,
}

impl Default for JsonGraphWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonGraphWidget {
    pub fn new() -> Self {
        Self {
            document: None,
            visibility: VisibilityController::new(),
            search: SearchEngine::new(),
            camera: Camera2D::new(),
            spatial: SpatialIndex::new(),
            renderer: GraphRenderer::new(),
            layout: LayoutEngine::new(),
            needs_initial_fit: false,
            pending_center: None,
            last_error: None,
        }
    }

    /// Parse a new JSON text and replace the document wholesale.
    ///
    /// On failure the previously displayed graph is left untouched and the
    /// error is surfaced; derived state (collapse, matches, highlights,
    /// pending work) is discarded only on success.
    pub fn set_text(&mut self, text: &str) -> GraphResult<()> {
        match builder::parse(text) {
            Ok(mut doc) => {
                self.layout.compute_layout(&mut doc);
                self.spatial = SpatialIndex::from_document(&doc);
                self.visibility.reset();
                self.search.reset();
                self.pending_center = None;
                self.last_error = None;
                self.needs_initial_fit = true;
                debug!(nodes = doc.nodes.len(), "document replaced");
                self.document = Some(doc);
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Drop the current document entirely
    pub fn clear(&mut self) {
        self.document = None;
        self.spatial.clear();
        self.visibility.reset();
        self.search.reset();
        self.pending_center = None;
        self.last_error = None;
    }

    pub fn has_graph(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&GraphDocument> {
        self.document.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Image-export boundary: world-space bounding box of all current nodes
    pub fn content_bounds(&self) -> Option<Rect> {
        self.document.as_ref().and_then(|d| d.content_bounds())
    }

    /// Toggle collapse on a node; returns the number of affected descendants
    pub fn toggle_node(&mut self, id: &str) -> usize {
        let Some(doc) = self.document.as_mut() else {
            return 0;
        };
        self.visibility.toggle_collapse(doc, id)
    }

    /// Run a search query; returns the match count
    pub fn search(&mut self, query: &str) -> GraphResult<usize> {
        let Some(doc) = self.document.as_mut() else {
            return Ok(0);
        };
        let count = self.search.run(doc, &mut self.visibility, query)?;
        if let Some(id) = self.search.current_match().cloned() {
            self.pending_center = Some(PendingCenter { id, due: None });
        }
        Ok(count)
    }

    pub fn clear_search(&mut self) {
        if let Some(doc) = self.document.as_mut() {
            self.search.clear(doc);
        }
        self.pending_center = None;
    }

    pub fn match_count(&self) -> usize {
        self.search.matches().len()
    }

    pub fn current_match_index(&self) -> isize {
        self.search.current_index()
    }

    /// Advance to the next match (wraps) and schedule centering on it
    pub fn next_match(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        if let Some(id) = self.search.next(doc) {
            self.pending_center = Some(PendingCenter { id, due: None });
        }
    }

    /// Step to the previous match (wraps) and schedule centering on it
    pub fn prev_match(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        if let Some(id) = self.search.prev(doc) {
            self.pending_center = Some(PendingCenter { id, due: None });
        }
    }

    /// Fit the camera to all content
    pub fn fit_to_content(&mut self, screen_rect: Rect) {
        if let Some(bounds) = self.content_bounds() {
            self.camera.fit_to_bounds(bounds, screen_rect, 50.0);
        }
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    /// Main UI entry point
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (response, painter) = ui.allocate_painter(available, Sense::click_and_drag());
        let screen_rect = response.rect;
        let now = ui.input(|i| i.time);
        let dt = ui.input(|i| i.stable_dt);

        let Some(doc) = self.document.as_mut() else {
            let message = self
                .last_error
                .as_deref()
                .unwrap_or("Paste JSON and press Render");
            painter.text(
                screen_rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(14.0),
                Color32::from_rgb(150, 150, 150),
            );
            return;
        };

        if self.needs_initial_fit {
            if let Some(bounds) = doc.content_bounds() {
                self.camera.fit_to_bounds(bounds, screen_rect, 50.0);
                self.camera.snap_to_target();
            }
            self.visibility
                .set_viewport(doc, self.camera.visible_bounds(screen_rect));
            self.needs_initial_fit = false;
        }

        self.camera.update(dt);

        let outcome =
            InputHandler::handle_input(&response, &mut self.camera, &self.spatial, screen_rect);
        ui.ctx().set_cursor_icon(InputHandler::cursor(&response));

        if let Some(id) = &outcome.clicked_node {
            let can_collapse = doc.get(id).map(|n| n.has_children).unwrap_or(false);
            if can_collapse {
                self.visibility.toggle_collapse(doc, id);
            }
        }

        if outcome.camera_moved || self.camera.is_animating() {
            self.visibility
                .request_viewport(self.camera.visible_bounds(screen_rect), now);
        }
        self.visibility.poll(doc, now);

        // Deferred centering on a navigated match: wait out the settle delay
        if let Some(mut pending) = self.pending_center.take() {
            let due = *pending.due.get_or_insert(now + search::NAV_SETTLE);
            if now >= due {
                if let Some(node) = doc.get(&pending.id) {
                    self.camera.fly_to(node.position);
                    self.camera.zoom_to(search::FOCUS_ZOOM);
                }
            } else {
                self.pending_center = Some(pending);
            }
        }

        self.renderer
            .render(&painter, doc, &self.visibility, &self.camera, screen_rect);
        Self::render_chrome(
            &painter,
            doc,
            self.camera.zoom(),
            &self.search,
            self.last_error.as_deref(),
            screen_rect,
        );

        if outcome.needs_repaint || self.camera.is_animating() || self.pending_center.is_some() {
            ui.ctx().request_repaint();
        }
    }

    /// Stats and error overlay
    fn render_chrome(
        painter: &egui::Painter,
        doc: &GraphDocument,
        zoom: f32,
        search: &SearchEngine,
        last_error: Option<&str>,
        screen_rect: Rect,
    ) {
        painter.text(
            render::chrome_anchor(screen_rect),
            Align2::LEFT_TOP,
            render::stats_text(doc, zoom),
            FontId::proportional(12.0),
            Color32::from_rgb(150, 150, 150),
        );

        if let Some(err) = last_error {
            painter.text(
                screen_rect.left_bottom() + Vec2::new(10.0, -10.0),
                Align2::LEFT_BOTTOM,
                err,
                FontId::proportional(12.0),
                Color32::from_rgb(240, 120, 120),
            );
        }

        if !search.matches().is_empty() {
            let text = format!(
                "match {}/{}",
                search.current_index() + 1,
                search.matches().len()
            );
            painter.text(
                screen_rect.right_top() + Vec2::new(-10.0, 20.0),
                Align2::RIGHT_TOP,
                text,
                FontId::proportional(12.0),
                Color32::from_rgb(96, 165, 250),
            );
        }
    }
}
