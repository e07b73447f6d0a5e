//! Graph renderer - draws visible nodes and edges to an egui painter
//!
//! Thin by design: visibility and highlighting are decided upstream; this
//! module only turns the already-filtered node/edge set into painter calls.
//! Labels are suppressed when a node is too small on screen to read.

use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke};

use super::camera::Camera2D;
use super::layout::edge_ports;
use super::types::{GraphDocument, GraphNode, Highlight};
use super::visibility::VisibilityController;

/// Screen-space node height below which labels are skipped
const MIN_LABEL_HEIGHT: f32 = 9.0;

/// Collapse indicator glyphs
const GLYPH_COLLAPSED: &str = "▸";
const GLYPH_EXPANDED: &str = "▾";

const EDGE_COLOR: Color32 = Color32::from_rgb(90, 96, 110);
const CONTAINER_FILL: Color32 = Color32::from_rgb(40, 48, 66);
const SCALAR_FILL: Color32 = Color32::from_rgb(32, 36, 46);
const BORDER_COLOR: Color32 = Color32::from_rgb(96, 104, 122);
const WARNING_FILL: Color32 = Color32::from_rgb(92, 62, 24);
const TEXT_COLOR: Color32 = Color32::from_rgb(220, 223, 228);
const MATCH_COLOR: Color32 = Color32::from_rgb(202, 166, 74);
const SELECTED_COLOR: Color32 = Color32::from_rgb(96, 165, 250);

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRenderer;

impl GraphRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render all visible edges then all visible nodes
    pub fn render(
        &self,
        painter: &egui::Painter,
        doc: &GraphDocument,
        vis: &VisibilityController,
        camera: &Camera2D,
        screen_rect: Rect,
    ) {
        for edge in &doc.edges {
            if edge.hidden {
                continue;
            }
            let (Some(source), Some(target)) = (doc.get(&edge.source), doc.get(&edge.target))
            else {
                continue;
            };
            let (from, to) = edge_ports(source, target);
            painter.line_segment(
                [
                    camera.world_to_screen(from, screen_rect),
                    camera.world_to_screen(to, screen_rect),
                ],
                Stroke::new(1.0, EDGE_COLOR),
            );
        }

        for node in &doc.nodes {
            if node.hidden() {
                continue;
            }
            self.render_node(painter, node, doc, vis, camera, screen_rect);
        }
    }

    fn render_node(
        &self,
        painter: &egui::Painter,
        node: &GraphNode,
        doc: &GraphDocument,
        vis: &VisibilityController,
        camera: &Camera2D,
        screen_rect: Rect,
    ) {
        let center = camera.world_to_screen(node.position, screen_rect);
        let size = node.size * camera.zoom();
        let rect = Rect::from_center_size(center, size);
        if !rect.intersects(screen_rect) {
            return;
        }

        let is_warning = doc.warning_id.as_deref() == Some(node.id.as_str());
        let fill = if is_warning {
            WARNING_FILL
        } else if node.is_container {
            CONTAINER_FILL
        } else {
            SCALAR_FILL
        };
        painter.rect_filled(rect, 4.0, fill);
        painter.rect_stroke(rect, 4.0, Stroke::new(1.0, BORDER_COLOR));

        match node.highlight {
            Highlight::None => {}
            Highlight::Match => {
                painter.rect_stroke(rect.expand(2.0), 6.0, Stroke::new(2.0, MATCH_COLOR));
            }
            Highlight::Selected => {
                painter.rect_stroke(rect.expand(3.0), 6.0, Stroke::new(3.0, SELECTED_COLOR));
            }
        }

        if size.y < MIN_LABEL_HEIGHT {
            return;
        }
        let font_size = (size.y * 0.4).clamp(8.0, 14.0);
        painter.text(
            center,
            Align2::CENTER_CENTER,
            display_label(node, vis),
            FontId::proportional(font_size),
            TEXT_COLOR,
        );
    }
}

/// Label as drawn: the collapse glyph is applied here, never stored
pub fn display_label(node: &GraphNode, vis: &VisibilityController) -> String {
    if !node.has_children {
        return node.label.clone();
    }
    let glyph = if vis.is_collapsed(&node.id) {
        GLYPH_COLLAPSED
    } else {
        GLYPH_EXPANDED
    };
    format!("{glyph} {}", node.label)
}

/// Stats line for the widget chrome
pub fn stats_text(doc: &GraphDocument, zoom: f32) -> String {
    let visible = doc.nodes.iter().filter(|n| !n.hidden()).count();
    format!(
        "{visible}/{} nodes | {} edges | zoom {:.0}%",
        doc.nodes.len(),
        doc.edges.len(),
        zoom * 100.0
    )
}

/// Anchor point used by the chrome overlay
pub fn chrome_anchor(screen_rect: Rect) -> Pos2 {
    screen_rect.left_top() + egui::Vec2::new(10.0, 20.0)
}
