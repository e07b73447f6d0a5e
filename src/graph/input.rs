//! Input handling - drag pans, scroll zooms at the pointer, click toggles
//! collapse on the node under the cursor.

use egui::{CursorIcon, Rect, Response};

use super::camera::Camera2D;
use super::spatial::SpatialIndex;
use super::types::NodeId;

/// What the shell should do with this frame's input
#[derive(Debug, Clone, Default)]
pub struct InputOutcome {
    /// Camera moved: the viewport recompute should be (re)scheduled
    pub camera_moved: bool,
    /// A node was clicked and should have its collapse state toggled
    pub clicked_node: Option<NodeId>,
    /// Repaint needed this frame
    pub needs_repaint: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputHandler;

impl InputHandler {
    /// Process one frame of pointer input over the graph area
    pub fn handle_input(
        response: &Response,
        camera: &mut Camera2D,
        spatial: &SpatialIndex,
        screen_rect: Rect,
    ) -> InputOutcome {
        let mut outcome = InputOutcome::default();

        if response.dragged() {
            let delta = response.drag_delta();
            if delta.length_sq() > 0.0 {
                camera.pan(delta);
                outcome.camera_moved = true;
                outcome.needs_repaint = true;
            }
        }

        if response.hovered() {
            let (scroll, zoom_delta, pointer) = response.ctx.input(|i| {
                (
                    i.raw_scroll_delta.y,
                    i.zoom_delta(),
                    i.pointer.hover_pos(),
                )
            });
            if let Some(pointer) = pointer {
                let factor = if zoom_delta != 1.0 {
                    zoom_delta
                } else if scroll != 0.0 {
                    (scroll * 0.002).exp()
                } else {
                    1.0
                };
                if factor != 1.0 {
                    camera.zoom_at(factor, pointer, screen_rect);
                    outcome.camera_moved = true;
                    outcome.needs_repaint = true;
                }
            }
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let world = camera.screen_to_world(pointer, screen_rect);
                if let Some(hit) = spatial.hit_test([world.x, world.y]) {
                    outcome.clicked_node = Some(hit.id.clone());
                    outcome.needs_repaint = true;
                }
            }
        }

        outcome
    }

    /// Cursor for the current interaction state
    pub fn cursor(response: &Response) -> CursorIcon {
        if response.dragged() {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Default
        }
    }
}
