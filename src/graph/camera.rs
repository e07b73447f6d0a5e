//! Camera2D - pan/zoom with spring smoothing
//!
//! Provides world-to-screen and screen-to-world transforms. State is polled
//! each frame: call `update(dt)` first, then read the transforms.

use egui::{Pos2, Rect, Vec2};

use super::animation::{SpringF32, SpringPos2};

/// 2D camera: animated center in world coordinates plus an animated zoom
#[derive(Debug, Clone)]
pub struct Camera2D {
    center: SpringPos2,
    zoom: SpringF32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center: SpringPos2::new(Pos2::ZERO),
            zoom: SpringF32::new(1.0),
            min_zoom: 0.05,
            max_zoom: 4.0,
        }
    }
}

impl Camera2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> Pos2 {
        self.center.get()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.get()
    }

    pub fn target_center(&self) -> Pos2 {
        self.center.target()
    }

    pub fn target_zoom(&self) -> f32 {
        self.zoom.target()
    }

    /// Advance the spring interpolation; call once per frame
    pub fn update(&mut self, dt: f32) {
        self.center.tick(dt);
        self.zoom.tick(dt);
    }

    pub fn is_animating(&self) -> bool {
        self.center.is_animating() || self.zoom.is_animating()
    }

    /// Jump to the targets without animating
    pub fn snap_to_target(&mut self) {
        let target = self.center.target();
        self.center.set_immediate(target);
        self.zoom.set_immediate(self.zoom.target());
    }

    /// Pan by a delta in screen pixels
    pub fn pan(&mut self, screen_delta: Vec2) {
        let world_delta = screen_delta / self.zoom.get();
        let target = self.center.target() - world_delta;
        self.center.set_target(target);
        // Dragging should track the pointer, not lag behind it
        self.center.set_immediate(target);
    }

    /// Animate to center on a world position
    pub fn fly_to(&mut self, world_pos: Pos2) {
        self.center.set_target(world_pos);
    }

    /// Animate to a zoom level
    pub fn zoom_to(&mut self, zoom: f32) {
        self.zoom.set_target(zoom.clamp(self.min_zoom, self.max_zoom));
    }

    /// Zoom by a factor keeping `screen_pos` fixed in view
    pub fn zoom_at(&mut self, factor: f32, screen_pos: Pos2, screen_rect: Rect) {
        let old_zoom = self.zoom.target();
        let new_zoom = (old_zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - old_zoom).abs() < 0.0001 {
            return;
        }

        let offset = screen_pos - screen_rect.center();
        let world_offset_old = offset / old_zoom;
        let world_offset_new = offset / new_zoom;
        let target = self.center.target() + (world_offset_old - world_offset_new);

        self.center.set_target(target);
        self.center.set_immediate(target);
        self.zoom.set_target(new_zoom);
        self.zoom.set_immediate(new_zoom);
    }

    /// Center and zoom so `bounds` fits inside `screen_rect` with padding
    pub fn fit_to_bounds(&mut self, bounds: Rect, screen_rect: Rect, padding: f32) {
        if bounds.is_negative() || bounds.width() < 1.0 || bounds.height() < 1.0 {
            return;
        }
        let padded = Rect::from_min_max(
            screen_rect.min + Vec2::splat(padding),
            screen_rect.max - Vec2::splat(padding),
        );
        let zoom_x = padded.width() / bounds.width();
        let zoom_y = padded.height() / bounds.height();
        let zoom = zoom_x.min(zoom_y).clamp(self.min_zoom, self.max_zoom);

        self.center.set_target(bounds.center());
        self.zoom.set_target(zoom);
    }

    pub fn reset(&mut self) {
        self.center.set_target(Pos2::ZERO);
        self.zoom.set_target(1.0);
    }

    // =========================================================================
    // COORDINATE TRANSFORMS
    // =========================================================================

    pub fn world_to_screen(&self, world_pos: Pos2, screen_rect: Rect) -> Pos2 {
        let offset = (world_pos - self.center()) * self.zoom();
        screen_rect.center() + offset
    }

    pub fn screen_to_world(&self, screen_pos: Pos2, screen_rect: Rect) -> Pos2 {
        let offset = (screen_pos - screen_rect.center()) / self.zoom();
        self.center() + offset
    }

    /// World-space rect currently visible inside `screen_rect`
    pub fn visible_bounds(&self, screen_rect: Rect) -> Rect {
        let size = Vec2::new(
            screen_rect.width() / self.zoom(),
            screen_rect.height() / self.zoom(),
        );
        Rect::from_center_size(self.center(), size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_world_screen_round_trip() {
        let mut camera = Camera2D::new();
        camera.fly_to(Pos2::new(123.0, -45.0));
        camera.zoom_to(2.0);
        camera.snap_to_target();

        let world = Pos2::new(200.0, 100.0);
        let back = camera.screen_to_world(camera.world_to_screen(world, screen()), screen());
        assert!((back.x - world.x).abs() < 0.001);
        assert!((back.y - world.y).abs() < 0.001);
    }

    #[test]
    fn test_visible_bounds_shrinks_with_zoom() {
        let mut camera = Camera2D::new();
        let wide = camera.visible_bounds(screen());
        camera.zoom_to(2.0);
        camera.snap_to_target();
        let narrow = camera.visible_bounds(screen());
        assert!(narrow.width() < wide.width());
        assert_eq!(narrow.center(), wide.center());
    }

    #[test]
    fn test_zoom_at_keeps_cursor_point_stable() {
        let mut camera = Camera2D::new();
        let cursor = Pos2::new(100.0, 100.0);
        let before = camera.screen_to_world(cursor, screen());
        camera.zoom_at(1.5, cursor, screen());
        let after = camera.screen_to_world(cursor, screen());
        assert!((before.x - after.x).abs() < 0.01);
        assert!((before.y - after.y).abs() < 0.01);
    }

    #[test]
    fn test_fit_to_bounds_contains_content() {
        let mut camera = Camera2D::new();
        let bounds = Rect::from_min_max(Pos2::new(-500.0, -500.0), Pos2::new(500.0, 500.0));
        camera.fit_to_bounds(bounds, screen(), 50.0);
        camera.snap_to_target();
        let visible = camera.visible_bounds(screen());
        assert!(visible.contains_rect(bounds));
    }

    #[test]
    fn test_zoom_clamped_to_limits() {
        let mut camera = Camera2D::new();
        camera.zoom_to(100.0);
        assert_eq!(camera.target_zoom(), camera.max_zoom);
        camera.zoom_to(0.0001);
        assert_eq!(camera.target_zoom(), camera.min_zoom);
    }
}
