//! Spring interpolators for smooth camera motion
//!
//! Critically-damped spring physics; values are polled each frame via
//! `get()` after a `tick(dt)` at the start of the update.

use egui::Pos2;

/// Spring parameters. Damping 1.0 is critically damped (no overshoot).
#[derive(Debug, Clone, Copy)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 170.0,
            damping: 1.0,
        }
    }
}

/// Animated f32 value
#[derive(Debug, Clone)]
pub struct SpringF32 {
    current: f32,
    target: f32,
    velocity: f32,
    config: SpringConfig,
}

impl SpringF32 {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            velocity: 0.0,
            config: SpringConfig::default(),
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Jump immediately, no animation
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.velocity = 0.0;
    }

    /// Advance the spring; `dt` in seconds, clamped to keep large steps stable
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        let displacement = self.current - self.target;
        let spring_force = -self.config.stiffness * displacement;
        let damping_force =
            -self.config.damping * 2.0 * self.config.stiffness.sqrt() * self.velocity;

        self.velocity += (spring_force + damping_force) * dt;
        self.current += self.velocity * dt;

        // Snap when close to avoid micro-oscillation
        if (self.current - self.target).abs() < 0.0001 && self.velocity.abs() < 0.001 {
            self.current = self.target;
            self.velocity = 0.0;
        }
    }

    pub fn get(&self) -> f32 {
        self.current
    }

    pub fn is_animating(&self) -> bool {
        (self.current - self.target).abs() > 0.0001 || self.velocity.abs() > 0.001
    }
}

/// Animated 2D point built from two springs
#[derive(Debug, Clone)]
pub struct SpringPos2 {
    pub x: SpringF32,
    pub y: SpringF32,
}

impl SpringPos2 {
    pub fn new(pos: Pos2) -> Self {
        Self {
            x: SpringF32::new(pos.x),
            y: SpringF32::new(pos.y),
        }
    }

    pub fn set_target(&mut self, pos: Pos2) {
        self.x.set_target(pos.x);
        self.y.set_target(pos.y);
    }

    pub fn target(&self) -> Pos2 {
        Pos2::new(self.x.target(), self.y.target())
    }

    pub fn set_immediate(&mut self, pos: Pos2) {
        self.x.set_immediate(pos.x);
        self.y.set_immediate(pos.y);
    }

    pub fn tick(&mut self, dt: f32) {
        self.x.tick(dt);
        self.y.tick(dt);
    }

    pub fn get(&self) -> Pos2 {
        Pos2::new(self.x.get(), self.y.get())
    }

    pub fn is_animating(&self) -> bool {
        self.x.is_animating() || self.y.is_animating()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_converges_to_target() {
        let mut spring = SpringF32::new(0.0);
        spring.set_target(10.0);
        for _ in 0..600 {
            spring.tick(1.0 / 60.0);
        }
        assert!((spring.get() - 10.0).abs() < 0.01);
        assert!(!spring.is_animating());
    }

    #[test]
    fn test_set_immediate_skips_animation() {
        let mut spring = SpringF32::new(0.0);
        spring.set_immediate(5.0);
        assert_eq!(spring.get(), 5.0);
        assert!(!spring.is_animating());
    }

    #[test]
    fn test_pos2_spring_tracks_both_axes() {
        let mut spring = SpringPos2::new(Pos2::ZERO);
        spring.set_target(Pos2::new(100.0, -50.0));
        for _ in 0..600 {
            spring.tick(1.0 / 60.0);
        }
        let p = spring.get();
        assert!((p.x - 100.0).abs() < 0.01);
        assert!((p.y + 50.0).abs() < 0.01);
    }
}
