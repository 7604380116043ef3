use bevy::prelude::*;

use crate::vector2::Vector2;

pub const MIN_VISIBLE_RADIUS_PX: f32 = 1.0;
pub const ZOOM_STEP: f32 = 1.1;
pub const MIN_SCALE: f32 = 0.05;
pub const MAX_SCALE: f32 = 20.0;
pub const PAN_STEP_PX: f32 = 20.0;

/// Size of the drawing surface in pixels.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
        }
    }
}

impl Viewport {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * 0.5
    }

    /// Spawn bounds for a fresh simulation.
    pub fn bounds(&self) -> Vector2 {
        Vector2::new(self.width as f64, self.height as f64)
    }

    /// Screen pixels (origin top-left, y down) to world coordinates of a
    /// camera sitting at the origin.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.x - self.width * 0.5, self.height * 0.5 - screen.y)
    }
}

/// Zoom about the viewport centre followed by a pan offset in pixels.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn to_screen(&self, pos: Vector2, viewport: &Viewport) -> Vec2 {
        let c = viewport.center();
        let p = Vec2::new(pos.x as f32, pos.y as f32);
        c + (p - c) * self.scale + self.offset
    }

    /// Drawn radius, never below one pixel so tiny stars stay visible.
    pub fn visible_radius(&self, size: f64) -> f32 {
        (size as f32 * self.scale).max(MIN_VISIBLE_RADIUS_PX)
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }
}
