// SPDX-License-Identifier: MIT OR Apache-2.0
//! Eased 2D camera: pan, zoom and world/screen conversion.
//!
//! User commands only move the target transform. The actual transform
//! follows it in [`Camera::update`], once per render tick.

use crate::frame::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest allowed zoom
pub const MIN_ZOOM: f64 = 0.02;
/// Largest allowed zoom
pub const MAX_ZOOM: f64 = 5.0;
/// Zoom that frames the whole play-field after a reset
pub const RESET_ZOOM: f64 = 0.03;
/// Fraction of the remaining distance covered per update
pub const EASING: f64 = 0.1;
/// Below this distance the position snaps to its target
pub const POSITION_EPSILON: f64 = 0.01;
/// Below this distance the zoom snaps to its target
pub const ZOOM_EPSILON: f64 = 0.0001;

const ZOOM_IN_FACTOR: f64 = 1.2;
const ZOOM_OUT_FACTOR: f64 = 0.8;
const WHEEL_IN_FACTOR: f64 = 1.1;
const WHEEL_OUT_FACTOR: f64 = 0.9;

/// Camera position and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// World X at the viewport center
    pub x: f64,
    /// World Y at the viewport center
    pub y: f64,
    /// Screen pixels per world unit
    pub zoom: f64,
}

impl ViewTransform {
    /// Create a new transform
    pub const fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Editor-style camera with eased motion
#[derive(Debug, Clone)]
pub struct Camera {
    /// What is on screen now
    actual: ViewTransform,
    /// Where the camera is heading
    target: ViewTransform,
    /// Viewport size in pixels
    viewport: Vec2,
}

impl Camera {
    /// Create a camera for a viewport of the given pixel size
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            actual: ViewTransform::default(),
            target: ViewTransform::default(),
            viewport: Vec2::new(width, height),
        }
    }

    /// Current (eased) transform
    pub fn actual(&self) -> ViewTransform {
        self.actual
    }

    /// Target transform
    pub fn target(&self) -> ViewTransform {
        self.target
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Resize the viewport. Non-finite sizes are ignored.
    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) {
            tracing::debug!("Ignoring non-finite viewport {width}x{height}");
            return;
        }
        self.viewport = Vec2::new(width, height);
    }

    /// Check if the actual transform has reached the target
    pub fn is_settled(&self) -> bool {
        self.actual == self.target
    }

    /// Ease the actual transform towards the target. Returns true if anything moved.
    pub fn update(&mut self) -> bool {
        let before = self.actual;
        self.actual.x = approach(self.actual.x, self.target.x, POSITION_EPSILON);
        self.actual.y = approach(self.actual.y, self.target.y, POSITION_EPSILON);
        self.actual.zoom = approach(self.actual.zoom, self.target.zoom, ZOOM_EPSILON);
        self.actual != before
    }

    /// Pan by a screen-space delta.
    ///
    /// Uses the current zoom rather than the target zoom, so pan speed
    /// matches what is on screen during a zoom animation.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            tracing::debug!("Ignoring non-finite pan ({dx}, {dy})");
            return;
        }
        self.target.x -= dx / self.actual.zoom;
        self.target.y -= dy / self.actual.zoom;
    }

    /// Zoom in one step
    pub fn zoom_in(&mut self) {
        self.scale_target_zoom(ZOOM_IN_FACTOR);
    }

    /// Zoom out one step
    pub fn zoom_out(&mut self) {
        self.scale_target_zoom(ZOOM_OUT_FACTOR);
    }

    /// Zoom from a mouse wheel delta; scrolling up (`delta_y <= 0`) zooms in
    pub fn handle_wheel(&mut self, delta_y: f64) {
        if delta_y.is_nan() {
            return;
        }
        let factor = if delta_y <= 0.0 {
            WHEEL_IN_FACTOR
        } else {
            WHEEL_OUT_FACTOR
        };
        self.scale_target_zoom(factor);
    }

    /// Head back to the origin at the play-field zoom
    pub fn reset(&mut self) {
        self.target = ViewTransform::new(0.0, 0.0, RESET_ZOOM);
    }

    /// Center the target on a world point, keeping the zoom.
    /// Non-finite points are ignored.
    pub fn focus(&mut self, point: Vec2) {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return;
        }
        self.target.x = point.x;
        self.target.y = point.y;
    }

    /// Convert a world position to screen pixels
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let center = self.viewport_center();
        Vec2::new(
            (world.x - self.actual.x) * self.actual.zoom + center.x,
            (world.y - self.actual.y) * self.actual.zoom + center.y,
        )
    }

    /// Convert screen pixels to a world position; inverse of [`Camera::world_to_screen`]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let center = self.viewport_center();
        Vec2::new(
            (screen.x - center.x) / self.actual.zoom + self.actual.x,
            (screen.y - center.y) / self.actual.zoom + self.actual.y,
        )
    }

    fn viewport_center(&self) -> Vec2 {
        Vec2::new(self.viewport.x / 2.0, self.viewport.y / 2.0)
    }

    fn scale_target_zoom(&mut self, factor: f64) {
        self.target.zoom = (self.target.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// One easing step; snaps once the remaining distance is below `epsilon`,
/// or when `current` is not a finite number
fn approach(current: f64, target: f64, epsilon: f64) -> f64 {
    let remaining = target - current;
    if !current.is_finite() || remaining.abs() < epsilon {
        target
    } else {
        current + remaining * EASING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_update_converges_then_holds() {
        let mut camera = Camera::default();
        camera.focus(Vec2::new(100.0, 0.0));

        // 100 * 0.9^n < 0.01 after ~88 steps, plus one snapping step
        let bound = ((POSITION_EPSILON / 100.0).ln() / (1.0 - EASING).ln()).ceil() as usize + 1;
        let mut ticks = 0;
        while camera.update() {
            ticks += 1;
            assert!(ticks <= bound, "did not settle within {bound} ticks");
        }

        assert_eq!(camera.actual(), ViewTransform::new(100.0, 0.0, 1.0));
        assert!(camera.is_settled());
        assert!(!camera.update());
        assert_eq!(camera.actual().x, 100.0);
    }

    #[test]
    fn test_update_eases_fractionally() {
        let mut camera = Camera::default();
        camera.focus(Vec2::new(100.0, -50.0));
        camera.update();
        assert_close(camera.actual().x, 10.0);
        assert_close(camera.actual().y, -5.0);
        assert_close(camera.actual().zoom, 1.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::default();
        for _ in 0..50 {
            camera.zoom_in();
        }
        assert_eq!(camera.target().zoom, MAX_ZOOM);

        for _ in 0..100 {
            camera.handle_wheel(120.0);
        }
        assert_eq!(camera.target().zoom, MIN_ZOOM);

        camera.zoom_out();
        assert_eq!(camera.target().zoom, MIN_ZOOM);
    }

    #[test]
    fn test_wheel_direction() {
        let mut camera = Camera::default();
        camera.handle_wheel(0.0);
        assert_close(camera.target().zoom, 1.1);
        camera.handle_wheel(3.0);
        assert_close(camera.target().zoom, 1.1 * 0.9);
    }

    #[test]
    fn test_pan_uses_actual_zoom() {
        let mut camera = Camera::default();
        camera.zoom_in();
        // Target zoom is 1.2, actual still 1.0
        camera.pan(10.0, -20.0);
        assert_close(camera.target().x, -10.0);
        assert_close(camera.target().y, 20.0);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut camera = Camera::new(1024.0, 768.0);
        camera.focus(Vec2::new(1234.5, -987.25));
        camera.zoom_out();
        camera.zoom_out();
        for _ in 0..7 {
            camera.update();
        }

        for world in [Vec2::new(0.0, 0.0), Vec2::new(-3000.0, 42.5), Vec2::new(1e4, -1e4)] {
            let back = camera.screen_to_world(camera.world_to_screen(world));
            assert!((back.x - world.x).abs() < 1e-6);
            assert!((back.y - world.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_camera_position_maps_to_viewport_center() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.focus(Vec2::new(50.0, 50.0));
        while camera.update() {}
        assert_eq!(camera.world_to_screen(Vec2::new(50.0, 50.0)), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut camera = Camera::default();
        camera.pan(f64::NAN, 0.0);
        camera.pan(0.0, f64::INFINITY);
        camera.handle_wheel(f64::NAN);
        camera.focus(Vec2::new(f64::NEG_INFINITY, 1.0));
        camera.resize(f64::NAN, 720.0);

        assert_eq!(camera.target(), ViewTransform::default());
        assert_eq!(camera.viewport(), Vec2::new(1280.0, 720.0));
        assert!(!camera.update());
    }

    #[test]
    fn test_update_recovers_from_non_finite_state() {
        let mut camera = Camera::default();
        camera.actual.x = f64::NAN;
        camera.reset();
        camera.update();
        assert_eq!(camera.actual().x, 0.0);

        while camera.update() {}
        assert!(camera.is_settled());
        assert_eq!(camera.actual(), ViewTransform::new(0.0, 0.0, RESET_ZOOM));
    }

    #[test]
    fn test_reset_targets_play_field() {
        let mut camera = Camera::default();
        camera.pan(100.0, 100.0);
        camera.reset();
        assert_eq!(camera.target(), ViewTransform::new(0.0, 0.0, RESET_ZOOM));
        // Actual only changes through update
        assert_eq!(camera.actual(), ViewTransform::default());
    }
}
