use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;

/// Logical playfield size (portrait 9:16).
pub const LOGICAL_SIZE: Vec2 = Vec2::new(720.0, 1280.0);

const MIN_FOCUS_ZOOM: f32 = 1.0;
const MAX_FOCUS_ZOOM: f32 = 2.5;
const CAMERA_SNAP_PAN: f32 = 0.1;
const CAMERA_SNAP_ZOOM: f32 = 0.001;

/// Camera pan (logical units) and zoom, applied after the window fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Screen/world mapping: window fit (letterbox or pillarbox) then camera.
///
/// `screen = ((world + pan) * zoom) * fit_scale + fit_offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub logical_size: Vec2,
    pub fit_scale: f32,
    pub fit_offset: Vec2,
    pub camera: Camera,
    pub target: Camera,
}

impl Default for View {
    fn default() -> Self {
        Self {
            logical_size: LOGICAL_SIZE,
            fit_scale: 1.0,
            fit_offset: Vec2::ZERO,
            camera: Camera::default(),
            target: Camera::default(),
        }
    }
}

impl View {
    /// Fit the logical area inside a window of the given size.
    pub fn fit(window_width: f32, window_height: f32) -> Self {
        let mut view = Self::default();
        view.resize(window_width, window_height);
        view
    }

    pub fn resize(&mut self, window_width: f32, window_height: f32) {
        let window_ratio = window_width / window_height;
        let target_ratio = self.logical_size.x / self.logical_size.y;
        if window_ratio > target_ratio {
            self.fit_scale = window_height / self.logical_size.y;
            self.fit_offset = Vec2::new(
                (window_width - self.logical_size.x * self.fit_scale) * 0.5,
                0.0,
            );
        } else {
            self.fit_scale = window_width / self.logical_size.x;
            self.fit_offset = Vec2::new(
                0.0,
                (window_height - self.logical_size.y * self.fit_scale) * 0.5,
            );
        }
    }

    /// Screen pixels per world unit.
    pub fn view_scale(&self) -> f32 {
        self.fit_scale * self.camera.zoom
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.fit_offset) / self.fit_scale / self.camera.zoom - self.camera.pan
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world + self.camera.pan) * self.camera.zoom * self.fit_scale + self.fit_offset
    }

    /// Aim the camera at `bounds`, zoomed to fit with `padding` on each side.
    pub fn focus_on(&mut self, bounds: Aabb, padding: f32) {
        let size = bounds.size() + Vec2::splat(padding * 2.0);
        let fit = self.logical_size / size.max(Vec2::splat(f32::EPSILON));
        let zoom = fit.min_element().clamp(MIN_FOCUS_ZOOM, MAX_FOCUS_ZOOM);
        let pan = self.logical_size * 0.5 / zoom - bounds.center();
        self.target = Camera { pan, zoom };
    }

    pub fn reset_camera(&mut self) {
        self.target = Camera::default();
    }

    /// Ease the camera toward its target by `alpha`, snapping when close.
    pub fn update(&mut self, alpha: f32) {
        let cam = &mut self.camera;
        cam.pan += (self.target.pan - cam.pan) * alpha;
        cam.zoom += (self.target.zoom - cam.zoom) * alpha;
        if (self.target.pan.x - cam.pan.x).abs() < CAMERA_SNAP_PAN {
            cam.pan.x = self.target.pan.x;
        }
        if (self.target.pan.y - cam.pan.y).abs() < CAMERA_SNAP_PAN {
            cam.pan.y = self.target.pan.y;
        }
        if (self.target.zoom - cam.zoom).abs() < CAMERA_SNAP_ZOOM {
            cam.zoom = self.target.zoom;
        }
    }
}
