//! Geometry kernel: oriented-rectangle hit testing and gizmo handle layout.
//!
//! Pure functions only. Handle tolerances are given in screen pixels and
//! divided by the current view scale so they stay a constant size on screen.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Pick radius for gizmo handles, in screen pixels.
pub const HANDLE_TOLERANCE_PX: f32 = 15.0;
/// Distance of the rotate handle beyond the rect's right edge, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f32 = 30.0;

/// Normalize an angle in radians to [0, 2π).
pub fn normalize_angle(angle: f32) -> f32 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// A rectangle rotated about its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedRect {
    pub center: Vec2,
    pub half_extents: Vec2,
    pub angle: f32,
}

impl OrientedRect {
    pub fn new(center: Vec2, width: f32, height: f32, angle: f32) -> Self {
        Self {
            center,
            half_extents: Vec2::new(width * 0.5, height * 0.5),
            angle,
        }
    }

    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_extents.y * 2.0
    }

    /// Inverse-rotate a world point about the center into the rect's frame.
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(point - self.center)
    }

    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.center + Vec2::from_angle(self.angle).rotate(local)
    }

    /// Hit test: axis-aligned containment in the local frame, edges inclusive.
    pub fn contains(&self, point: Vec2) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.half_extents.x && local.y.abs() <= self.half_extents.y
    }

    /// Half of the diagonal; no point of the rect lies farther from the center.
    pub fn bounding_radius(&self) -> f32 {
        self.half_extents.length()
    }

    /// World-space corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Vec2; 4] {
        Corner::ALL.map(|c| self.corner(c))
    }

    pub fn corner(&self, corner: Corner) -> Vec2 {
        self.to_world(corner.signs() * self.half_extents)
    }

    /// Closest point of the rect (boundary or interior) to `point`.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let local = self.to_local(point);
        let clamped = local.clamp(-self.half_extents, self.half_extents);
        self.to_world(clamped)
    }
}

/// Rect corners, named in the rect's local frame (y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Unit signs of the corner in the local frame.
    pub fn signs(self) -> Vec2 {
        match self {
            Self::TopLeft => Vec2::new(-1.0, -1.0),
            Self::TopRight => Vec2::new(1.0, -1.0),
            Self::BottomRight => Vec2::new(1.0, 1.0),
            Self::BottomLeft => Vec2::new(-1.0, 1.0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }
}

/// A gizmo control handle on a selected rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleId {
    Resize(Corner),
    Rotate,
}

impl HandleId {
    /// Every handle a rect-shaped entity exposes.
    pub const RECT_SET: [HandleId; 5] = [
        HandleId::Resize(Corner::TopLeft),
        HandleId::Resize(Corner::TopRight),
        HandleId::Resize(Corner::BottomRight),
        HandleId::Resize(Corner::BottomLeft),
        HandleId::Rotate,
    ];
}

/// World position of a handle for the given view scale.
pub fn handle_position(rect: &OrientedRect, handle: HandleId, view_scale: f32) -> Vec2 {
    match handle {
        HandleId::Resize(corner) => rect.corner(corner),
        HandleId::Rotate => {
            let reach = rect.half_extents.x + ROTATE_HANDLE_OFFSET_PX / view_scale.max(f32::EPSILON);
            rect.to_world(Vec2::new(reach, 0.0))
        }
    }
}

/// Closest handle within the default pick tolerance, if any.
///
/// Handles only claim points inside their own radius; a point in the body
/// but away from every handle yields `None`.
pub fn nearest_handle(
    point: Vec2,
    rect: &OrientedRect,
    handles: &[HandleId],
    view_scale: f32,
) -> Option<HandleId> {
    nearest_handle_within(point, rect, handles, view_scale, HANDLE_TOLERANCE_PX)
}

/// [`nearest_handle`] with an explicit tolerance in screen pixels.
pub fn nearest_handle_within(
    point: Vec2,
    rect: &OrientedRect,
    handles: &[HandleId],
    view_scale: f32,
    tolerance_px: f32,
) -> Option<HandleId> {
    let tolerance = tolerance_px / view_scale.max(f32::EPSILON);
    handles
        .iter()
        .map(|&h| (h, handle_position(rect, h, view_scale).distance(point)))
        .filter(|&(_, d)| d < tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(h, _)| h)
}

pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    point.distance_squared(center) <= radius * radius
}

/// Circle–oriented-rect overlap via the rect's closest point.
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &OrientedRect) -> bool {
    point_in_circle(rect.closest_point(center), center, radius)
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Bounds enclosing every corner of the given rects, or `None` if empty.
    pub fn from_rects<'a>(rects: impl IntoIterator<Item = &'a OrientedRect>) -> Option<Self> {
        let mut iter = rects.into_iter().flat_map(|r| r.corners());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn strip() -> OrientedRect {
        OrientedRect::new(Vec2::new(100.0, 200.0), 20.0, 100.0, 0.0)
    }

    #[test]
    fn normalize_wraps_into_range() {
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((normalize_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!(normalize_angle(-1e-9) < TAU);
    }

    #[test]
    fn center_always_hits_under_rotation() {
        for step in 0..64 {
            let mut rect = strip();
            rect.angle = step as f32 * 0.1 - 3.0;
            assert!(rect.contains(rect.center));
        }
    }

    #[test]
    fn outside_bounding_diagonal_never_hits() {
        for step in 0..32 {
            let mut rect = strip();
            rect.angle = step as f32 * 0.2;
            let r = rect.bounding_radius() + 0.5;
            for k in 0..16 {
                let dir = Vec2::from_angle(k as f32 * TAU / 16.0);
                assert!(!rect.contains(rect.center + dir * r));
            }
        }
    }

    #[test]
    fn rotated_strip_hits_along_its_long_axis() {
        let mut rect = strip();
        rect.angle = FRAC_PI_2;
        // rotated a quarter turn, the long axis lies along world x
        assert!(rect.contains(rect.center + Vec2::new(45.0, 0.0)));
        assert!(!rect.contains(rect.center + Vec2::new(0.0, 45.0)));
    }

    #[test]
    fn corners_follow_rotation() {
        let rect = OrientedRect::new(Vec2::ZERO, 2.0, 2.0, FRAC_PI_4);
        let tl = rect.corner(Corner::TopLeft);
        assert!((tl - Vec2::new(0.0, -2f32.sqrt())).length() < 1e-5);
        assert_eq!(Corner::TopLeft.opposite(), Corner::BottomRight);
    }

    #[test]
    fn nearest_handle_picks_corner_within_tolerance() {
        let rect = OrientedRect::new(Vec2::new(300.0, 300.0), 200.0, 40.0, 0.0);
        let br = rect.corner(Corner::BottomRight);
        let hit = nearest_handle(br + Vec2::new(3.0, 2.0), &rect, &HandleId::RECT_SET, 1.0);
        assert_eq!(hit, Some(HandleId::Resize(Corner::BottomRight)));
    }

    #[test]
    fn body_interior_is_not_a_handle() {
        let rect = OrientedRect::new(Vec2::new(300.0, 300.0), 200.0, 40.0, 0.7);
        assert_eq!(nearest_handle(rect.center, &rect, &HandleId::RECT_SET, 1.0), None);
    }

    #[test]
    fn handle_tolerance_shrinks_when_zoomed_in() {
        let rect = OrientedRect::new(Vec2::ZERO, 200.0, 40.0, 0.0);
        let near = rect.corner(Corner::TopLeft) + Vec2::new(10.0, 0.0);
        assert!(nearest_handle(near, &rect, &HandleId::RECT_SET, 1.0).is_some());
        assert!(nearest_handle(near, &rect, &HandleId::RECT_SET, 2.0).is_none());
    }

    #[test]
    fn rotate_handle_sits_beyond_right_edge() {
        let rect = OrientedRect::new(Vec2::ZERO, 200.0, 40.0, PI);
        let pos = handle_position(&rect, HandleId::Rotate, 1.0);
        assert!((pos - Vec2::new(-130.0, 0.0)).length() < 1e-3);
        assert_eq!(nearest_handle(pos, &rect, &HandleId::RECT_SET, 1.0), Some(HandleId::Rotate));
    }

    #[test]
    fn circle_rect_overlap() {
        let rect = strip();
        assert!(circle_intersects_rect(Vec2::new(125.0, 200.0), 16.0, &rect));
        assert!(!circle_intersects_rect(Vec2::new(140.0, 200.0), 16.0, &rect));
    }

    #[test]
    fn aabb_encloses_rects() {
        let a = OrientedRect::new(Vec2::ZERO, 10.0, 10.0, 0.0);
        let b = OrientedRect::new(Vec2::new(100.0, 50.0), 10.0, 10.0, 0.0);
        let bounds = Aabb::from_rects([&a, &b]).unwrap();
        assert_eq!(bounds.min, Vec2::new(-5.0, -5.0));
        assert_eq!(bounds.max, Vec2::new(105.0, 55.0));
        assert!(Aabb::from_rects(std::iter::empty()).is_none());
    }
}
