//! Convex 2D geometry for collision detection
//!
//! A geometry is a shape placed at a center with a unit orientation axis.
//! Its bounding box is cached and recomputed on every placement change, so
//! `bounds()` always encloses the shape where it currently is.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::engine::{BodyHandle, DynamicsEngine, MassProperties};

/// Shape dispatch tag. The order defines the canonical pair order used by
/// the intersection routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Rect,
    Segment,
}

/// Shape parameters in the geometry's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Oriented box; `half_extents.x` runs along the axis
    Rect { half_extents: Vec2 },
    /// Line segment of length `2 * half_length` along the axis
    Segment { half_length: f32 },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Rect { .. } => ShapeKind::Rect,
            Shape::Segment { .. } => ShapeKind::Segment,
        }
    }
}

/// A placed convex shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    shape: Shape,
    center: Vec2,
    axis: Vec2,
    bounds: Aabb,
}

impl Geometry {
    /// Place `shape` at `center`. A zero `axis` falls back to +X.
    pub fn new(shape: Shape, center: Vec2, axis: Vec2) -> Self {
        let mut geometry = Self {
            shape,
            center,
            axis: axis.try_normalize().unwrap_or(Vec2::X),
            bounds: Aabb::from_center_half_extents(center, Vec2::ZERO),
        };
        geometry.update_bounds();
        geometry
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::new(Shape::Circle { radius }, center, Vec2::X)
    }

    pub fn rect(center: Vec2, half_extents: Vec2, axis: Vec2) -> Self {
        Self::new(Shape::Rect { half_extents }, center, axis)
    }

    pub fn segment(center: Vec2, half_length: f32, axis: Vec2) -> Self {
        Self::new(Shape::Segment { half_length }, center, axis)
    }

    /// Recompute the cached bounds from the current center and axis.
    ///
    /// Placement setters already call this; it is only needed after the
    /// shape parameters themselves are replaced via [`Geometry::set_shape`].
    pub fn update_bounds(&mut self) {
        let a = self.axis.abs();
        let p = self.axis.perp().abs();
        let half = match self.shape {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { half_extents } => a * half_extents.x + p * half_extents.y,
            Shape::Segment { half_length } => a * half_length,
        };
        self.bounds = Aabb::from_center_half_extents(self.center, half);
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.update_bounds();
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
        self.update_bounds();
    }

    #[inline]
    pub fn axis(&self) -> Vec2 {
        self.axis
    }

    /// Primary axis for `i == 0`, its perpendicular for anything else
    #[inline]
    pub fn axis_at(&self, i: usize) -> Vec2 {
        if i == 0 { self.axis } else { self.axis.perp() }
    }

    /// Set the orientation axis. Zero-length axes are ignored.
    pub fn set_axis(&mut self, axis: Vec2) {
        if let Some(axis) = axis.try_normalize() {
            self.axis = axis;
            self.update_bounds();
        }
    }

    /// Rotate counter-clockwise by `theta` radians
    pub fn rotate(&mut self, theta: f32) {
        self.rotate_by(Vec2::from_angle(theta));
    }

    /// Rotate by the unit complex number `xform` (cos, sin)
    pub fn rotate_by(&mut self, xform: Vec2) {
        self.set_axis(xform.rotate(self.axis));
    }

    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Corners of a rect or endpoints of a segment, in world space.
    /// Segments repeat each endpoint once.
    pub fn corners(&self) -> Option<[Vec2; 4]> {
        let h = self.box_half_extents()?;
        let ax = self.axis * h.x;
        let ay = self.axis.perp() * h.y;
        let c = self.center;
        Some([c + ax + ay, c - ax + ay, c - ax - ay, c + ax - ay])
    }

    /// Rects and segments viewed as (possibly flat) oriented boxes
    pub(crate) fn box_half_extents(&self) -> Option<Vec2> {
        match self.shape {
            Shape::Rect { half_extents } => Some(half_extents.abs()),
            Shape::Segment { half_length } => Some(Vec2::new(half_length.abs(), 0.0)),
            Shape::Circle { .. } => None,
        }
    }

    /// World point to the geometry's local (axis, perp) frame
    pub(crate) fn to_local(&self, point: Vec2) -> Vec2 {
        let d = point - self.center;
        Vec2::new(d.dot(self.axis), d.dot(self.axis.perp()))
    }

    /// Local (axis, perp) frame to world
    pub(crate) fn to_world(&self, local: Vec2) -> Vec2 {
        self.center + self.axis * local.x + self.axis.perp() * local.y
    }

    /// Mass properties at `density`, or `None` for shapes without area
    pub fn mass_properties(&self, density: f32) -> Option<MassProperties> {
        match self.shape {
            Shape::Circle { radius } => {
                let mass = density * PI * radius * radius;
                Some(MassProperties {
                    mass,
                    inertia: 0.5 * mass * radius * radius,
                })
            }
            Shape::Rect { half_extents } => {
                let size = half_extents.abs() * 2.0;
                let mass = density * size.x * size.y;
                Some(MassProperties {
                    mass,
                    inertia: mass * size.length_squared() / 12.0,
                })
            }
            Shape::Segment { .. } => None,
        }
    }

    /// Apply mass properties for `density` to `body`. No-op for shapes
    /// without a mass model.
    pub fn set_mass<E: DynamicsEngine>(&self, engine: &mut E, body: BodyHandle, density: f32) {
        if let Some(mass) = self.mass_properties(density) {
            engine.set_body_mass(body, mass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::basic_engine::BasicEngine;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_4;

    fn assert_encloses(geometry: &Geometry) {
        let bounds = geometry.bounds();
        for corner in geometry.corners().unwrap() {
            assert!(bounds.contains_point(corner, 1e-4), "{corner} outside {bounds:?}");
        }
    }

    #[test]
    fn test_circle_bounds() {
        let g = Geometry::circle(Vec2::new(1.0, 2.0), 0.5);
        assert_eq!(g.bounds().min(), Vec2::new(0.5, 1.5));
        assert_eq!(g.bounds().max(), Vec2::new(1.5, 2.5));
    }

    #[test]
    fn test_rect_bounds_follow_rotation() {
        let mut g = Geometry::rect(Vec2::ZERO, Vec2::new(2.0, 1.0), Vec2::X);
        assert_eq!(g.bounds().half_extents(), Vec2::new(2.0, 1.0));

        g.rotate(FRAC_PI_4);
        assert_encloses(&g);
        let expected = 3.0 * FRAC_PI_4.cos();
        assert!((g.bounds().half_extents().x - expected).abs() < 1e-5);

        g.set_center(Vec2::new(10.0, -3.0));
        assert_encloses(&g);
        assert!((g.bounds().center() - Vec2::new(10.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn test_segment_bounds_are_flat_along_axis() {
        let g = Geometry::segment(Vec2::ZERO, 3.0, Vec2::Y);
        assert!(g.bounds().half_extents().x.abs() < 1e-6);
        assert!((g.bounds().half_extents().y - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_axis_selector() {
        let g = Geometry::rect(Vec2::ZERO, Vec2::ONE, Vec2::X);
        assert_eq!(g.axis_at(0), Vec2::X);
        assert_eq!(g.axis_at(1), Vec2::Y);
        assert_eq!(g.axis_at(7), Vec2::Y);
    }

    #[test]
    fn test_zero_axis_is_ignored() {
        let mut g = Geometry::new(Shape::Rect { half_extents: Vec2::ONE }, Vec2::ZERO, Vec2::ZERO);
        assert_eq!(g.axis(), Vec2::X);
        g.set_axis(Vec2::ZERO);
        assert_eq!(g.axis(), Vec2::X);
        g.set_axis(Vec2::new(0.0, 5.0));
        assert_eq!(g.axis(), Vec2::Y);
    }

    #[test]
    fn test_rotate_by_matches_rotate() {
        let mut a = Geometry::rect(Vec2::ZERO, Vec2::ONE, Vec2::X);
        let mut b = a.clone();
        a.rotate(0.3);
        b.rotate_by(Vec2::from_angle(0.3));
        assert!((a.axis() - b.axis()).length() < 1e-6);
    }

    #[test]
    fn test_set_shape_refreshes_bounds() {
        let mut g = Geometry::circle(Vec2::ZERO, 1.0);
        g.set_shape(Shape::Circle { radius: 4.0 });
        assert_eq!(g.bounds().half_extents(), Vec2::splat(4.0));
    }

    #[test]
    fn test_mass_properties() {
        let circle = Geometry::circle(Vec2::ZERO, 2.0);
        let m = circle.mass_properties(1.0).unwrap();
        assert!((m.mass - 4.0 * PI).abs() < 1e-4);
        assert!((m.inertia - 0.5 * m.mass * 4.0).abs() < 1e-4);

        let rect = Geometry::rect(Vec2::ZERO, Vec2::new(1.0, 0.5), Vec2::X);
        let m = rect.mass_properties(2.0).unwrap();
        assert!((m.mass - 4.0).abs() < 1e-6);
        assert!((m.inertia - 4.0 * 5.0 / 12.0).abs() < 1e-6);

        assert!(Geometry::segment(Vec2::ZERO, 1.0, Vec2::X).mass_properties(1.0).is_none());
    }

    #[test]
    fn test_set_mass_on_segment_is_noop() {
        let mut engine = BasicEngine::new();
        let body = engine.create_body();
        let before = engine.body_mass(body);

        Geometry::segment(Vec2::ZERO, 1.0, Vec2::X).set_mass(&mut engine, body, 10.0);
        assert_eq!(engine.body_mass(body), before);

        Geometry::circle(Vec2::ZERO, 1.0).set_mass(&mut engine, body, 1.0);
        assert!((engine.body_mass(body).unwrap().mass - PI).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_bounds_enclose_placed_rect(
            cx in -100.0f32..100.0,
            cy in -100.0f32..100.0,
            hx in 0.01f32..10.0,
            hy in 0.01f32..10.0,
            theta in -PI..PI,
        ) {
            let mut g = Geometry::rect(Vec2::ZERO, Vec2::new(hx, hy), Vec2::X);
            g.rotate(theta);
            g.set_center(Vec2::new(cx, cy));
            for corner in g.corners().unwrap() {
                prop_assert!(g.bounds().contains_point(corner, 1e-3));
            }
        }
    }
}
