//! Axis-aligned bounding boxes in the simulation plane

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// Invariant: `min` components are less than or equal to `max` components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    /// Constructs a box from its corners.
    ///
    /// # Panics
    /// Panics if any component of `min` is greater than its counterpart in `max`.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        assert!(min.x <= max.x && min.y <= max.y, "invalid AABB: min > max");
        Self { min, max }
    }

    /// Box centered at `center` extending `half_extents` each way
    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.max
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Returns `true` if the boxes overlap (inclusive on edges).
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    /// Returns `true` if `point` lies inside or on the box, with `tolerance` slack.
    pub fn contains_point(&self, point: Vec2, tolerance: f32) -> bool {
        point.x >= self.min.x - tolerance
            && point.x <= self.max.x + tolerance
            && point.y >= self.min.y - tolerance
            && point.y <= self.max.y + tolerance
    }
}
