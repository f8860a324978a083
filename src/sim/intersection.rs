//! Narrow-phase intersection
//!
//! [`Intersection`] is the contract the contact sweep relies on: a cheap
//! overlap `test`, then `find` to fill a [`ContactList`]. [`ShapeIntersector`]
//! implements it for the built-in shapes.
//!
//! Shape pairs are handled in a canonical order (`ShapeKind` order). When the
//! caller's pair is reversed relative to that order, the geometries are
//! swapped and the list's normal inversion is toggled around the call, so
//! reported normals still point from the caller's first object to its second.

use glam::Vec2;

use super::contact::ContactList;
use super::geometry::{Geometry, Shape, ShapeKind};

/// Tolerance for "point inside box" checks, relative to box size
const CONTAINMENT_EPSILON: f32 = 1e-4;

/// Narrow-phase service used by the contact sweep
pub trait Intersection {
    /// Whether the two geometries overlap
    fn test(&self, g1: &Geometry, g2: &Geometry) -> bool;

    /// Add the contacts between `g1` and `g2` to `contacts`, normals
    /// pointing from `g1` toward `g2`
    fn find(&self, g1: &Geometry, g2: &Geometry, contacts: &mut ContactList<'_>);
}

/// Result of a single-point shape query
#[derive(Debug, Clone, Copy)]
struct Penetration {
    point: Vec2,
    /// From the first shape toward the second
    normal: Vec2,
    depth: f32,
}

/// Intersection routines for circles, rects and segments.
///
/// Segment/segment pairs have no contact model and never intersect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeIntersector;

impl Intersection for ShapeIntersector {
    fn test(&self, g1: &Geometry, g2: &Geometry) -> bool {
        if !g1.bounds().overlaps(g2.bounds()) {
            return false;
        }
        let (a, b) = canonical(g1, g2);
        match (a.shape(), b.shape()) {
            (Shape::Circle { .. }, Shape::Circle { .. }) => circle_circle(a, b).is_some(),
            (Shape::Circle { .. }, _) => circle_box(a, b).is_some(),
            (Shape::Segment { .. }, Shape::Segment { .. }) => false,
            _ => box_box_axis(a, b).is_some(),
        }
    }

    fn find(&self, g1: &Geometry, g2: &Geometry, contacts: &mut ContactList<'_>) {
        if g1.kind() > g2.kind() {
            contacts.toggle_normal_inversion();
            find_canonical(g2, g1, contacts);
            contacts.toggle_normal_inversion();
        } else {
            find_canonical(g1, g2, contacts);
        }
    }
}

fn canonical<'g>(g1: &'g Geometry, g2: &'g Geometry) -> (&'g Geometry, &'g Geometry) {
    if g1.kind() > g2.kind() { (g2, g1) } else { (g1, g2) }
}

/// `a.kind() <= b.kind()` holds here
fn find_canonical(a: &Geometry, b: &Geometry, contacts: &mut ContactList<'_>) {
    match (a.kind(), b.kind()) {
        (ShapeKind::Circle, ShapeKind::Circle) => {
            if let Some(p) = circle_circle(a, b) {
                contacts.add_contact(p.point, p.normal, p.depth);
            }
        }
        (ShapeKind::Circle, _) => {
            if let Some(p) = circle_box(a, b) {
                contacts.add_contact(p.point, p.normal, p.depth);
            }
        }
        (ShapeKind::Segment, ShapeKind::Segment) => {}
        _ => box_box(a, b, contacts),
    }
}

fn radius(g: &Geometry) -> f32 {
    match g.shape() {
        Shape::Circle { radius } => radius.abs(),
        _ => 0.0,
    }
}

fn circle_circle(a: &Geometry, b: &Geometry) -> Option<Penetration> {
    let (ra, rb) = (radius(a), radius(b));
    let delta = b.center() - a.center();
    let dist = delta.length();
    let depth = ra + rb - dist;
    if depth <= 0.0 {
        return None;
    }
    // Concentric circles: any direction will do
    let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::X };
    Some(Penetration {
        point: a.center() + normal * (ra - depth * 0.5),
        normal,
        depth,
    })
}

/// Circle `a` against rect or segment `b`
fn circle_box(a: &Geometry, b: &Geometry) -> Option<Penetration> {
    let r = radius(a);
    let half = b.box_half_extents()?;
    let local = b.to_local(a.center());
    let closest = local.clamp(-half, half);

    if closest != local {
        // Center outside the box: push along closest-point direction
        let diff = local - closest;
        let dist = diff.length();
        if dist >= r {
            return None;
        }
        let outward = b.to_world(diff / dist) - b.center();
        return Some(Penetration {
            point: b.to_world(closest),
            normal: -outward,
            depth: r - dist,
        });
    }

    // Center inside the box: leave through the nearest face
    let gap = half - local.abs();
    let (face, sign) = if gap.x < gap.y {
        (Vec2::X, local.x.signum())
    } else {
        (Vec2::Y, local.y.signum())
    };
    let outward = b.to_world(face * sign) - b.center();
    let surface = local + face * sign * gap.dot(face);
    Some(Penetration {
        point: b.to_world(surface),
        normal: -outward,
        depth: r + gap.dot(face),
    })
}

/// Projected radius of box `g` (half extents `half`) onto unit `axis`
fn projected_radius(g: &Geometry, half: Vec2, axis: Vec2) -> f32 {
    half.x * g.axis().dot(axis).abs() + half.y * g.axis().perp().dot(axis).abs()
}

/// Separating-axis test between two (possibly flat) boxes. Returns the axis
/// of least penetration, oriented from `a` toward `b`, and the depth.
fn box_box_axis(a: &Geometry, b: &Geometry) -> Option<(Vec2, f32)> {
    let ha = a.box_half_extents()?;
    let hb = b.box_half_extents()?;
    let delta = b.center() - a.center();

    let mut best: Option<(Vec2, f32)> = None;
    for axis in [a.axis_at(0), a.axis_at(1), b.axis_at(0), b.axis_at(1)] {
        let distance = delta.dot(axis);
        let overlap = projected_radius(a, ha, axis) + projected_radius(b, hb, axis) - distance.abs();
        if overlap <= 0.0 {
            return None;
        }
        if best.is_none_or(|(_, depth)| overlap < depth) {
            let normal = if distance < 0.0 { -axis } else { axis };
            best = Some((normal, overlap));
        }
    }
    best
}

fn contains(g: &Geometry, point: Vec2) -> bool {
    let Some(half) = g.box_half_extents() else {
        return false;
    };
    let local = g.to_local(point).abs();
    let slack = CONTAINMENT_EPSILON * half.max_element().max(1.0);
    local.x <= half.x + slack && local.y <= half.y + slack
}

/// Box/box manifold: corners of either box inside the other. Falls back to
/// a single point between the boxes for edge-crossing overlaps.
fn box_box(a: &Geometry, b: &Geometry, contacts: &mut ContactList<'_>) {
    let Some((normal, depth)) = box_box_axis(a, b) else {
        return;
    };
    let (Some(corners_a), Some(corners_b)) = (a.corners(), b.corners()) else {
        return;
    };

    let mut points: Vec<Vec2> = Vec::with_capacity(8);
    let inside = corners_b
        .iter()
        .filter(|&&p| contains(a, p))
        .chain(corners_a.iter().filter(|&&p| contains(b, p)));
    for &p in inside {
        // Flat boxes repeat their corners
        if !points.iter().any(|q| q.distance_squared(p) < 1e-10) {
            points.push(p);
        }
    }

    if points.is_empty() {
        let ha = a.box_half_extents().unwrap_or_default();
        let reach = projected_radius(a, ha, normal);
        points.push(a.center() + normal * (reach - depth * 0.5));
    }

    for p in points {
        contacts.add_contact(p, normal, depth);
    }
}
