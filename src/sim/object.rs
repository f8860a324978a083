//! Simulated objects
//!
//! An object pairs one [`Geometry`] with one [`ObjectProperties`]. Dynamic
//! objects also own a backend body; static objects are fixed in place and
//! never integrated.
//!
//! Once the simulation is running the backend is the source of truth for a
//! dynamic object's placement: call [`Object::sync_from_body`] after each step
//! and move the object through [`Object::set_center`] / [`Object::rotate`]
//! rather than mutating the geometry directly.

use glam::{Mat3, Vec2};

use super::engine::{BodyHandle, DynamicsEngine};
use super::geometry::Geometry;
use super::properties::ObjectProperties;
use crate::axis_angle;

/// A dynamic or static simulated object
#[derive(Debug)]
pub struct Object {
    geometry: Geometry,
    properties: ObjectProperties,
    body: Option<BodyHandle>,
}

impl Object {
    /// Fixed object without a body
    pub fn new_static(geometry: Geometry, defaults: &ObjectProperties) -> Self {
        Self {
            geometry,
            properties: defaults.clone(),
            body: None,
        }
    }

    /// Bind `geometry` to a freshly created `body`.
    ///
    /// The body is placed at the geometry's center, rotated about z to match
    /// its axis, and given the mass implied by `defaults.density`. This is the
    /// only point where geometry and body are synchronized automatically.
    pub fn new_dynamic<E: DynamicsEngine>(
        geometry: Geometry,
        body: BodyHandle,
        defaults: &ObjectProperties,
        engine: &mut E,
    ) -> Self {
        debug_assert!(!body.is_null(), "dynamic object needs a body");
        let theta = axis_angle(geometry.axis());
        engine.init_body(body, geometry.center().extend(0.0), Mat3::from_rotation_z(theta));

        let object = Self {
            geometry,
            properties: defaults.clone(),
            body: Some(body),
        };
        object.set_mass(engine, defaults.density);
        object
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body.is_some()
    }

    /// Backend body, `None` for static objects
    #[inline]
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Direct geometry access. For dynamic objects changes are overwritten
    /// by the next [`Object::sync_from_body`].
    #[inline]
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    #[inline]
    pub fn properties(&self) -> &ObjectProperties {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut ObjectProperties {
        &mut self.properties
    }

    /// Apply mass for `density` to the body. No-op for static objects.
    pub fn set_mass<E: DynamicsEngine>(&self, engine: &mut E, density: f32) {
        if let Some(body) = self.body {
            self.geometry.set_mass(engine, body, density);
        }
    }

    /// Copy the body's pose into the geometry. No-op for static objects.
    pub fn sync_from_body<E: DynamicsEngine>(&mut self, engine: &E) {
        let Some(body) = self.body else { return };
        let position = engine.body_position(body);
        let rotation = engine.body_rotation(body);
        self.geometry.set_center(position.truncate());
        self.geometry.set_axis(rotation.x_axis.truncate());
    }

    /// Move the geometry (and body) to `center`
    pub fn set_center<E: DynamicsEngine>(&mut self, engine: &mut E, center: Vec2) {
        self.geometry.set_center(center);
        if let Some(body) = self.body {
            engine.set_body_position(body, center.extend(0.0));
        }
    }

    /// Rotate the geometry (and body) by `theta` radians
    pub fn rotate<E: DynamicsEngine>(&mut self, engine: &mut E, theta: f32) {
        self.geometry.rotate(theta);
        if let Some(body) = self.body {
            let theta = axis_angle(self.geometry.axis());
            engine.set_body_rotation(body, Mat3::from_rotation_z(theta));
        }
    }

    /// Destroy the object, releasing its body if it has one
    pub fn release<E: DynamicsEngine>(mut self, engine: &mut E) {
        if let Some(body) = self.body.take() {
            engine.destroy_body(body);
        }
    }
}

/// A dynamic object must be released through [`Object::release`]; dropping
/// it with a body still bound leaks that body in the backend.
impl Drop for Object {
    fn drop(&mut self) {
        if let Some(body) = self.body {
            log::warn!("Object dropped without release, body {} leaked", body.raw());
            debug_assert!(
                std::thread::panicking(),
                "dynamic object dropped without release (body {})",
                body.raw()
            );
        }
    }
}

/// An entry of the candidate container handed to the contact sweep.
/// Entries that are not physical (no object) are skipped.
pub trait Candidate {
    fn object(&self) -> Option<&Object>;
}

impl Candidate for Object {
    fn object(&self) -> Option<&Object> {
        Some(self)
    }
}

impl Candidate for Option<Object> {
    fn object(&self) -> Option<&Object> {
        self.as_ref()
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn object(&self) -> Option<&Object> {
        (**self).object()
    }
}

impl<T: Candidate + ?Sized> Candidate for Box<T> {
    fn object(&self) -> Option<&Object> {
        (**self).object()
    }
}
