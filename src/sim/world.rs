//! Contact generation over a dynamics backend
//!
//! Per simulation step the caller runs
//! [`World::generate_contacts`] over its candidate objects, steps the
//! backend with [`World::step`], syncs dynamic objects back from their bodies
//! and optionally checks [`World::is_corrupt`].
//!
//! Contact joints live in a single joint group that is emptied at the start
//! of every sweep, so they last exactly one step. Joints made by
//! [`World::add_motor`], [`World::glue`] and the anchor functions persist
//! until [`World::delete_joint`].

use glam::{Vec2, Vec3};

use super::contact::{Contact, ContactList};
use super::engine::{BodyHandle, DynamicsEngine, JointGroupHandle, JointHandle, JointSpec};
use super::geometry::Geometry;
use super::intersection::{Intersection, ShapeIntersector};
use super::object::{Candidate, Object};
use super::properties::ObjectProperties;
use crate::consts::MOTOR_MAX_FORCE;
use crate::error::{PhysicsError, Result};
use crate::settings::SolverSettings;

/// Owns the backend world, the per-step contact joint group, and the
/// contact scratch buffer
pub struct World<E: DynamicsEngine, I: Intersection = ShapeIntersector> {
    engine: E,
    intersection: I,
    contact_group: JointGroupHandle,
    contact_storage: Vec<Contact>,
    contact_count: usize,
}

impl<E: DynamicsEngine> World<E> {
    pub fn new(engine: E) -> Self {
        Self::with_intersection(engine, ShapeIntersector)
    }
}

impl<E: DynamicsEngine, I: Intersection> World<E, I> {
    pub fn with_intersection(mut engine: E, intersection: I) -> Self {
        let contact_group = engine.create_joint_group();
        Self {
            engine,
            intersection,
            contact_group,
            contact_storage: Vec::with_capacity(ContactList::MAX),
            contact_count: 0,
        }
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[inline]
    pub fn intersection(&self) -> &I {
        &self.intersection
    }

    /// Joint group holding this step's contact joints
    #[inline]
    pub fn contact_group(&self) -> JointGroupHandle {
        self.contact_group
    }

    /// Contact joints created by the last sweep
    #[inline]
    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    /// Advance the backend by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        self.engine.quick_step(dt);
    }

    /// Allocate an uninitialized body
    pub fn body_create(&mut self) -> BodyHandle {
        self.engine.create_body()
    }

    /// Create a dynamic object with a fresh body
    pub fn create_dynamic(&mut self, geometry: Geometry, defaults: &ObjectProperties) -> Object {
        let body = self.engine.create_body();
        Object::new_dynamic(geometry, body, defaults, &mut self.engine)
    }

    /// Destroy an object, releasing its body if it has one
    pub fn destroy_object(&mut self, object: Object) {
        object.release(&mut self.engine);
    }

    /// Copy a dynamic object's body pose into its geometry
    pub fn sync(&self, object: &mut Object) {
        object.sync_from_body(&self.engine);
    }

    /// Rebuild this step's contact joints from the candidates' current
    /// geometry.
    ///
    /// `space` is any re-iterable traversal of candidates: a slice, a `Vec`,
    /// map values and so on. Every unordered pair is visited in traversal
    /// order. Pairs are skipped when neither object is dynamic, or when their
    /// collision masks share no bit and neither object has a callback.
    /// Overlapping pairs are finalized (callbacks fire here) and, if their
    /// masks intersect, turned into contact joints before the next pair is
    /// visited.
    pub fn generate_contacts<'s, C, S>(&mut self, space: S)
    where
        C: Candidate + ?Sized + 's,
        S: IntoIterator<Item = &'s C>,
        S::IntoIter: Clone,
    {
        self.engine.empty_joint_group(self.contact_group);
        self.contact_count = 0;

        let mut contacts = ContactList::with_storage(std::mem::take(&mut self.contact_storage));
        let (mut candidates, mut tested) = (0usize, 0usize);
        let mut rest = space.into_iter();
        while let Some(c1) = rest.next() {
            candidates += 1;
            let Some(o1) = c1.object() else { continue };
            for c2 in rest.clone() {
                let Some(o2) = c2.object() else { continue };
                if !o1.is_dynamic() && !o2.is_dynamic() {
                    continue;
                }

                let (p1, p2) = (o1.properties(), o2.properties());
                let collides = p1.collides_with(p2);
                if !collides && !p1.has_callback() && !p2.has_callback() {
                    continue;
                }

                let (g1, g2) = (o1.geometry(), o2.geometry());
                if !g1.bounds().overlaps(g2.bounds()) {
                    continue;
                }
                tested += 1;
                if !self.intersection.test(g1, g2) {
                    continue;
                }

                contacts.reset(o1, o2);
                self.intersection.find(g1, g2, &mut contacts);
                contacts.finalize();
                if collides {
                    self.contact_count += contacts.create_joints(&mut self.engine, self.contact_group);
                }
            }
        }
        self.contact_storage = contacts.into_storage();

        log::trace!(
            "Contact sweep: {} candidates, {} pairs tested, {} contacts",
            candidates,
            tested,
            self.contact_count
        );
    }

    /// Whether any dynamic body has a non-finite velocity component.
    ///
    /// Detection only; deciding what to do about it is up to the caller.
    pub fn is_corrupt<'s, C, S>(&self, space: S) -> bool
    where
        C: Candidate + ?Sized + 's,
        S: IntoIterator<Item = &'s C>,
    {
        let corrupt = space
            .into_iter()
            .filter_map(|c| c.object())
            .filter_map(Object::body)
            .find(|&body| {
                !self.engine.linear_velocity(body).is_finite()
                    || !self.engine.angular_velocity(body).is_finite()
            });
        match corrupt {
            Some(body) => {
                log::warn!("Non-finite velocity on body {}", body.raw());
                true
            }
            None => false,
        }
    }

    // === Solver tuning ===

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.engine.set_gravity(gravity.extend(0.0));
    }

    pub fn set_cfm(&mut self, cfm: f32) {
        self.engine.set_cfm(cfm);
    }

    pub fn set_erp(&mut self, erp: f32) {
        self.engine.set_erp(erp);
    }

    pub fn set_contact_max_correcting_vel(&mut self, velocity: f32) {
        self.engine.set_contact_max_correcting_vel(velocity);
    }

    pub fn set_contact_surface_layer(&mut self, depth: f32) {
        self.engine.set_contact_surface_layer(depth);
    }

    pub fn set_auto_disable_flag(&mut self, enabled: bool) {
        self.engine.set_auto_disable_flag(enabled);
    }

    pub fn set_auto_disable_linear_threshold(&mut self, threshold: f32) {
        self.engine.set_auto_disable_linear_threshold(threshold);
    }

    pub fn set_auto_disable_angular_threshold(&mut self, threshold: f32) {
        self.engine.set_auto_disable_angular_threshold(threshold);
    }

    /// Forward every solver setting to the backend
    pub fn apply_settings(&mut self, settings: &SolverSettings) {
        self.set_gravity(settings.gravity);
        self.set_cfm(settings.cfm);
        self.set_erp(settings.erp);
        self.set_contact_max_correcting_vel(settings.contact_max_correcting_vel);
        self.set_contact_surface_layer(settings.contact_surface_layer);
        self.set_auto_disable_flag(settings.auto_disable);
        self.set_auto_disable_linear_threshold(settings.auto_disable_linear_threshold);
        self.set_auto_disable_angular_threshold(settings.auto_disable_angular_threshold);
        log::debug!("Applied solver settings ({})", settings.preset.as_str());
    }

    // === Joints ===

    /// Angular motor about z driving `object` against the environment
    pub fn add_motor(&mut self, object: &Object) -> Result<JointHandle> {
        let body = driven_body(object, "add_motor")?;
        let spec = JointSpec::Motor {
            axis: Vec3::Z,
            max_force: MOTOR_MAX_FORCE,
        };
        Ok(self.engine.create_joint(spec, body, BodyHandle::NULL))
    }

    /// Lock `object1` to `object2` (or to the environment if it is static)
    pub fn glue(&mut self, object1: &Object, object2: &Object) -> Result<JointHandle> {
        let body1 = driven_body(object1, "glue")?;
        let body2 = object2.body().unwrap_or(BodyHandle::NULL);
        Ok(self.engine.create_joint(JointSpec::Fixed, body1, body2))
    }

    /// Restrict `object` to sliding along `axis`
    pub fn anchor_axis(&mut self, object: &Object, axis: Vec2) -> Result<JointHandle> {
        let body = driven_body(object, "anchor_axis")?;
        let axis = axis.try_normalize().unwrap_or(Vec2::X).extend(0.0);
        Ok(self.engine.create_joint(JointSpec::Slider { axis }, body, BodyHandle::NULL))
    }

    /// Pin `object` to the environment at `point`, with rotational friction
    /// `friction` and error reduction `erp`
    pub fn anchor(&mut self, object: &Object, point: Vec2, friction: f32, erp: f32) -> Result<JointHandle> {
        let body = driven_body(object, "anchor")?;
        let spec = JointSpec::Pivot {
            anchor: point.extend(0.0),
            friction,
            erp,
        };
        Ok(self.engine.create_joint(spec, body, BodyHandle::NULL))
    }

    /// Pin `object1` to `object2` at `point`
    pub fn anchor_between(
        &mut self,
        object1: &Object,
        object2: &Object,
        point: Vec2,
        friction: f32,
        erp: f32,
    ) -> Result<JointHandle> {
        let body1 = driven_body(object1, "anchor_between")?;
        let body2 = object2.body().unwrap_or(BodyHandle::NULL);
        let spec = JointSpec::Pivot {
            anchor: point.extend(0.0),
            friction,
            erp,
        };
        Ok(self.engine.create_joint(spec, body1, body2))
    }

    pub fn delete_joint(&mut self, joint: JointHandle) {
        self.engine.destroy_joint(joint);
    }

    pub fn set_motor_velocity(&mut self, joint: JointHandle, velocity: f32) {
        self.engine.set_motor_velocity(joint, velocity);
    }

    pub fn motor_velocity(&self, joint: JointHandle) -> f32 {
        self.engine.motor_velocity(joint)
    }
}

impl<E: DynamicsEngine, I: Intersection> Drop for World<E, I> {
    fn drop(&mut self) {
        self.engine.destroy_joint_group(self.contact_group);
    }
}

fn driven_body(object: &Object, operation: &'static str) -> Result<BodyHandle> {
    object.body().ok_or(PhysicsError::NotDynamic { operation })
}
