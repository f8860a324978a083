//! Contact accumulation for one object pair
//!
//! A `ContactList` is scratch space: the world resets it for each
//! overlapping pair, the intersection routines fill it, `finalize` settles
//! the surface parameters and notifies callbacks, and `create_joints` turns
//! the records into one-step contact constraints. Its contents are only
//! meaningful while that pair is being processed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::engine::{BodyHandle, ContactJoint, DynamicsEngine, JointGroupHandle, SurfaceParams};
use super::object::Object;
use crate::consts::MAX_CONTACTS;

/// A single contact point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact point in world space
    pub position: Vec2,
    /// Unit normal, pointing from the first object toward the second
    pub normal: Vec2,
    /// Penetration depth
    pub depth: f32,
}

/// Contacts between two objects, capped at [`ContactList::MAX`]
#[derive(Debug)]
pub struct ContactList<'a> {
    pair: Option<(&'a Object, &'a Object)>,
    contacts: Vec<Contact>,
    invert_normals: bool,
    surface: SurfaceParams,
    dropped: usize,
}

impl Default for ContactList<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ContactList<'a> {
    pub const MAX: usize = MAX_CONTACTS;

    pub fn new() -> Self {
        Self::with_storage(Vec::with_capacity(Self::MAX))
    }

    /// Reuse an existing buffer (its contents are discarded)
    pub(crate) fn with_storage(mut storage: Vec<Contact>) -> Self {
        storage.clear();
        storage.reserve(Self::MAX);
        Self {
            pair: None,
            contacts: storage,
            invert_normals: false,
            surface: SurfaceParams::default(),
            dropped: 0,
        }
    }

    /// Give the buffer back for the next sweep
    pub(crate) fn into_storage(self) -> Vec<Contact> {
        self.contacts
    }

    /// Clear the list and bind it to a new pair
    pub fn reset(&mut self, o1: &'a Object, o2: &'a Object) {
        self.pair = Some((o1, o2));
        self.contacts.clear();
        self.invert_normals = false;
        self.surface = SurfaceParams::default();
        self.dropped = 0;
    }

    /// First object of the pair
    pub fn self_object(&self) -> Option<&'a Object> {
        self.pair.map(|(o1, _)| o1)
    }

    /// Second object of the pair
    pub fn other_object(&self) -> Option<&'a Object> {
        self.pair.map(|(_, o2)| o2)
    }

    /// Flip the sign of normals added from now on. Used when contacts are
    /// generated with the pair's geometries in swapped order.
    pub fn toggle_normal_inversion(&mut self) {
        self.invert_normals = !self.invert_normals;
    }

    #[inline]
    pub fn normals_inverted(&self) -> bool {
        self.invert_normals
    }

    /// Append a contact. Once the list holds `MAX` records further contacts
    /// are dropped; existing records are never replaced.
    ///
    /// # Panics
    /// Panics if the list has not been bound with `reset`.
    pub fn add_contact(&mut self, position: Vec2, normal: Vec2, depth: f32) {
        assert!(self.pair.is_some(), "ContactList::add_contact before reset");
        if self.contacts.len() >= Self::MAX {
            if self.dropped == 0 {
                log::warn!("Contact list full ({} contacts), dropping the rest", Self::MAX);
            }
            self.dropped += 1;
            return;
        }
        let normal = if self.invert_normals { -normal } else { normal };
        self.contacts.push(Contact {
            position,
            normal,
            depth,
        });
    }

    /// Settle the pair's surface parameters and notify both objects'
    /// callbacks (first object, then second).
    ///
    /// Friction and bounce take the larger value of the two objects.
    /// Objects whose friction masks share no bit get frictionless contacts.
    ///
    /// # Panics
    /// Panics if the list has not been bound with `reset`.
    pub fn finalize(&mut self) {
        let Some((o1, o2)) = self.pair else {
            panic!("ContactList::finalize before reset");
        };
        let p1 = o1.properties();
        let p2 = o2.properties();

        let friction = if p1.rubs_against(p2) {
            p1.friction.max(p2.friction)
        } else {
            0.0
        };
        self.surface = SurfaceParams {
            friction,
            bounce: p1.bounce_factor.max(p2.bounce_factor),
            bounce_velocity: p1.bounce_velocity.min(p2.bounce_velocity),
        };

        if let Some(callback) = &p1.callback {
            callback(&*self);
        }
        if let Some(callback) = &p2.callback {
            callback(&*self);
        }
    }

    /// Surface parameters computed by `finalize`
    #[inline]
    pub fn surface(&self) -> SurfaceParams {
        self.surface
    }

    /// Emit one contact joint per record into `group`. Returns the number
    /// of joints the engine accepted.
    pub fn create_joints<E: DynamicsEngine>(&self, engine: &mut E, group: JointGroupHandle) -> usize {
        let Some((o1, o2)) = self.pair else {
            return 0;
        };
        let b1 = o1.body().unwrap_or(BodyHandle::NULL);
        let b2 = o2.body().unwrap_or(BodyHandle::NULL);

        let mut created = 0;
        for contact in &self.contacts {
            let joint = ContactJoint {
                position: contact.position.extend(0.0),
                normal: contact.normal.extend(0.0),
                depth: contact.depth,
                surface: self.surface,
            };
            if !engine.create_contact_joint(group, &joint, b1, b2).is_null() {
                created += 1;
            }
        }
        created
    }

    /// Number of contacts kept (after the cap)
    #[inline]
    pub fn count(&self) -> usize {
        self.contacts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    #[inline]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::basic_engine::BasicEngine;
    use crate::sim::geometry::Geometry;
    use crate::sim::properties::ObjectProperties;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use std::cell::Cell;
    use std::rc::Rc;

    fn object(properties: ObjectProperties) -> Object {
        Object::new_static(Geometry::circle(Vec2::ZERO, 1.0), &properties)
    }

    fn dynamic(engine: &mut BasicEngine, x: f32) -> Object {
        let body = engine.create_body();
        Object::new_dynamic(
            Geometry::circle(Vec2::new(x, 0.0), 1.0),
            body,
            &ObjectProperties::default(),
            engine,
        )
    }

    #[test]
    fn test_add_contact_caps_at_max_keeping_first() {
        let a = object(ObjectProperties::default());
        let b = object(ObjectProperties::default());
        let mut list = ContactList::new();
        list.reset(&a, &b);

        for i in 0..ContactList::MAX + 10 {
            list.add_contact(Vec2::new(i as f32, 0.0), Vec2::Y, i as f32 * 0.01);
        }

        assert_eq!(list.count(), ContactList::MAX);
        for (i, contact) in list.contacts().iter().enumerate() {
            assert_eq!(contact.position, Vec2::new(i as f32, 0.0));
            assert_eq!(contact.normal, Vec2::Y);
            assert_eq!(contact.depth, i as f32 * 0.01);
        }
    }

    #[test]
    fn test_reset_clears_contacts_and_inversion() {
        let a = object(ObjectProperties::default());
        let b = object(ObjectProperties::default());
        let mut list = ContactList::new();
        list.reset(&a, &b);
        list.toggle_normal_inversion();
        list.add_contact(Vec2::ZERO, Vec2::X, 0.1);

        list.reset(&b, &a);
        assert!(list.is_empty());
        assert!(!list.normals_inverted());
        assert!(std::ptr::eq(list.self_object().unwrap(), &b));
        assert!(std::ptr::eq(list.other_object().unwrap(), &a));
    }

    #[test]
    #[should_panic(expected = "before reset")]
    fn test_add_contact_without_reset_panics() {
        ContactList::new().add_contact(Vec2::ZERO, Vec2::X, 0.1);
    }

    #[test]
    #[should_panic(expected = "before reset")]
    fn test_finalize_without_reset_panics() {
        ContactList::new().finalize();
    }

    #[test]
    fn test_finalize_takes_maxima() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut cases = vec![(0.0, 0.0, 0.0, 0.0), (-1.0, -2.0, -0.5, -0.25), (0.0, -3.0, 0.0, -1.0)];
        for _ in 0..50 {
            cases.push((
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            ));
        }

        for (f1, f2, b1, b2) in cases {
            let a = object(ObjectProperties {
                friction: f1,
                bounce_factor: b1,
                ..Default::default()
            });
            let b = object(ObjectProperties {
                friction: f2,
                bounce_factor: b2,
                ..Default::default()
            });
            let mut list = ContactList::new();
            list.reset(&a, &b);
            list.finalize();
            assert_eq!(list.surface().friction, f32::max(f1, f2));
            assert_eq!(list.surface().bounce, f32::max(b1, b2));
        }
    }

    #[test]
    fn test_disjoint_friction_masks_are_frictionless() {
        let a = object(ObjectProperties {
            friction: 2.0,
            bounce_factor: 0.3,
            friction_mask: 0b01,
            ..Default::default()
        });
        let b = object(ObjectProperties {
            friction_mask: 0b10,
            ..Default::default()
        });
        let mut list = ContactList::new();
        list.reset(&a, &b);
        list.finalize();
        assert_eq!(list.surface().friction, 0.0);
        assert_eq!(list.surface().bounce, 0.3);
    }

    #[test]
    fn test_finalize_invokes_each_callback_once_with_final_list() {
        let seen = Rc::new(Cell::new(0usize));
        let seen_a = seen.clone();
        let a = object(ObjectProperties::default().with_callback(move |list| {
            assert_eq!(list.count(), 2);
            seen_a.set(seen_a.get() + 1);
        }));
        let seen_b = seen.clone();
        let b = object(ObjectProperties::default().with_callback(move |list| {
            assert_eq!(list.surface().friction, crate::consts::DEFAULT_FRICTION);
            seen_b.set(seen_b.get() + 10);
        }));

        let mut list = ContactList::new();
        list.reset(&a, &b);
        list.add_contact(Vec2::ZERO, Vec2::X, 0.1);
        list.add_contact(Vec2::ONE, Vec2::X, 0.2);
        list.finalize();
        assert_eq!(seen.get(), 11);
    }

    #[test]
    fn test_create_joints_carries_records_and_surface() {
        let mut engine = BasicEngine::new();
        let group = engine.create_joint_group();
        let a = dynamic(&mut engine, 0.0);
        let b = object(ObjectProperties {
            bounce_factor: 0.5,
            ..Default::default()
        });

        let mut list = ContactList::new();
        list.reset(&a, &b);
        list.add_contact(Vec2::new(1.0, 2.0), Vec2::X, 0.25);
        list.finalize();
        assert_eq!(list.create_joints(&mut engine, group), 1);

        let joints: Vec<_> = engine.contact_joints(group).collect();
        assert_eq!(joints.len(), 1);
        let (joint, b1, b2) = joints[0];
        assert_eq!(joint.position, glam::Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(joint.normal, glam::Vec3::X);
        assert_eq!(joint.depth, 0.25);
        assert_eq!(joint.surface.bounce, 0.5);
        assert_eq!(b1, a.body().unwrap());
        assert!(b2.is_null());

        drop(list);
        a.release(&mut engine);
    }

    #[test]
    fn test_create_joints_counts_only_accepted() {
        let mut engine = BasicEngine::new();
        let a = dynamic(&mut engine, 0.0);
        let b = object(ObjectProperties::default());

        let mut list = ContactList::new();
        list.reset(&a, &b);
        list.add_contact(Vec2::ZERO, Vec2::X, 0.1);
        list.add_contact(Vec2::ONE, Vec2::X, 0.1);
        list.finalize();

        let missing = JointGroupHandle::from_raw(42);
        assert_eq!(list.create_joints(&mut engine, missing), 0);
        assert_eq!(engine.joint_count(), 0);

        drop(list);
        a.release(&mut engine);
    }

    #[test]
    fn test_normal_inversion_matches_negated_normal() {
        let mut engine = BasicEngine::new();
        let group = engine.create_joint_group();
        let a = dynamic(&mut engine, 0.0);
        let b = dynamic(&mut engine, 1.5);
        let n = Vec2::new(0.6, 0.8);

        let mut toggled = ContactList::new();
        toggled.reset(&a, &b);
        toggled.toggle_normal_inversion();
        toggled.add_contact(Vec2::new(0.75, 0.0), n, 0.5);
        toggled.finalize();

        let mut plain = ContactList::new();
        plain.reset(&a, &b);
        plain.add_contact(Vec2::new(0.75, 0.0), -n, 0.5);
        plain.finalize();

        assert_eq!(toggled.contacts(), plain.contacts());
        toggled.create_joints(&mut engine, group);
        plain.create_joints(&mut engine, group);
        let joints: Vec<_> = engine.contact_joints(group).collect();
        assert_eq!(joints[0], joints[1]);
        assert_eq!(joints[0].0.normal, (-n).extend(0.0));

        drop((toggled, plain));
        a.release(&mut engine);
        b.release(&mut engine);
    }

    #[test]
    fn test_storage_is_reused() {
        let a = object(ObjectProperties::default());
        let mut list = ContactList::new();
        list.reset(&a, &a);
        list.add_contact(Vec2::ZERO, Vec2::X, 0.1);
        let storage = list.into_storage();
        let capacity = storage.capacity();

        let list = ContactList::with_storage(storage);
        assert!(list.is_empty());
        assert_eq!(list.into_storage().capacity(), capacity);
    }
}
