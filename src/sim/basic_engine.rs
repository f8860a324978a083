//! Minimal in-process dynamics backend
//!
//! `BasicEngine` stores bodies, joints and world tuning, and integrates free
//! motion (gravity plus velocities). It does not solve joints or contacts:
//! those are recorded so they can be inspected, which is what the contact
//! layer's tests and tools need. Plug in a full solver through
//! [`DynamicsEngine`] for real simulation.

use glam::{Mat3, Vec3};

use super::engine::{
    BodyHandle, ContactJoint, DynamicsEngine, JointGroupHandle, JointHandle, JointSpec,
    MassProperties,
};

#[derive(Debug, Clone, Copy)]
struct BodyState {
    position: Vec3,
    rotation: Mat3,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    mass: MassProperties,
    enabled: bool,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: MassProperties {
                mass: 1.0,
                inertia: 1.0,
            },
            enabled: true,
        }
    }
}

/// What a live joint is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    Contact {
        group: JointGroupHandle,
        contact: ContactJoint,
    },
    Persistent {
        spec: JointSpec,
        motor_velocity: f32,
    },
}

/// A live joint and the bodies it attaches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointRecord {
    pub kind: JointKind,
    pub body1: BodyHandle,
    pub body2: BodyHandle,
}

/// World-level tuning as last set
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tuning {
    pub gravity: Vec3,
    pub cfm: f32,
    pub erp: f32,
    pub contact_max_correcting_vel: f32,
    pub contact_surface_layer: f32,
    pub auto_disable: bool,
    pub auto_disable_linear_threshold: f32,
    pub auto_disable_angular_threshold: f32,
}

/// Handle = slot index + 1 so that 0 stays `NULL`
fn slot(raw: u32) -> Option<usize> {
    (raw as usize).checked_sub(1)
}

/// Slot store with a free list. Vacated slots are reused, so handles of
/// destroyed entries may come back for new ones.
#[derive(Debug)]
struct Slots<T> {
    entries: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    /// Store `value`, returning its raw handle (0 if the store is full)
    fn insert(&mut self, value: T) -> u32 {
        if let Some(raw) = self.free.pop() {
            if let Some(entry) = slot(raw).and_then(|i| self.entries.get_mut(i)) {
                *entry = Some(value);
                return raw;
            }
        }
        let Ok(raw) = u32::try_from(self.entries.len() + 1) else {
            log::warn!("Handle space exhausted");
            return 0;
        };
        self.entries.push(Some(value));
        raw
    }

    fn get(&self, raw: u32) -> Option<&T> {
        self.entries.get(slot(raw)?)?.as_ref()
    }

    fn get_mut(&mut self, raw: u32) -> Option<&mut T> {
        self.entries.get_mut(slot(raw)?)?.as_mut()
    }

    fn remove(&mut self, raw: u32) -> Option<T> {
        let value = self.entries.get_mut(slot(raw)?)?.take()?;
        self.free.push(raw);
        Some(value)
    }

    /// Live entries
    fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Allocated slots, live or vacant
    fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        (1u32..)
            .zip(self.entries.iter_mut())
            .filter_map(|(raw, entry)| Some((raw, entry.as_mut()?)))
    }
}

/// Reference backend that records state and integrates free motion
#[derive(Debug, Default)]
pub struct BasicEngine {
    bodies: Slots<BodyState>,
    joints: Slots<JointRecord>,
    groups: Slots<Vec<JointHandle>>,
    tuning: Tuning,
}

impl BasicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut BodyState> {
        let state = self.bodies.get_mut(body.raw());
        if state.is_none() {
            log::warn!("Unknown body handle {}", body.raw());
        }
        state
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live joints, contact joints included
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Joint storage slots, live or vacant
    pub fn joint_slots(&self) -> usize {
        self.joints.capacity()
    }

    pub fn joint(&self, joint: JointHandle) -> Option<&JointRecord> {
        self.joints.get(joint.raw())
    }

    pub fn body_mass(&self, body: BodyHandle) -> Option<MassProperties> {
        self.bodies.get(body.raw()).map(|b| b.mass)
    }

    /// Whether auto-disable has put the body to sleep
    pub fn is_body_enabled(&self, body: BodyHandle) -> bool {
        self.bodies.get(body.raw()).is_some_and(|b| b.enabled)
    }

    /// Contact joints currently in `group`, in creation order
    pub fn contact_joints(
        &self,
        group: JointGroupHandle,
    ) -> impl Iterator<Item = (ContactJoint, BodyHandle, BodyHandle)> + '_ {
        let members = self.groups.get(group.raw()).map(Vec::as_slice).unwrap_or_default();
        members.iter().filter_map(move |&h| match self.joint(h)? {
            JointRecord {
                kind: JointKind::Contact { contact, .. },
                body1,
                body2,
            } => Some((*contact, *body1, *body2)),
            _ => None,
        })
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }
}

impl DynamicsEngine for BasicEngine {
    fn create_body(&mut self) -> BodyHandle {
        BodyHandle::from_raw(self.bodies.insert(BodyState::default()))
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        if self.bodies.remove(body.raw()).is_none() {
            log::warn!("destroy_body on unknown handle {}", body.raw());
        }
    }

    fn init_body(&mut self, body: BodyHandle, position: Vec3, rotation: Mat3) {
        if let Some(b) = self.body_mut(body) {
            *b = BodyState {
                position,
                rotation,
                ..BodyState::default()
            };
        }
    }

    fn set_body_mass(&mut self, body: BodyHandle, mass: MassProperties) {
        if let Some(b) = self.body_mut(body) {
            b.mass = mass;
        }
    }

    fn body_position(&self, body: BodyHandle) -> Vec3 {
        self.bodies.get(body.raw()).map_or(Vec3::ZERO, |b| b.position)
    }

    fn set_body_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.position = position;
            b.enabled = true;
        }
    }

    fn body_rotation(&self, body: BodyHandle) -> Mat3 {
        self.bodies.get(body.raw()).map_or(Mat3::IDENTITY, |b| b.rotation)
    }

    fn set_body_rotation(&mut self, body: BodyHandle, rotation: Mat3) {
        if let Some(b) = self.body_mut(body) {
            b.rotation = rotation;
            b.enabled = true;
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Vec3 {
        self.bodies.get(body.raw()).map_or(Vec3::ZERO, |b| b.linear_velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.linear_velocity = velocity;
            b.enabled = true;
        }
    }

    fn angular_velocity(&self, body: BodyHandle) -> Vec3 {
        self.bodies.get(body.raw()).map_or(Vec3::ZERO, |b| b.angular_velocity)
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.angular_velocity = velocity;
            b.enabled = true;
        }
    }

    fn create_joint_group(&mut self) -> JointGroupHandle {
        JointGroupHandle::from_raw(self.groups.insert(Vec::new()))
    }

    fn empty_joint_group(&mut self, group: JointGroupHandle) {
        let Some(members) = self.groups.get_mut(group.raw()).map(std::mem::take) else {
            log::warn!("empty_joint_group on unknown handle {}", group.raw());
            return;
        };
        for joint in members {
            self.destroy_joint(joint);
        }
    }

    fn destroy_joint_group(&mut self, group: JointGroupHandle) {
        self.empty_joint_group(group);
        self.groups.remove(group.raw());
    }

    fn create_contact_joint(
        &mut self,
        group: JointGroupHandle,
        contact: &ContactJoint,
        body1: BodyHandle,
        body2: BodyHandle,
    ) -> JointHandle {
        if self.groups.get(group.raw()).is_none() {
            log::warn!("create_contact_joint on unknown group {}", group.raw());
            return JointHandle::NULL;
        }
        let handle = JointHandle::from_raw(self.joints.insert(JointRecord {
            kind: JointKind::Contact {
                group,
                contact: *contact,
            },
            body1,
            body2,
        }));
        if handle.is_null() {
            return handle;
        }
        if let Some(members) = self.groups.get_mut(group.raw()) {
            members.push(handle);
        }
        handle
    }

    fn create_joint(&mut self, spec: JointSpec, body1: BodyHandle, body2: BodyHandle) -> JointHandle {
        let handle = JointHandle::from_raw(self.joints.insert(JointRecord {
            kind: JointKind::Persistent {
                spec,
                motor_velocity: 0.0,
            },
            body1,
            body2,
        }));
        log::debug!("Created {:?} joint {}", spec, handle.raw());
        handle
    }

    fn destroy_joint(&mut self, joint: JointHandle) {
        if self.joints.remove(joint.raw()).is_none() {
            log::warn!("destroy_joint on unknown handle {}", joint.raw());
        }
    }

    fn set_motor_velocity(&mut self, joint: JointHandle, velocity: f32) {
        match self.joints.get_mut(joint.raw()) {
            Some(JointRecord {
                kind:
                    JointKind::Persistent {
                        spec: JointSpec::Motor { .. },
                        motor_velocity,
                    },
                ..
            }) => *motor_velocity = velocity,
            _ => log::warn!("set_motor_velocity on non-motor joint {}", joint.raw()),
        }
    }

    fn motor_velocity(&self, joint: JointHandle) -> f32 {
        match self.joint(joint) {
            Some(JointRecord {
                kind:
                    JointKind::Persistent {
                        spec: JointSpec::Motor { .. },
                        motor_velocity,
                    },
                ..
            }) => *motor_velocity,
            _ => 0.0,
        }
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.tuning.gravity = gravity;
    }

    fn set_cfm(&mut self, cfm: f32) {
        self.tuning.cfm = cfm;
    }

    fn set_erp(&mut self, erp: f32) {
        self.tuning.erp = erp;
    }

    fn set_contact_max_correcting_vel(&mut self, velocity: f32) {
        self.tuning.contact_max_correcting_vel = velocity;
    }

    fn set_contact_surface_layer(&mut self, depth: f32) {
        self.tuning.contact_surface_layer = depth;
    }

    fn set_auto_disable_flag(&mut self, enabled: bool) {
        self.tuning.auto_disable = enabled;
    }

    fn set_auto_disable_linear_threshold(&mut self, threshold: f32) {
        self.tuning.auto_disable_linear_threshold = threshold;
    }

    fn set_auto_disable_angular_threshold(&mut self, threshold: f32) {
        self.tuning.auto_disable_angular_threshold = threshold;
    }

    fn quick_step(&mut self, dt: f32) {
        let tuning = self.tuning;
        for (raw, body) in self.bodies.iter_mut() {
            if !body.enabled || body.mass.mass <= 0.0 {
                continue;
            }

            body.linear_velocity += tuning.gravity * dt;
            body.position += body.linear_velocity * dt;
            body.rotation = Mat3::from_rotation_z(body.angular_velocity.z * dt) * body.rotation;

            if tuning.auto_disable
                && body.linear_velocity.length() < tuning.auto_disable_linear_threshold
                && body.angular_velocity.length() < tuning.auto_disable_angular_threshold
            {
                body.enabled = false;
                log::debug!("Body {raw} auto-disabled");
            }
        }
    }
}
