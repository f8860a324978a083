//! Dynamics backend interface
//!
//! Flatland does not integrate bodies or solve joints itself. It talks to a
//! 3D rigid-body backend through [`DynamicsEngine`] and keeps everything in
//! the z = 0 plane. Bodies and joints are identified by opaque handles that
//! only the backend can interpret.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "no handle"
            pub const NULL: Self = Self(0);

            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

handle!(
    /// Rigid body owned by the backend. `NULL` stands for the static environment.
    BodyHandle
);
handle!(
    /// Joint owned by the backend
    JointHandle
);
handle!(
    /// Group of joints released together
    JointGroupHandle
);

/// Mass and moment of inertia about the body's z axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: f32,
}

/// Per-contact surface model handed to the solver
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceParams {
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Bounce factor (0 = inelastic, 1 = perfectly elastic)
    pub bounce: f32,
    /// Minimum closing speed for bounce to apply
    pub bounce_velocity: f32,
}

/// A single contact constraint, in backend (3D) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactJoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub depth: f32,
    pub surface: SurfaceParams,
}

/// Persistent joint kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JointSpec {
    /// Angular motor about `axis`
    Motor { axis: Vec3, max_force: f32 },
    /// Rigidly locks the two bodies together
    Fixed,
    /// Constrains motion to translation along `axis`
    Slider { axis: Vec3 },
    /// Hinge about the z axis through `anchor`, with rotational friction
    Pivot { anchor: Vec3, friction: f32, erp: f32 },
}

/// Operations flatland needs from a rigid-body backend.
///
/// `BodyHandle::NULL` passed as a joint body means "attached to the static
/// environment". Implementations should tolerate unknown handles (log and
/// ignore) rather than abort; the contact sweep relies on that to degrade
/// instead of failing.
pub trait DynamicsEngine {
    // === Bodies ===
    fn create_body(&mut self) -> BodyHandle;
    fn destroy_body(&mut self, body: BodyHandle);
    /// Place a freshly created body and reset its velocities
    fn init_body(&mut self, body: BodyHandle, position: Vec3, rotation: Mat3);
    fn set_body_mass(&mut self, body: BodyHandle, mass: MassProperties);
    fn body_position(&self, body: BodyHandle) -> Vec3;
    fn set_body_position(&mut self, body: BodyHandle, position: Vec3);
    fn body_rotation(&self, body: BodyHandle) -> Mat3;
    fn set_body_rotation(&mut self, body: BodyHandle, rotation: Mat3);
    fn linear_velocity(&self, body: BodyHandle) -> Vec3;
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);
    fn angular_velocity(&self, body: BodyHandle) -> Vec3;
    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    // === Joints ===
    fn create_joint_group(&mut self) -> JointGroupHandle;
    /// Destroy every joint in the group, keeping the group itself
    fn empty_joint_group(&mut self, group: JointGroupHandle);
    fn destroy_joint_group(&mut self, group: JointGroupHandle);
    fn create_contact_joint(
        &mut self,
        group: JointGroupHandle,
        contact: &ContactJoint,
        body1: BodyHandle,
        body2: BodyHandle,
    ) -> JointHandle;
    fn create_joint(&mut self, spec: JointSpec, body1: BodyHandle, body2: BodyHandle) -> JointHandle;
    fn destroy_joint(&mut self, joint: JointHandle);
    fn set_motor_velocity(&mut self, joint: JointHandle, velocity: f32);
    fn motor_velocity(&self, joint: JointHandle) -> f32;

    // === World tuning ===
    fn set_gravity(&mut self, gravity: Vec3);
    fn set_cfm(&mut self, cfm: f32);
    fn set_erp(&mut self, erp: f32);
    fn set_contact_max_correcting_vel(&mut self, velocity: f32);
    fn set_contact_surface_layer(&mut self, depth: f32);
    fn set_auto_disable_flag(&mut self, enabled: bool);
    fn set_auto_disable_linear_threshold(&mut self, threshold: f32);
    fn set_auto_disable_angular_threshold(&mut self, threshold: f32);

    /// Advance the simulation by `dt` seconds
    fn quick_step(&mut self, dt: f32);
}
