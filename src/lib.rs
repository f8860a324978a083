//! Flatland - 2D collision detection and contact generation
//!
//! Core modules:
//! - `sim`: Geometry, objects, contact lists and the pairwise contact sweep
//! - `settings`: Solver tuning, loadable from JSON
//! - `error`: Error type for fallible operations
//!
//! Rigid-body integration and joint solving are delegated to a 3D dynamics
//! backend behind [`sim::DynamicsEngine`]; everything here lives in the z = 0
//! plane of that backend.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{PhysicsError, Result};
pub use settings::{SolverPreset, SolverSettings};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Maximum contacts kept per object pair
    pub const MAX_CONTACTS: usize = 64;

    /// Default material density
    pub const DEFAULT_DENSITY: f32 = 1.0;
    /// Default Coulomb friction coefficient
    pub const DEFAULT_FRICTION: f32 = 0.5;
    /// Default bounce factor (no bounce)
    pub const DEFAULT_BOUNCE_FACTOR: f32 = 0.0;
    /// Closing speed below which bounce is suppressed
    pub const DEFAULT_BOUNCE_VELOCITY: f32 = 0.1;
    /// Default masks: participate in everything
    pub const DEFAULT_MASK: u32 = u32::MAX;

    /// Maximum torque a motor joint may apply
    pub const MOTOR_MAX_FORCE: f32 = 1.0e4;
}

/// Orientation angle of a 2D axis, in radians
#[inline]
pub fn axis_angle(axis: Vec2) -> f32 {
    axis.y.atan2(axis.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_axis_angle() {
        assert_eq!(axis_angle(Vec2::X), 0.0);
        assert!((axis_angle(Vec2::Y) - FRAC_PI_2).abs() < 1e-6);
        assert!((axis_angle(Vec2::from_angle(-1.0)) + 1.0).abs() < 1e-6);
    }
}
