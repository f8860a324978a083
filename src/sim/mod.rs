//! 2D collision layer over a 3D dynamics backend
//!
//! Objects live in the z = 0 plane. This module owns everything the backend
//! does not know about: shapes and their bounds, per-object surface
//! properties, the narrow phase, and turning overlaps into contact joints.
//! - Backend access goes through [`DynamicsEngine`] only
//! - Pairs are visited in container order
//! - Contact joints last exactly one step

pub mod aabb;
pub mod basic_engine;
pub mod contact;
pub mod engine;
pub mod geometry;
pub mod intersection;
pub mod object;
pub mod properties;
pub mod world;

pub use aabb::Aabb;
pub use basic_engine::BasicEngine;
pub use contact::{Contact, ContactList};
pub use engine::{
    BodyHandle, ContactJoint, DynamicsEngine, JointGroupHandle, JointHandle, JointSpec,
    MassProperties, SurfaceParams,
};
pub use geometry::{Geometry, Shape, ShapeKind};
pub use intersection::{Intersection, ShapeIntersector};
pub use object::{Candidate, Object};
pub use properties::{ContactCallback, Mask, ObjectProperties, PropertyStack};
pub use world::World;
