//! Physical material and behavior properties
//!
//! Every object carries its own copy of [`ObjectProperties`], taken at
//! construction from whatever defaults the caller passes in.
//! [`PropertyStack`] gives those defaults push/pop scoping.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::contact::ContactList;
use crate::consts::*;

/// Bitmask channel
pub type Mask = u32;

/// Contact notification, invoked once per finalized pair
pub type ContactCallback = Rc<dyn Fn(&ContactList<'_>)>;

/// Material and behavior of a simulated object
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectProperties {
    pub density: f32,
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Fraction of closing velocity reflected
    pub bounce_factor: f32,
    /// Closing speed below which bounce is suppressed
    pub bounce_velocity: f32,
    /// Objects collide only if their collision masks share a bit
    pub collision_mask: Mask,
    /// Contacts carry friction only if the friction masks share a bit
    pub friction_mask: Mask,
    /// Notified when a contact involving this object is finalized
    #[serde(skip)]
    pub callback: Option<ContactCallback>,
}

impl Default for ObjectProperties {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            friction: DEFAULT_FRICTION,
            bounce_factor: DEFAULT_BOUNCE_FACTOR,
            bounce_velocity: DEFAULT_BOUNCE_VELOCITY,
            collision_mask: DEFAULT_MASK,
            friction_mask: DEFAULT_MASK,
            callback: None,
        }
    }
}

impl fmt::Debug for ObjectProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProperties")
            .field("density", &self.density)
            .field("friction", &self.friction)
            .field("bounce_factor", &self.bounce_factor)
            .field("bounce_velocity", &self.bounce_velocity)
            .field("collision_mask", &self.collision_mask)
            .field("friction_mask", &self.friction_mask)
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Callbacks compare by identity
impl PartialEq for ObjectProperties {
    fn eq(&self, other: &Self) -> bool {
        let same_callback = match (&self.callback, &other.callback) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        self.density == other.density
            && self.friction == other.friction
            && self.bounce_factor == other.bounce_factor
            && self.bounce_velocity == other.bounce_velocity
            && self.collision_mask == other.collision_mask
            && self.friction_mask == other.friction_mask
            && same_callback
    }
}

impl ObjectProperties {
    /// Attach a contact callback
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ContactList<'_>) + 'static,
    {
        self.callback = Some(Rc::new(callback));
        self
    }

    #[inline]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Whether the collision masks share a bit
    #[inline]
    pub fn collides_with(&self, other: &Self) -> bool {
        self.collision_mask & other.collision_mask != 0
    }

    /// Whether the friction masks share a bit
    #[inline]
    pub fn rubs_against(&self, other: &Self) -> bool {
        self.friction_mask & other.friction_mask != 0
    }
}

/// Scoped defaults for new objects.
///
/// `push` saves the current defaults, `pop` restores the last saved set.
/// Every push must be matched by exactly one pop.
#[derive(Debug, Clone, Default)]
pub struct PropertyStack {
    current: ObjectProperties,
    saved: Vec<ObjectProperties>,
}

impl PropertyStack {
    pub fn new(base: ObjectProperties) -> Self {
        Self {
            current: base,
            saved: Vec::new(),
        }
    }

    /// Defaults new objects copy
    #[inline]
    pub fn current(&self) -> &ObjectProperties {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut ObjectProperties {
        &mut self.current
    }

    pub fn push(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Restore the defaults saved by the matching `push`.
    ///
    /// # Panics
    /// Panics if there is no matching `push`.
    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(saved) => self.current = saved,
            None => panic!("PropertyStack::pop without matching push"),
        }
    }

    /// Number of saved sets
    #[inline]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Run `f` between a push and its pop
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push();
        let depth = self.depth();
        let result = f(self);
        assert_eq!(self.depth(), depth, "unbalanced push/pop inside PropertyStack::scoped");
        self.pop();
        result
    }
}
