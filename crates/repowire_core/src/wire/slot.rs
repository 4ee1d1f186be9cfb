//! Owner and field slot contracts.
//!
//! # Responsibility
//! - Describe what an owning object must expose to be wired.
//! - Provide the `Wired<T>` slot that receives constructed instances.
//!
//! # Invariants
//! - A slot only accepts instances of its own element type.
//! - A slot never goes back to unwired once an instance was assigned.

use std::any::{type_name, Any, TypeId};
use std::fmt::{Debug, Formatter};

/// Object whose fields can be wired with repository instances.
///
/// Implementors list their wireable fields by name in `field_mut` and may
/// expose a shared transaction context through `transaction`.
pub trait Owner: 'static {
    /// Transaction context threaded into wired instances.
    type Tx: Clone + 'static;

    /// Returns the owner's transaction context.
    ///
    /// Owners without a transaction keep the default, which yields the
    /// canonical null marker `None`.
    fn transaction(&self) -> Option<Self::Tx> {
        None
    }

    /// Returns the wireable slot stored under `name`, if any.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn FieldSlot>;
}

/// Type-erased view of one wireable field.
pub trait FieldSlot {
    /// `TypeId` of the instances this slot holds.
    fn element_type(&self) -> TypeId;

    /// Human-readable name of the element type, for diagnostics.
    fn element_type_name(&self) -> &'static str;

    /// Stores `instance`, replacing any previous one.
    ///
    /// Returns the instance back unchanged when its type does not match.
    fn assign(&mut self, instance: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
}

/// Field slot holding a lazily wired instance of `T`.
pub struct Wired<T> {
    instance: Option<T>,
}

impl<T> Wired<T> {
    /// Creates an empty slot. Reads return `None` until wired.
    pub const fn unwired() -> Self {
        Self { instance: None }
    }

    pub fn is_wired(&self) -> bool {
        self.instance.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.instance.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.instance.as_mut()
    }
}

impl<T> Default for Wired<T> {
    fn default() -> Self {
        Self::unwired()
    }
}

impl<T: Debug> Debug for Wired<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.instance {
            Some(instance) => f.debug_tuple("Wired").field(instance).finish(),
            None => f.write_str("Unwired"),
        }
    }
}

impl<T: 'static> FieldSlot for Wired<T> {
    fn element_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn assign(&mut self, instance: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let instance = instance.downcast::<T>()?;
        self.instance = Some(*instance);
        Ok(())
    }
}
