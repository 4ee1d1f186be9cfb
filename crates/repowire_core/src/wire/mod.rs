//! Field wiring: construct repository instances into owner fields.
//!
//! # Responsibility
//! - Resolve a field's declared type through a `TypeReflector`.
//! - Construct it with the owner's transaction context and store it in place.
//!
//! # Invariants
//! - One construction per wiring call; re-wiring replaces the instance.
//! - A missing transaction is passed as `None`, never skipped.

pub mod reflector;
pub mod registry;
pub mod resolver;
pub mod slot;

pub use reflector::{ConstructError, DeclaredType, FromTransaction, TypeReflector};
pub use registry::FieldRegistry;
pub use resolver::{wire_field, TargetMismatch, WireError, WireResult};
pub use slot::{FieldSlot, Owner, Wired};
