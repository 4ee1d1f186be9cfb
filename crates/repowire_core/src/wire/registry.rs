//! Explicit per-owner field declarations.
//!
//! # Responsibility
//! - Let an owner type declare which fields get wired, and with which type.
//! - Act as the `TypeReflector` for that owner type.
//! - Wire all declared fields in declaration order.
//!
//! # Invariants
//! - Field names are identifiers and declared at most once.
//! - Declaration order is preserved.

use crate::wire::reflector::{DeclaredType, FromTransaction, TypeReflector};
use crate::wire::resolver::{wire_field, WireError, WireResult};
use crate::wire::slot::Owner;
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::type_name;
use std::fmt::{Debug, Formatter};

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"));

/// Declared wiring plan for owner type `O`.
pub struct FieldRegistry<O: Owner> {
    fields: Vec<(String, DeclaredType<O::Tx>)>,
}

impl<O: Owner> FieldRegistry<O> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declares `field` as holding an instance of `T`.
    ///
    /// # Errors
    /// - `InvalidFieldName` when `field` is not an identifier.
    /// - `DuplicateField` when `field` was declared before.
    pub fn declare<T: FromTransaction<O::Tx>>(mut self, field: &str) -> WireResult<Self> {
        if !FIELD_NAME_RE.is_match(field) {
            return Err(WireError::InvalidFieldName(field.to_string()));
        }
        if self.contains(field) {
            return Err(WireError::DuplicateField {
                owner: type_name::<O>(),
                field: field.to_string(),
            });
        }

        self.fields.push((field.to_string(), DeclaredType::of::<T>()));
        Ok(self)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns declared field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Wires every declared field of `owner`, in declaration order.
    ///
    /// Stops at the first failure. Fields wired before it keep their new
    /// instances.
    pub fn wire_all(&self, owner: &mut O) -> WireResult<usize> {
        for (name, _) in &self.fields {
            wire_field(self, owner, name)?;
        }
        Ok(self.fields.len())
    }
}

impl<O: Owner> Default for FieldRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Owner> Debug for FieldRegistry<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(name, declared)| (name, declared)))
            .finish()
    }
}

impl<O: Owner> TypeReflector<O> for FieldRegistry<O> {
    fn declared_type(&self, _owner: &O, field: &str) -> Option<DeclaredType<O::Tx>> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, declared)| *declared)
    }
}
