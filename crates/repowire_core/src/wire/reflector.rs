//! Declared field types and the reflector capability that supplies them.
//!
//! # Responsibility
//! - Capture "which concrete type belongs to this field" as plain data.
//! - Abstract the lookup behind `TypeReflector` so owners can declare fields
//!   through a registry, a closure or any custom source.

use crate::wire::slot::Owner;
use std::any::{type_name, Any, TypeId};
use std::error::Error;
use std::fmt::{Debug, Formatter};

/// Boxed constructor failure, kept as the original error value.
pub type ConstructError = Box<dyn Error + Send + Sync + 'static>;

type ConstructFn<Tx> = fn(Option<Tx>) -> Result<Box<dyn Any>, ConstructError>;

/// Types constructible from a single transaction argument.
///
/// The argument is `Some(tx)` when the owner carries a transaction and `None`
/// otherwise. It is always passed.
pub trait FromTransaction<Tx>: Sized + 'static {
    type Error: Error + Send + Sync + 'static;

    fn from_transaction(tx: Option<Tx>) -> Result<Self, Self::Error>;
}

/// Declared nominal type of one field, with the means to build it.
pub struct DeclaredType<Tx> {
    type_id: TypeId,
    type_name: &'static str,
    construct: ConstructFn<Tx>,
}

impl<Tx: 'static> DeclaredType<Tx> {
    /// Declares `T` as the field type.
    pub fn of<T: FromTransaction<Tx>>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            construct: construct_boxed::<Tx, T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Runs the declared constructor once with `tx` as its sole argument.
    pub fn construct(&self, tx: Option<Tx>) -> Result<Box<dyn Any>, ConstructError> {
        (self.construct)(tx)
    }
}

impl<Tx> Clone for DeclaredType<Tx> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tx> Copy for DeclaredType<Tx> {}

impl<Tx> Debug for DeclaredType<Tx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclaredType")
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn construct_boxed<Tx, T: FromTransaction<Tx>>(
    tx: Option<Tx>,
) -> Result<Box<dyn Any>, ConstructError> {
    match T::from_transaction(tx) {
        Ok(instance) => Ok(Box::new(instance)),
        Err(err) => Err(Box::new(err)),
    }
}

/// Capability resolving the declared type of an owner's field.
pub trait TypeReflector<O: Owner> {
    /// Returns the declared type of `field` on `owner`, or `None` when the
    /// field carries no type metadata.
    fn declared_type(&self, owner: &O, field: &str) -> Option<DeclaredType<O::Tx>>;
}

impl<O, F> TypeReflector<O> for F
where
    O: Owner,
    F: Fn(&O, &str) -> Option<DeclaredType<O::Tx>>,
{
    fn declared_type(&self, owner: &O, field: &str) -> Option<DeclaredType<O::Tx>> {
        self(owner, field)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeclaredType, FromTransaction};
    use std::convert::Infallible;

    struct Echo(Option<u8>);

    impl FromTransaction<u8> for Echo {
        type Error = Infallible;

        fn from_transaction(tx: Option<u8>) -> Result<Self, Self::Error> {
            Ok(Self(tx))
        }
    }

    #[test]
    fn declared_type_builds_instances_of_the_declared_type() {
        let declared = DeclaredType::<u8>::of::<Echo>();
        assert!(declared.type_name().ends_with("Echo"));

        let built = declared.construct(Some(4)).unwrap();
        let echo = built.downcast::<Echo>().expect("instance should be an Echo");
        assert_eq!(echo.0, Some(4));
    }
}
