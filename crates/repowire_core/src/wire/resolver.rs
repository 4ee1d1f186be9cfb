//! Field wiring resolver.
//!
//! # Responsibility
//! - Construct the declared type of one owner field and store it in place.
//! - Thread the owner's transaction context into the constructor.
//!
//! # Invariants
//! - The constructor receives exactly one argument: `Some(tx)` or `None`.
//! - Every failure leaves the owner untouched.
//! - Lookup and slot checks happen before construction; a failed check never
//!   constructs anything.
//! - Each call constructs a fresh instance and drops the previous one.

use crate::wire::reflector::{ConstructError, TypeReflector};
use crate::wire::slot::Owner;
use log::{debug, error};
use std::any::type_name;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WireResult<T> = Result<T, WireError>;

/// Why a field cannot receive the declared instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMismatch {
    /// The owner exposes no slot with this name.
    UnknownField,
    /// The slot holds a different type than the one declared.
    SlotType {
        slot: &'static str,
        declared: &'static str,
    },
}

/// Errors raised while declaring or wiring fields.
#[derive(Debug)]
pub enum WireError {
    MissingTypeMetadata {
        owner: &'static str,
        field: String,
    },
    InvalidFieldTarget {
        owner: &'static str,
        field: String,
        reason: TargetMismatch,
    },
    InvalidFieldName(String),
    DuplicateField {
        owner: &'static str,
        field: String,
    },
    /// The declared type's constructor failed; holds its original error.
    Construction(ConstructError),
}

impl WireError {
    /// Stable snake_case code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTypeMetadata { .. } => "missing_type_metadata",
            Self::InvalidFieldTarget { .. } => "invalid_field_target",
            Self::InvalidFieldName(_) => "invalid_field_name",
            Self::DuplicateField { .. } => "duplicate_field",
            Self::Construction(_) => "construction_failed",
        }
    }
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTypeMetadata { owner, field } => {
                write!(f, "no declared type for field `{field}` on `{owner}`")
            }
            Self::InvalidFieldTarget {
                owner,
                field,
                reason: TargetMismatch::UnknownField,
            } => write!(f, "`{owner}` has no wireable field `{field}`"),
            Self::InvalidFieldTarget {
                owner,
                field,
                reason: TargetMismatch::SlotType { slot, declared },
            } => write!(
                f,
                "field `{field}` on `{owner}` holds `{slot}` but is declared as `{declared}`"
            ),
            Self::InvalidFieldName(name) => {
                write!(f, "field name must be an identifier, got `{name}`")
            }
            Self::DuplicateField { owner, field } => {
                write!(f, "field `{field}` on `{owner}` is already declared")
            }
            Self::Construction(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WireError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Construction(err) => Some(&**err),
            _ => None,
        }
    }
}

/// Wires one field of `owner` with a fresh instance of its declared type.
///
/// Borrowing `owner` mutably rules out concurrent wiring of the same owner;
/// callers that share an owner across threads must serialize access
/// themselves, and the last completed call wins.
///
/// # Errors
/// - `MissingTypeMetadata` when `reflector` declares no type for `field`.
/// - `InvalidFieldTarget` when `owner` has no slot named `field`, or the slot
///   holds another type than the declared one.
/// - `Construction` with the constructor's own error when it fails.
pub fn wire_field<O, R>(reflector: &R, owner: &mut O, field: &str) -> WireResult<()>
where
    O: Owner,
    R: TypeReflector<O> + ?Sized,
{
    let owner_name = type_name::<O>();
    match wire_field_inner(reflector, owner, field, owner_name) {
        Ok(declared) => {
            debug!(
                "event=field_wire module=wire status=ok owner={} field={} type={}",
                owner_name, field, declared
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=field_wire module=wire status=error owner={} field={} error_code={} error={}",
                owner_name,
                field,
                err.code(),
                err
            );
            Err(err)
        }
    }
}

fn wire_field_inner<O, R>(
    reflector: &R,
    owner: &mut O,
    field: &str,
    owner_name: &'static str,
) -> WireResult<&'static str>
where
    O: Owner,
    R: TypeReflector<O> + ?Sized,
{
    let declared = reflector
        .declared_type(owner, field)
        .ok_or_else(|| WireError::MissingTypeMetadata {
            owner: owner_name,
            field: field.to_string(),
        })?;

    let invalid_target = |reason| WireError::InvalidFieldTarget {
        owner: owner_name,
        field: field.to_string(),
        reason,
    };

    match owner.field_mut(field) {
        None => return Err(invalid_target(TargetMismatch::UnknownField)),
        Some(slot) if slot.element_type() != declared.type_id() => {
            return Err(invalid_target(TargetMismatch::SlotType {
                slot: slot.element_type_name(),
                declared: declared.type_name(),
            }));
        }
        Some(_) => {}
    }

    let instance = declared
        .construct(owner.transaction())
        .map_err(WireError::Construction)?;

    let slot = owner
        .field_mut(field)
        .ok_or_else(|| invalid_target(TargetMismatch::UnknownField))?;
    let slot_name = slot.element_type_name();
    slot.assign(instance).map_err(|_| {
        invalid_target(TargetMismatch::SlotType {
            slot: slot_name,
            declared: declared.type_name(),
        })
    })?;

    Ok(declared.type_name())
}

#[cfg(test)]
mod tests {
    use super::{wire_field, TargetMismatch, WireError};
    use crate::wire::reflector::{DeclaredType, FromTransaction};
    use crate::wire::slot::{FieldSlot, Owner, Wired};
    use std::cell::Cell;
    use std::convert::Infallible;

    thread_local! {
        static CONSTRUCTED: Cell<usize> = const { Cell::new(0) };
    }

    struct Counted;

    impl FromTransaction<()> for Counted {
        type Error = Infallible;

        fn from_transaction(_tx: Option<()>) -> Result<Self, Self::Error> {
            CONSTRUCTED.with(|count| count.set(count.get() + 1));
            Ok(Self)
        }
    }

    #[derive(Default)]
    struct Holder {
        counted: Wired<Counted>,
        label: Wired<String>,
    }

    impl Owner for Holder {
        type Tx = ();

        fn field_mut(&mut self, name: &str) -> Option<&mut dyn FieldSlot> {
            match name {
                "counted" => Some(&mut self.counted),
                "label" => Some(&mut self.label),
                _ => None,
            }
        }
    }

    fn declare_counted(_: &Holder, _: &str) -> Option<DeclaredType<()>> {
        Some(DeclaredType::of::<Counted>())
    }

    #[test]
    fn unknown_field_is_rejected_before_construction() {
        let mut holder = Holder::default();
        let before = CONSTRUCTED.with(Cell::get);

        let err = wire_field(&declare_counted, &mut holder, "missing").unwrap_err();

        assert!(matches!(
            err,
            WireError::InvalidFieldTarget {
                reason: TargetMismatch::UnknownField,
                ..
            }
        ));
        assert_eq!(err.code(), "invalid_field_target");
        assert_eq!(CONSTRUCTED.with(Cell::get), before);
    }

    #[test]
    fn slot_type_mismatch_is_rejected_before_construction() {
        let mut holder = Holder::default();
        let before = CONSTRUCTED.with(Cell::get);

        let err = wire_field(&declare_counted, &mut holder, "label").unwrap_err();

        match err {
            WireError::InvalidFieldTarget {
                reason: TargetMismatch::SlotType { slot, declared },
                ..
            } => {
                assert!(slot.contains("String"));
                assert!(declared.ends_with("Counted"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!holder.label.is_wired());
        assert_eq!(CONSTRUCTED.with(Cell::get), before);
    }

    #[test]
    fn wiring_constructs_exactly_once_per_call() {
        let mut holder = Holder::default();
        let before = CONSTRUCTED.with(Cell::get);

        wire_field(&declare_counted, &mut holder, "counted").unwrap();
        assert_eq!(CONSTRUCTED.with(Cell::get), before + 1);
        wire_field(&declare_counted, &mut holder, "counted").unwrap();
        assert_eq!(CONSTRUCTED.with(Cell::get), before + 2);
        assert!(holder.counted.is_wired());
    }
}
