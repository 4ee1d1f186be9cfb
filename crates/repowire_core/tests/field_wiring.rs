use repowire_core::wire::TargetMismatch;
use repowire_core::{
    wire_field, DeclaredType, FieldRegistry, FieldSlot, FromTransaction, Owner, WireError, Wired,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Ctx(&'static str);

/// Records every argument its constructor received.
#[derive(Debug)]
struct RecordingRepo {
    received: Vec<Option<Ctx>>,
    serial: u64,
}

impl FromTransaction<Ctx> for RecordingRepo {
    type Error = std::convert::Infallible;

    fn from_transaction(tx: Option<Ctx>) -> Result<Self, Self::Error> {
        Ok(Self {
            received: vec![tx],
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Refused(&'static str);

impl Display for Refused {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "refused: {}", self.0)
    }
}

impl Error for Refused {}

#[derive(Debug)]
struct FailingRepo;

impl FromTransaction<Ctx> for FailingRepo {
    type Error = Refused;

    fn from_transaction(_tx: Option<Ctx>) -> Result<Self, Self::Error> {
        Err(Refused("no backend"))
    }
}

/// Accepts any transaction except `Ctx("rejected")`.
#[derive(Debug)]
struct PickyRepo {
    tx: Option<Ctx>,
}

impl FromTransaction<Ctx> for PickyRepo {
    type Error = Refused;

    fn from_transaction(tx: Option<Ctx>) -> Result<Self, Self::Error> {
        match tx {
            Some(Ctx("rejected")) => Err(Refused("rejected transaction")),
            tx => Ok(Self { tx }),
        }
    }
}

#[derive(Default)]
struct Service {
    transaction: Option<Ctx>,
    repo: Wired<RecordingRepo>,
    broken: Wired<FailingRepo>,
    picky: Wired<PickyRepo>,
}

impl Owner for Service {
    type Tx = Ctx;

    fn transaction(&self) -> Option<Ctx> {
        self.transaction.clone()
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn FieldSlot> {
        match name {
            "repo" => Some(&mut self.repo),
            "broken" => Some(&mut self.broken),
            "picky" => Some(&mut self.picky),
            _ => None,
        }
    }
}

/// Owner relying on the default: no transaction property at all.
#[derive(Default)]
struct Bare {
    repo: Wired<RecordingRepo>,
}

impl Owner for Bare {
    type Tx = Ctx;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn FieldSlot> {
        (name == "repo").then_some(&mut self.repo as &mut dyn FieldSlot)
    }
}

fn registry() -> FieldRegistry<Service> {
    FieldRegistry::<Service>::new()
        .declare::<RecordingRepo>("repo")
        .and_then(|registry| registry.declare::<FailingRepo>("broken"))
        .unwrap()
}

#[test]
fn wired_field_holds_instance_of_declared_type() {
    let mut service = Service::default();
    assert!(!service.repo.is_wired());

    wire_field(&registry(), &mut service, "repo").unwrap();

    let repo = service.repo.get().expect("repo should be wired");
    assert_eq!(repo.received.len(), 1);
}

#[test]
fn owner_without_transaction_passes_explicit_none() {
    let mut bare = Bare::default();
    let reflector = |_: &Bare, _: &str| -> Option<DeclaredType<Ctx>> {
        Some(DeclaredType::of::<RecordingRepo>())
    };

    wire_field(&reflector, &mut bare, "repo").unwrap();

    assert_eq!(bare.repo.get().unwrap().received, vec![None]);
}

#[test]
fn owner_with_unset_transaction_passes_explicit_none() {
    let mut service = Service::default();

    wire_field(&registry(), &mut service, "repo").unwrap();

    assert_eq!(service.repo.get().unwrap().received, vec![None]);
}

#[test]
fn owner_transaction_is_passed_as_sole_argument() {
    let mut service = Service {
        transaction: Some(Ctx("tx-1")),
        ..Service::default()
    };

    wire_field(&registry(), &mut service, "repo").unwrap();

    assert_eq!(
        service.repo.get().unwrap().received,
        vec![Some(Ctx("tx-1"))]
    );
}

#[test]
fn rewiring_replaces_instance_with_a_fresh_one() {
    let registry = registry();
    let mut service = Service::default();

    wire_field(&registry, &mut service, "repo").unwrap();
    let first = service.repo.get().unwrap().serial;

    service.transaction = Some(Ctx("tx-2"));
    wire_field(&registry, &mut service, "repo").unwrap();
    let second = service.repo.get().unwrap();

    assert_ne!(second.serial, first);
    assert_eq!(second.received, vec![Some(Ctx("tx-2"))]);
}

#[test]
fn missing_type_metadata_leaves_field_unchanged() {
    let mut service = Service::default();
    wire_field(&registry(), &mut service, "repo").unwrap();
    let before = service.repo.get().unwrap().serial;

    let no_types = |_: &Service, _: &str| -> Option<DeclaredType<Ctx>> { None };
    let err = wire_field(&no_types, &mut service, "repo").unwrap_err();

    match &err {
        WireError::MissingTypeMetadata { field, .. } => assert_eq!(field, "repo"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.repo.get().unwrap().serial, before);
}

#[test]
fn undeclared_field_reports_missing_type_metadata() {
    let mut service = Service::default();
    let err = wire_field(&registry(), &mut service, "other").unwrap_err();
    assert!(matches!(err, WireError::MissingTypeMetadata { .. }));
}

#[test]
fn constructor_failure_propagates_original_error_and_leaves_field_unwired() {
    let mut service = Service::default();

    let err = wire_field(&registry(), &mut service, "broken").unwrap_err();

    let original = err
        .source()
        .and_then(|source| source.downcast_ref::<Refused>())
        .expect("original constructor error should be preserved");
    assert_eq!(original, &Refused("no backend"));
    assert_eq!(err.to_string(), "refused: no backend");
    assert!(!service.broken.is_wired());
}

#[test]
fn failed_rewire_keeps_the_previously_wired_instance() {
    let reflector = |_: &Service, _: &str| -> Option<DeclaredType<Ctx>> {
        Some(DeclaredType::of::<PickyRepo>())
    };
    let mut service = Service {
        transaction: Some(Ctx("tx-5")),
        ..Service::default()
    };
    wire_field(&reflector, &mut service, "picky").unwrap();

    service.transaction = Some(Ctx("rejected"));
    let err = wire_field(&reflector, &mut service, "picky").unwrap_err();

    assert!(matches!(err, WireError::Construction(_)));
    assert_eq!(err.to_string(), "refused: rejected transaction");
    assert_eq!(service.picky.get().unwrap().tx, Some(Ctx("tx-5")));
}

#[test]
fn unknown_field_is_an_invalid_target() {
    let mut service = Service::default();
    let reflector = |_: &Service, _: &str| -> Option<DeclaredType<Ctx>> {
        Some(DeclaredType::of::<RecordingRepo>())
    };

    let err = wire_field(&reflector, &mut service, "ghost").unwrap_err();

    assert!(matches!(
        err,
        WireError::InvalidFieldTarget {
            reason: TargetMismatch::UnknownField,
            ..
        }
    ));
}

#[test]
fn wire_all_wires_declared_fields_until_first_failure() {
    let mut service = Service {
        transaction: Some(Ctx("tx-3")),
        ..Service::default()
    };

    let err = registry().wire_all(&mut service).unwrap_err();

    assert!(matches!(err, WireError::Construction(_)));
    assert_eq!(
        service.repo.get().unwrap().received,
        vec![Some(Ctx("tx-3"))]
    );
    assert!(!service.broken.is_wired());
}
