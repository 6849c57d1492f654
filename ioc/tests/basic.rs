use pretty_assertions::assert_eq;
use std::sync::Arc;
use trellis_ioc::{
  register, ConflictReason, Container, ContainerError, Describer, Injectable, ResolveError, ServiceOptions,
};

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync + std::fmt::Debug {
  fn greet(&self) -> String;
}

#[derive(Debug, Default)]
struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}
impl Injectable for EnglishGreeter {
  fn describe(d: &mut Describer<Self>) {
    d.default_constructor();
  }
}

#[derive(Debug, Default)]
struct FrenchGreeter;
impl Greeter for FrenchGreeter {
  fn greet(&self) -> String {
    "Bonjour!".to_string()
  }
}
impl Injectable for FrenchGreeter {
  fn describe(d: &mut Describer<Self>) {
    d.default_constructor();
  }
}

// A simple struct for testing.
#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

impl Injectable for SimpleService {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|()| SimpleService { id: 101 });
  }
}

fn conflict_reason(error: ContainerError) -> ConflictReason {
  match error {
    ContainerError::RegistrationConflict { reason, .. } => reason,
    other => panic!("expected a registration conflict, got {other:?}"),
  }
}

// --- Registration ---

#[test]
fn test_resolve_after_register_returns_implementation() {
  // Arrange
  let container = Container::new();
  register!(container, dyn Greeter => EnglishGreeter).unwrap();

  // Act
  let greeter = container.resolve::<dyn Greeter>().unwrap();

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
}

#[test]
fn test_register_self_resolves_concrete_type() {
  let container = Container::new();
  container.register_self::<SimpleService>().unwrap();

  let service = container.resolve::<SimpleService>().unwrap();

  assert_eq!(*service, SimpleService { id: 101 });
}

#[test]
fn test_register_with_explicit_upcast() {
  let container = Container::new();
  container
    .register::<dyn Greeter, FrenchGreeter>(|greeter: Arc<FrenchGreeter>| -> Arc<dyn Greeter> { greeter })
    .unwrap();

  assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "Bonjour!");
}

#[test]
fn test_duplicate_unnamed_registration_conflicts() {
  let container = Container::new();
  register!(container, dyn Greeter => EnglishGreeter).unwrap();

  let error = register!(container, dyn Greeter => FrenchGreeter).unwrap_err();

  assert_eq!(conflict_reason(error), ConflictReason::DuplicateUnnamed);
  // The registry is left unchanged.
  assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "Hello!");
}

#[test]
fn test_rejected_registration_leaves_implementation_unconstructible() {
  let container = Container::new();
  register!(container, dyn Greeter => EnglishGreeter).unwrap();

  assert!(register!(container, dyn Greeter => FrenchGreeter).is_err());

  assert!(container.try_resolve::<FrenchGreeter>().is_none());
  assert!(!container.can_resolve::<FrenchGreeter>());
  // The accepted implementation is known.
  assert!(container.try_resolve::<EnglishGreeter>().is_some());
}

#[test]
fn test_distinct_names_never_conflict() {
  let container = Container::new();
  register!(container, dyn Greeter => EnglishGreeter, ServiceOptions::named("en")).unwrap();
  register!(container, dyn Greeter => FrenchGreeter, ServiceOptions::named("fr")).unwrap();

  assert_eq!(container.resolve_named::<dyn Greeter>("en").unwrap().greet(), "Hello!");
  assert_eq!(container.resolve_named::<dyn Greeter>("fr").unwrap().greet(), "Bonjour!");
}

#[test]
fn test_duplicate_name_conflicts() {
  let container = Container::new();
  register!(container, dyn Greeter => EnglishGreeter, ServiceOptions::named("default")).unwrap();

  let error = register!(container, dyn Greeter => FrenchGreeter, ServiceOptions::named("default")).unwrap_err();

  assert_eq!(conflict_reason(error), ConflictReason::DuplicateName);
}

#[test]
fn test_named_and_unnamed_registrations_do_not_mix() {
  let container = Container::new();
  register!(container, dyn Greeter => EnglishGreeter).unwrap();
  let error = register!(container, dyn Greeter => FrenchGreeter, ServiceOptions::named("fr")).unwrap_err();
  assert_eq!(conflict_reason(error), ConflictReason::UnnamedExists);

  let other = Container::new();
  register!(other, dyn Greeter => FrenchGreeter, ServiceOptions::named("fr")).unwrap();
  let error = register!(other, dyn Greeter => EnglishGreeter).unwrap_err();
  assert_eq!(conflict_reason(error), ConflictReason::NamedExists);
}

#[test]
fn test_blank_names_are_invalid_arguments() {
  let container = Container::new();

  let error = register!(container, dyn Greeter => EnglishGreeter, ServiceOptions::named("  ")).unwrap_err();
  assert!(matches!(error, ContainerError::InvalidArgument { argument: "name", .. }));

  let error = container
    .register_instance_with_name("", Arc::new(SimpleService { id: 1 }))
    .unwrap_err();
  assert!(matches!(error, ContainerError::InvalidArgument { .. }));

  let error = container.resolve_named::<dyn Greeter>("\t").unwrap_err();
  assert!(matches!(error, ContainerError::InvalidArgument { .. }));
}

// --- Instances and Producers ---

#[test]
fn test_registered_instance_is_returned_every_time() {
  let container = Container::new();
  container.register_instance(Arc::new(SimpleService { id: 202 })).unwrap();

  let r1 = container.resolve::<SimpleService>().unwrap();
  let r2 = container.resolve::<SimpleService>().unwrap();

  assert_eq!(r1.id, 202);
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_instance_is_shared_without_a_lifespan() {
  let container = Container::new();
  let instance = Arc::new(SimpleService { id: 303 });
  container.register_instance_with_name("shared", instance.clone()).unwrap();
  let child = container.create_child();

  let from_parent = container.resolve_named::<SimpleService>("shared").unwrap();
  let from_child = child.resolve_named::<SimpleService>("shared").unwrap();

  assert!(Arc::ptr_eq(&from_parent, &instance));
  assert!(Arc::ptr_eq(&from_child, &instance));
}

#[test]
fn test_named_instance_for_trait_contract() {
  let container = Container::new();
  let greeter: Arc<dyn Greeter> = Arc::new(FrenchGreeter);
  container.register_instance_with_name("fr", greeter.clone()).unwrap();

  let resolved = container.resolve_named::<dyn Greeter>("fr").unwrap();

  assert!(Arc::ptr_eq(&resolved, &greeter));
}

#[test]
fn test_producer_runs_on_every_transient_resolution() {
  let container = Container::new();
  container
    .register_producer(|| Arc::new(String::from("produced")))
    .unwrap();

  let r1 = container.resolve::<String>().unwrap();
  let r2 = container.resolve::<String>().unwrap();

  assert_eq!(*r1, "produced");
  assert!(!Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_named_producer_with_lifespan() {
  let container = Container::new();
  container
    .register_producer_with(ServiceOptions::named("english").container_scoped(), || {
      Arc::new(EnglishGreeter) as Arc<dyn Greeter>
    })
    .unwrap();

  let r1 = container.resolve_named::<dyn Greeter>("english").unwrap();
  let r2 = container.resolve_named::<dyn Greeter>("english").unwrap();

  assert!(Arc::ptr_eq(&r1, &r2));
}

// --- Resolution Failures ---

#[test]
fn test_try_resolve_returns_none_for_unknown_contract() {
  let container = Container::new();

  assert!(container.try_resolve::<dyn Greeter>().is_none());
  assert!(container.try_resolve_named::<dyn Greeter>("missing").is_none());
}

#[test]
fn test_resolution_error_wraps_engine_error() {
  let container = Container::new();

  let error = container.resolve::<dyn Greeter>().unwrap_err();

  match &error {
    ContainerError::Resolution { contract, name, .. } => {
      assert!(contract.contains("Greeter"));
      assert_eq!(*name, None);
    }
    other => panic!("expected a resolution error, got {other:?}"),
  }
  assert!(matches!(
    error.resolve_error(),
    Some(ResolveError::NotConstructible { .. })
  ));
  assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_named_resolution_never_falls_back() {
  let container = Container::new();
  container.register_self::<SimpleService>().unwrap();

  let error = container.resolve_named::<SimpleService>("primary").unwrap_err();

  assert_eq!(
    error.resolve_error(),
    Some(&ResolveError::NotRegistered {
      contract: std::any::type_name::<SimpleService>(),
      name: "primary".to_string(),
    })
  );
}

#[test]
fn test_ambiguous_unnamed_resolution_fails() {
  // A parent registration made after the child's own makes the child's
  // unnamed lookup ambiguous.
  let parent = Container::new();
  let child = parent.create_child();
  register!(child, dyn Greeter => FrenchGreeter).unwrap();
  register!(parent, dyn Greeter => EnglishGreeter).unwrap();

  let error = child.resolve::<dyn Greeter>().unwrap_err();

  assert_eq!(
    error.resolve_error(),
    Some(&ResolveError::Ambiguous {
      contract: std::any::type_name::<dyn Greeter>(),
      count: 2,
    })
  );
  assert_eq!(parent.resolve::<dyn Greeter>().unwrap().greet(), "Hello!");
}

#[test]
fn test_can_resolve_reports_registered_and_described_contracts() {
  let container = Container::new();
  assert!(!container.can_resolve::<dyn Greeter>());
  assert!(!container.can_resolve::<SimpleService>());

  register!(container, dyn Greeter => EnglishGreeter).unwrap();
  container.describe::<SimpleService>();

  assert!(container.can_resolve::<dyn Greeter>());
  assert!(container.can_resolve::<SimpleService>());
}
