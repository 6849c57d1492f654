//! The contract listing: every service of a container, indexed by contract
//! and by contract plus name, with lookups falling back to a parent.

use crate::core::{validate_name, Contract};
use crate::error::ContainerError;
use crate::service::Service;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// An indexed collection of services forming a tree of scopes.
///
/// A child registry starts out empty and never modifies its parent. Lookups
/// walk the live parent chain every time, so services added to a parent after
/// the child was created are still visible through the child.
#[derive(Default)]
pub struct ServiceRegistry {
  parent: Option<Arc<ServiceRegistry>>,
  by_contract: DashMap<Contract, Vec<Arc<Service>>>,
  by_name: DashMap<(Contract, String), Arc<Service>>,
}

impl ServiceRegistry {
  /// Creates a new registry without a parent.
  pub fn root() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Creates an empty registry whose lookups fall back to this one.
  pub fn create_child(self: &Arc<Self>) -> Arc<Self> {
    Arc::new(Self {
      parent: Some(Arc::clone(self)),
      ..Self::default()
    })
  }

  pub fn parent(&self) -> Option<&Arc<ServiceRegistry>> {
    self.parent.as_ref()
  }

  /// Adds `service` to this registry.
  ///
  /// A named service is also indexed by contract and name; when that key is
  /// already taken the first service keeps it. Conflicting registrations are
  /// rejected by the container, not here.
  pub fn add(&self, service: Arc<Service>) {
    let contract = service.contract();
    if let Some(name) = service.name() {
      self
        .by_name
        .entry((contract, name.to_owned()))
        .or_insert_with(|| Arc::clone(&service));
    }
    self.by_contract.entry(contract).or_default().push(service);
  }

  /// Every service for `contract`, ancestors' services first.
  pub fn services(&self, contract: Contract) -> Vec<Arc<Service>> {
    let mut services = match &self.parent {
      Some(parent) => parent.services(contract),
      None => Vec::new(),
    };
    if let Some(local) = self.by_contract.get(&contract) {
      services.extend(local.value().iter().cloned());
    }
    services
  }

  /// The service registered for `contract` under `name`, searching this
  /// registry before its ancestors.
  pub fn service(&self, contract: Contract, name: &str) -> Result<Option<Arc<Service>>, ContainerError> {
    validate_name(name)?;
    Ok(self.find_named(contract, name))
  }

  fn find_named(&self, contract: Contract, name: &str) -> Option<Arc<Service>> {
    let local = self
      .by_name
      .get(&(contract, name.to_owned()))
      .map(|entry| Arc::clone(entry.value()));
    local.or_else(|| {
      self
        .parent
        .as_ref()
        .and_then(|parent| parent.find_named(contract, name))
    })
  }

  /// The unnamed service for `contract`, provided exactly one is visible.
  pub fn unnamed_service(&self, contract: Contract) -> Option<Arc<Service>> {
    let mut unnamed = self
      .services(contract)
      .into_iter()
      .filter(|service| service.name().is_none());
    match (unnamed.next(), unnamed.next()) {
      (Some(service), None) => Some(service),
      _ => None,
    }
  }

  /// Whether any service for `contract` is visible from this registry.
  pub fn contains(&self, contract: Contract) -> bool {
    self.by_contract.contains_key(&contract)
      || self
        .parent
        .as_ref()
        .is_some_and(|parent| parent.contains(contract))
  }
}

impl fmt::Debug for ServiceRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceRegistry")
      .field("contracts", &self.by_contract.len())
      .field("named", &self.by_name.len())
      .field("has_parent", &self.parent.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lifespan::Transient;
  use pretty_assertions::assert_eq;

  trait Codec: Send + Sync {
    fn id(&self) -> &'static str;
  }
  struct Json;
  impl Codec for Json {
    fn id(&self) -> &'static str {
      "json"
    }
  }

  fn codec(registry: &Arc<ServiceRegistry>, name: Option<&str>, id: &'static str) -> Arc<Service> {
    struct Tagged(&'static str);
    impl Codec for Tagged {
      fn id(&self) -> &'static str {
        self.0
      }
    }
    Arc::new(Service::for_producer::<dyn Codec>(
      Arc::downgrade(registry),
      name.map(str::to_owned),
      Box::new(Transient),
      Arc::new(move || Arc::new(Tagged(id)) as Arc<dyn Codec>),
    ))
  }

  fn ids(services: &[Arc<Service>]) -> Vec<&'static str> {
    services
      .iter()
      .map(|service| service.resolve().unwrap().downcast::<dyn Codec>().unwrap().id())
      .collect()
  }

  #[test]
  fn unknown_contract_yields_no_services() {
    let registry = ServiceRegistry::root();
    assert!(registry.services(Contract::of::<dyn Codec>()).is_empty());
    assert!(!registry.contains(Contract::of::<dyn Codec>()));
  }

  #[test]
  fn services_are_listed_per_contract() {
    let registry = ServiceRegistry::root();
    registry.add(codec(&registry, None, "a"));
    registry.add(Arc::new(Service::for_instance(
      Arc::downgrade(&registry),
      None,
      Arc::new(7u8),
    )));

    assert_eq!(ids(&registry.services(Contract::of::<dyn Codec>())), vec!["a"]);
    assert_eq!(registry.services(Contract::of::<u8>()).len(), 1);
  }

  #[test]
  fn first_named_registration_keeps_the_name() {
    let registry = ServiceRegistry::root();
    registry.add(codec(&registry, Some("fast"), "first"));
    registry.add(codec(&registry, Some("fast"), "second"));

    let service = registry.service(Contract::of::<dyn Codec>(), "fast").unwrap().unwrap();
    assert_eq!(ids(&[service]), vec!["first"]);
    assert_eq!(registry.services(Contract::of::<dyn Codec>()).len(), 2);
  }

  #[test]
  fn named_lookup_rejects_blank_names() {
    let registry = ServiceRegistry::root();
    assert!(matches!(
      registry.service(Contract::of::<dyn Codec>(), ""),
      Err(ContainerError::InvalidArgument { .. })
    ));
  }

  #[test]
  fn child_lists_parent_services_first() {
    let parent = ServiceRegistry::root();
    parent.add(codec(&parent, Some("p"), "parent"));
    let child = parent.create_child();
    child.add(codec(&child, Some("c"), "child"));

    assert_eq!(
      ids(&child.services(Contract::of::<dyn Codec>())),
      vec!["parent", "child"]
    );
    assert_eq!(ids(&parent.services(Contract::of::<dyn Codec>())), vec!["parent"]);
  }

  #[test]
  fn child_sees_later_parent_registrations() {
    let parent = ServiceRegistry::root();
    let child = parent.create_child();
    parent.add(codec(&parent, Some("late"), "late"));

    assert!(child.contains(Contract::of::<dyn Codec>()));
    let service = child.service(Contract::of::<dyn Codec>(), "late").unwrap();
    assert_eq!(ids(&[service.unwrap()]), vec!["late"]);
  }

  #[test]
  fn child_names_shadow_parent_names() {
    let parent = ServiceRegistry::root();
    parent.add(codec(&parent, Some("x"), "parent"));
    let child = parent.create_child();
    child.add(codec(&child, Some("x"), "child"));

    let service = child.service(Contract::of::<dyn Codec>(), "x").unwrap().unwrap();
    assert_eq!(ids(&[service]), vec!["child"]);
    assert!(parent.create_child().parent().is_some());
  }

  #[test]
  fn unnamed_service_requires_exactly_one() {
    let parent = ServiceRegistry::root();
    let child = parent.create_child();
    assert!(child.unnamed_service(Contract::of::<dyn Codec>()).is_none());

    child.add(codec(&child, None, "child"));
    child.add(codec(&child, Some("named"), "named"));
    assert_eq!(
      ids(&[child.unnamed_service(Contract::of::<dyn Codec>()).unwrap()]),
      vec!["child"]
    );

    parent.add(Arc::new(Service::for_instance::<dyn Codec>(
      Arc::downgrade(&parent),
      None,
      Arc::new(Json),
    )));
    assert!(child.unnamed_service(Contract::of::<dyn Codec>()).is_none());
  }
}
