//! A single registration and the algorithm that picks how to build it.

use crate::core::{Contract, Instance, ResolutionGuard};
use crate::describe::{Describer, Injectable};
use crate::error::ResolveError;
use crate::factory::{ConstructorFactory, Factory, InstanceFactory, Producer, ProducerFactory, Upcast};
use crate::lifespan::{Lifespan, Transient};
use crate::registry::ServiceRegistry;
use std::any::{type_name, Any};
use std::cmp::Reverse;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// A registration: a contract, how to build it, under which name, and how
/// long a built instance is reused.
///
/// A service resolves its dependencies against the registry it was created
/// for, even when it is reached through a child container.
pub struct Service {
  contract: Contract,
  implementation: Option<&'static str>,
  name: Option<String>,
  lifespan: Box<dyn Lifespan>,
  // Sorted by descending dependency complexity, declaration order on ties.
  factories: Vec<Box<dyn Factory>>,
  registry: Weak<ServiceRegistry>,
}

impl Service {
  /// A service building `T` through its described constructors and handing
  /// it out as contract `C`.
  pub(crate) fn for_type<C, T>(
    registry: Weak<ServiceRegistry>,
    name: Option<String>,
    lifespan: Box<dyn Lifespan>,
    upcast: Upcast<T, C>,
  ) -> Self
  where
    C: ?Sized + Any + Send + Sync,
    T: Injectable,
  {
    let (constructors, properties) = Describer::<T>::describe().into_parts();
    let mut factories: Vec<Box<dyn Factory>> = constructors
      .into_iter()
      .map(|constructor| {
        Box::new(ConstructorFactory::new(constructor, &properties, upcast.clone())) as Box<dyn Factory>
      })
      .collect();
    // Stable, so equal-arity constructors keep their declaration order.
    factories.sort_by_key(|factory| Reverse(factory.dependency_complexity()));

    Self {
      contract: Contract::of::<C>(),
      implementation: Some(type_name::<T>()),
      name,
      lifespan,
      factories,
      registry,
    }
  }

  pub(crate) fn for_producer<C: ?Sized + Any + Send + Sync>(
    registry: Weak<ServiceRegistry>,
    name: Option<String>,
    lifespan: Box<dyn Lifespan>,
    producer: Producer<C>,
  ) -> Self {
    Self {
      contract: Contract::of::<C>(),
      implementation: None,
      name,
      lifespan,
      factories: vec![Box::new(ProducerFactory::new(producer))],
      registry,
    }
  }

  /// Instances are never rebuilt, so the lifespan is always transient.
  pub(crate) fn for_instance<C: ?Sized + Any + Send + Sync>(
    registry: Weak<ServiceRegistry>,
    name: Option<String>,
    instance: Arc<C>,
  ) -> Self {
    Self {
      contract: Contract::of::<C>(),
      implementation: None,
      name,
      lifespan: Box::new(Transient),
      factories: vec![Box::new(InstanceFactory::new(Instance::new(instance)))],
      registry,
    }
  }

  /// The contract this service was registered for.
  pub fn contract(&self) -> Contract {
    self.contract
  }

  /// The implementation type name, or `None` for instance and producer
  /// services.
  pub fn implementation(&self) -> Option<&'static str> {
    self.implementation
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn lifespan(&self) -> &dyn Lifespan {
    self.lifespan.as_ref()
  }

  /// The candidate factories, most complex first.
  pub fn factories(&self) -> &[Box<dyn Factory>] {
    &self.factories
  }

  /// Returns the live instance held by the lifespan, or builds a new one.
  ///
  /// Building fulfills what it can of every factory that is not yet
  /// creatable, then uses the first creatable factory in complexity order:
  /// the most specific constructor whose dependencies can all be satisfied.
  pub fn resolve(&self) -> Result<Instance, ResolveError> {
    if let Some(instance) = self.lifespan.instance() {
      self.lifespan.refresh();
      trace!(contract = %self.contract, "reusing held instance");
      return Ok(instance);
    }

    let _guard = ResolutionGuard::enter(self as *const Self as usize, self.contract)?;

    if self.factories.iter().any(|factory| !factory.can_create()) {
      let registry = self.registry.upgrade().ok_or(ResolveError::ScopeDropped {
        contract: self.contract.name(),
      })?;
      for factory in self.factories.iter().filter(|factory| !factory.can_create()) {
        factory.fulfill(&registry)?;
      }
    }

    let factory = self
      .factories
      .iter()
      .find(|factory| factory.can_create())
      .ok_or_else(|| ResolveError::NoViableFactory {
        contract: self.contract.name(),
        implementation: self.implementation,
        name: self.name.clone(),
      })?;
    debug!(
      contract = %self.contract,
      implementation = self.implementation.unwrap_or("<none>"),
      complexity = factory.dependency_complexity(),
      "building service"
    );

    let instance = factory.create()?;
    self.lifespan.hold(instance.clone());
    Ok(instance)
  }
}

impl fmt::Debug for Service {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let complexities: Vec<usize> = self
      .factories
      .iter()
      .map(|factory| factory.dependency_complexity())
      .collect();
    f.debug_struct("Service")
      .field("contract", &self.contract)
      .field("implementation", &self.implementation)
      .field("name", &self.name)
      .field("factories", &complexities)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lifespan::ContainerScoped;
  use pretty_assertions::assert_eq;

  struct Primary;
  struct Secondary;

  struct Picky {
    picked: &'static str,
  }

  impl Injectable for Picky {
    fn describe(d: &mut Describer<Self>) {
      d.constructor(|()| Picky { picked: "none" })
        .constructor(|(_p,): (Arc<Primary>,)| Picky { picked: "primary" })
        .constructor(|(_p, _s): (Arc<Primary>, Arc<Secondary>)| Picky { picked: "both" })
        .constructor(|(_s,): (Arc<Secondary>,)| Picky { picked: "secondary" });
    }
  }

  fn picky(registry: &Arc<ServiceRegistry>, lifespan: Box<dyn Lifespan>) -> Service {
    Service::for_type::<Picky, Picky>(
      Arc::downgrade(registry),
      None,
      lifespan,
      Arc::new(|picky: Arc<Picky>| picky),
    )
  }

  fn add_instance<C: Any + Send + Sync>(registry: &Arc<ServiceRegistry>, value: C) {
    registry.add(Arc::new(Service::for_instance(
      Arc::downgrade(registry),
      None,
      Arc::new(value),
    )));
  }

  fn picked(service: &Service) -> &'static str {
    service.resolve().unwrap().downcast::<Picky>().unwrap().picked
  }

  #[test]
  fn factories_are_sorted_by_descending_complexity() {
    let registry = ServiceRegistry::root();
    let service = picky(&registry, Box::new(Transient));

    let complexities: Vec<usize> = service
      .factories()
      .iter()
      .map(|factory| factory.dependency_complexity())
      .collect();
    assert_eq!(complexities, vec![2, 1, 1, 0]);
  }

  #[test]
  fn falls_back_to_default_constructor() {
    let registry = ServiceRegistry::root();
    assert_eq!(picked(&picky(&registry, Box::new(Transient))), "none");
  }

  #[test]
  fn equal_complexity_keeps_declaration_order() {
    struct Tied {
      picked: &'static str,
    }
    impl Injectable for Tied {
      fn describe(d: &mut Describer<Self>) {
        d.constructor(|(_s,): (Arc<Secondary>,)| Tied { picked: "secondary" })
          .constructor(|(_p,): (Arc<Primary>,)| Tied { picked: "primary" });
      }
    }
    let registry = ServiceRegistry::root();
    add_instance(&registry, Primary);
    add_instance(&registry, Secondary);
    let service = Service::for_type::<Tied, Tied>(
      Arc::downgrade(&registry),
      None,
      Box::new(Transient),
      Arc::new(|tied: Arc<Tied>| tied),
    );

    let tied = service.resolve().unwrap().downcast::<Tied>().unwrap();
    assert_eq!(tied.picked, "secondary");
  }

  #[test]
  fn most_specific_satisfiable_constructor_wins() {
    let registry = ServiceRegistry::root();
    add_instance(&registry, Secondary);
    let service = picky(&registry, Box::new(Transient));
    assert_eq!(picked(&service), "secondary");

    add_instance(&registry, Primary);
    assert_eq!(picked(&service), "both");
  }

  #[test]
  fn held_instance_skips_rebuilding() {
    let registry = ServiceRegistry::root();
    let service = picky(&registry, Box::new(ContainerScoped::new()));
    let first = service.resolve().unwrap();

    add_instance(&registry, Primary);

    let second = service.resolve().unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(second.downcast::<Picky>().unwrap().picked, "none");
  }

  #[test]
  fn unsatisfiable_service_reports_its_identity() {
    struct Needy;
    impl Injectable for Needy {
      fn describe(d: &mut Describer<Self>) {
        d.constructor(|(_p,): (Arc<Primary>,)| Needy);
      }
    }
    let registry = ServiceRegistry::root();
    let service = Service::for_type::<Needy, Needy>(
      Arc::downgrade(&registry),
      Some("needy".to_owned()),
      Box::new(Transient),
      Arc::new(|needy: Arc<Needy>| needy),
    );

    let error = service.resolve().unwrap_err();

    assert_eq!(
      error,
      ResolveError::NoViableFactory {
        contract: type_name::<Needy>(),
        implementation: Some(type_name::<Needy>()),
        name: Some("needy".to_owned()),
      }
    );
  }

  #[test]
  fn dropped_registry_is_reported() {
    struct Needy;
    impl Injectable for Needy {
      fn describe(d: &mut Describer<Self>) {
        d.constructor(|(_p,): (Arc<Primary>,)| Needy);
      }
    }
    let registry = ServiceRegistry::root();
    let service = Service::for_type::<Needy, Needy>(
      Arc::downgrade(&registry),
      None,
      Box::new(Transient),
      Arc::new(|needy: Arc<Needy>| needy),
    );
    drop(registry);

    assert!(matches!(service.resolve(), Err(ResolveError::ScopeDropped { .. })));
  }
}
