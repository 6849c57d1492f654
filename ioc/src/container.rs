//! The main `Container` struct and its associated methods.

use crate::core::{validate_name, Contract, Instance};
use crate::describe::{Catalog, Injectable};
use crate::error::{ConflictReason, ContainerError, ResolveError, Result};
use crate::factory::Upcast;
use crate::lifespan::Transient;
use crate::options::ServiceOptions;
use crate::registry::ServiceRegistry;
use crate::service::Service;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The Inversion of Control (IoC) container.
///
/// A container maps contracts to services and builds fully wired instances on
/// request. It is a cheap handle: clones share the same registrations.
/// [`Container::create_child`] opens a nested scope whose registrations stay
/// invisible to this container while it still sees everything registered here.
#[derive(Clone, Default)]
pub struct Container {
  registry: Arc<ServiceRegistry>,
  catalog: Arc<Catalog>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a child container.
  ///
  /// The child resolves everything this container can, including services
  /// registered here after the child was created. Registrations made on the
  /// child are never visible here.
  pub fn create_child(&self) -> Container {
    debug!("creating child container");
    Container {
      registry: self.registry.create_child(),
      catalog: self.catalog.create_child(),
    }
  }

  /// The registry backing this container.
  pub fn registry(&self) -> &ServiceRegistry {
    &self.registry
  }

  // --- PRIVATE HELPERS ---

  fn add_service(&self, service: Service) -> Result<()> {
    let contract = service.contract();
    let existing = self.registry.services(contract);
    let conflict = match service.name() {
      None if existing.iter().any(|s| s.name().is_none()) => Some(ConflictReason::DuplicateUnnamed),
      None if !existing.is_empty() => Some(ConflictReason::NamedExists),
      Some(_) if existing.iter().any(|s| s.name().is_none()) => Some(ConflictReason::UnnamedExists),
      Some(name) if existing.iter().any(|s| s.name() == Some(name)) => Some(ConflictReason::DuplicateName),
      _ => None,
    };

    if let Some(reason) = conflict {
      return Err(ContainerError::RegistrationConflict {
        contract: contract.name(),
        name: service.name().map(str::to_owned),
        reason,
      });
    }

    debug!(
      contract = %contract,
      implementation = service.implementation().unwrap_or("<none>"),
      name = service.name().unwrap_or(""),
      "registering service"
    );
    self.registry.add(Arc::new(service));
    Ok(())
  }

  fn register_internal<C, T>(&self, options: ServiceOptions, upcast: Upcast<T, C>) -> Result<()>
  where
    C: ?Sized + Any + Send + Sync,
    T: Injectable,
  {
    let (name, lifespan) = options.into_parts();
    if let Some(name) = &name {
      validate_name(name)?;
    }
    self.add_service(Service::for_type::<C, T>(
      Arc::downgrade(&self.registry),
      name,
      lifespan,
      upcast,
    ))?;
    self.catalog.learn::<T>();
    Ok(())
  }

  fn register_instance_internal<C: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    instance: Arc<C>,
  ) -> Result<()> {
    if let Some(name) = name {
      validate_name(name)?;
    }
    self.add_service(Service::for_instance(
      Arc::downgrade(&self.registry),
      name.map(str::to_owned),
      instance,
    ))
  }

  fn resolve_with(&self, service: &Service) -> Result<Instance> {
    service.resolve().map_err(|source| {
      warn!(contract = %service.contract(), error = %source, "resolution failed");
      ContainerError::Resolution {
        contract: service.contract().name(),
        implementation: service.implementation(),
        name: service.name().map(str::to_owned),
        source,
      }
    })
  }

  fn resolve_unnamed(&self, contract: Contract) -> Result<Instance> {
    let candidates: Vec<Arc<Service>> = self
      .registry
      .services(contract)
      .into_iter()
      .filter(|service| service.name().is_none())
      .collect();

    match candidates.as_slice() {
      [service] => self.resolve_with(service),
      [] => self.resolve_unregistered(contract),
      _ => Err(resolution_error(
        contract,
        None,
        ResolveError::Ambiguous {
          contract: contract.name(),
          count: candidates.len(),
        },
      )),
    }
  }

  fn resolve_unregistered(&self, contract: Contract) -> Result<Instance> {
    match self.catalog.make(contract, Arc::downgrade(&self.registry)) {
      Some(service) => {
        debug!(contract = %contract, "building unregistered contract");
        self.resolve_with(&service)
      }
      None => Err(resolution_error(
        contract,
        None,
        ResolveError::NotConstructible {
          contract: contract.name(),
        },
      )),
    }
  }

  fn resolve_named_internal(&self, contract: Contract, name: &str) -> Result<Instance> {
    match self.registry.service(contract, name)? {
      Some(service) => self.resolve_with(&service),
      None => Err(resolution_error(
        contract,
        Some(name),
        ResolveError::NotRegistered {
          contract: contract.name(),
          name: name.to_owned(),
        },
      )),
    }
  }

  // --- PUBLIC API ---

  // --- Type Registration ---

  /// Registers implementation `T` under contract `C`.
  ///
  /// `upcast` turns the built `Arc<T>` into an `Arc<C>`; for trait contracts it
  /// is the plain coercion `|s| s as Arc<dyn Trait>`. The [`register!`](crate::register)
  /// macro writes it for you.
  pub fn register<C, T>(&self, upcast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static) -> Result<()>
  where
    C: ?Sized + Any + Send + Sync,
    T: Injectable,
  {
    self.register_internal::<C, T>(ServiceOptions::new(), Arc::new(upcast))
  }

  /// Registers implementation `T` under contract `C` with a name and/or lifespan.
  pub fn register_with<C, T>(
    &self,
    options: ServiceOptions,
    upcast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
  ) -> Result<()>
  where
    C: ?Sized + Any + Send + Sync,
    T: Injectable,
  {
    self.register_internal::<C, T>(options, Arc::new(upcast))
  }

  /// Registers `T` as its own contract.
  pub fn register_self<T: Injectable>(&self) -> Result<()> {
    self.register_self_with::<T>(ServiceOptions::new())
  }

  pub fn register_self_with<T: Injectable>(&self, options: ServiceOptions) -> Result<()> {
    self.register_internal::<T, T>(options, Arc::new(|service: Arc<T>| service))
  }

  // --- Instance Registration ---

  /// Registers a pre-built instance; every resolution returns this instance.
  ///
  /// Instance services take no lifespan: they always hand out the same value,
  /// so caching or scoping it would change nothing.
  pub fn register_instance<C: ?Sized + Any + Send + Sync>(&self, instance: Arc<C>) -> Result<()> {
    self.register_instance_internal(None, instance)
  }

  /// Registers a pre-built instance under `name`. Like
  /// [`Container::register_instance`], it takes no lifespan.
  pub fn register_instance_with_name<C: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
    instance: Arc<C>,
  ) -> Result<()> {
    self.register_instance_internal(Some(name), instance)
  }

  // --- Producer Registration ---

  /// Registers a function producing instances of contract `C`.
  pub fn register_producer<C: ?Sized + Any + Send + Sync>(
    &self,
    producer: impl Fn() -> Arc<C> + Send + Sync + 'static,
  ) -> Result<()> {
    self.register_producer_with(ServiceOptions::new(), producer)
  }

  pub fn register_producer_with<C: ?Sized + Any + Send + Sync>(
    &self,
    options: ServiceOptions,
    producer: impl Fn() -> Arc<C> + Send + Sync + 'static,
  ) -> Result<()> {
    let (name, lifespan) = options.into_parts();
    if let Some(name) = &name {
      validate_name(name)?;
    }
    self.add_service(Service::for_producer::<C>(
      Arc::downgrade(&self.registry),
      name,
      lifespan,
      Arc::new(producer),
    ))
  }

  // --- Construction ---

  /// Makes `T` constructible through [`Container::resolve`] without
  /// registering a service for it. Child containers inherit this, parents do not.
  pub fn describe<T: Injectable>(&self) -> &Self {
    self.catalog.learn::<T>();
    self
  }

  /// Builds `T` through its own constructors, ignoring any service registered
  /// for `T`. Its dependencies are resolved from this container.
  pub fn build<T: Injectable>(&self) -> Result<Arc<T>> {
    self.catalog.learn::<T>();
    let service = Service::for_type::<T, T>(
      Arc::downgrade(&self.registry),
      None,
      Box::new(Transient),
      Arc::new(|service: Arc<T>| service),
    );
    let instance = self.resolve_with(&service)?;
    downcast(instance, None)
  }

  // --- Resolution ---

  /// Resolves the unnamed service for contract `C`.
  ///
  /// With no unnamed registration, `C` itself is built if it is known to be
  /// constructible (see [`Container::describe`]). More than one unnamed
  /// registration is an error.
  pub fn resolve<C: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<C>> {
    let instance = self.resolve_unnamed(Contract::of::<C>())?;
    downcast(instance, None)
  }

  /// Resolves the service registered for contract `C` under `name`.
  pub fn resolve_named<C: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<C>> {
    let instance = self.resolve_named_internal(Contract::of::<C>(), name)?;
    downcast(instance, Some(name))
  }

  /// Like [`Container::resolve`], but returns `None` on any failure.
  pub fn try_resolve<C: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<C>> {
    self.resolve::<C>().map_err(|error| trace!(%error, "try_resolve failed")).ok()
  }

  /// Like [`Container::resolve_named`], but returns `None` on any failure.
  pub fn try_resolve_named<C: ?Sized + Any + Send + Sync>(&self, name: &str) -> Option<Arc<C>> {
    self
      .resolve_named::<C>(name)
      .map_err(|error| trace!(%error, "try_resolve_named failed"))
      .ok()
  }

  /// Builds every service registered for contract `C`, named or not,
  /// ancestors' services first.
  pub fn resolve_all<C: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<C>>> {
    self
      .resolve_all_contract(Contract::of::<C>())?
      .into_iter()
      .map(|instance| downcast::<C>(instance, None))
      .collect()
  }

  // --- Runtime Contract Resolution ---

  /// Resolves `contract` given as a runtime token, optionally by name.
  pub fn resolve_contract(&self, contract: Contract, name: Option<&str>) -> Result<Instance> {
    match name {
      Some(name) => self.resolve_named_internal(contract, name),
      None => self.resolve_unnamed(contract),
    }
  }

  pub fn try_resolve_contract(&self, contract: Contract, name: Option<&str>) -> Option<Instance> {
    self.resolve_contract(contract, name).ok()
  }

  pub fn resolve_all_contract(&self, contract: Contract) -> Result<Vec<Instance>> {
    self
      .registry
      .services(contract)
      .iter()
      .map(|service| self.resolve_with(service))
      .collect()
  }

  // --- Inspection ---

  /// The service an unnamed dependency on `C` would be fulfilled with.
  pub fn service<C: ?Sized + Any>(&self) -> Option<Arc<Service>> {
    self.registry.unnamed_service(Contract::of::<C>())
  }

  pub fn service_named<C: ?Sized + Any>(&self, name: &str) -> Result<Option<Arc<Service>>> {
    self.registry.service(Contract::of::<C>(), name)
  }

  /// Whether contract `C` has a registration or is known to be constructible.
  pub fn can_resolve<C: ?Sized + Any>(&self) -> bool {
    let contract = Contract::of::<C>();
    self.registry.contains(contract) || self.catalog.knows(contract)
  }
}

fn resolution_error(contract: Contract, name: Option<&str>, source: ResolveError) -> ContainerError {
  warn!(contract = %contract, error = %source, "resolution failed");
  ContainerError::Resolution {
    contract: contract.name(),
    implementation: None,
    name: name.map(str::to_owned),
    source,
  }
}

fn downcast<C: ?Sized + Any + Send + Sync>(instance: Instance, name: Option<&str>) -> Result<Arc<C>> {
  let found = instance.contract();
  instance.downcast::<C>().ok_or_else(|| {
    resolution_error(
      Contract::of::<C>(),
      name,
      ResolveError::TypeMismatch {
        expected: std::any::type_name::<C>(),
        found: found.name(),
      },
    )
  })
}
