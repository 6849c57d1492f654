//! Strategies that produce one instance of a service.

use crate::core::Instance;
use crate::dependency::Dependency;
use crate::describe::{ApplyFn, BuildFn, ConstructorTemplate, PropertyTemplate};
use crate::error::ResolveError;
use crate::registry::ServiceRegistry;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Turns a built implementation into the contract it is registered for.
pub(crate) type Upcast<T, C> = Arc<dyn Fn(Arc<T>) -> Arc<C> + Send + Sync>;
/// A user-supplied function producing a service.
pub(crate) type Producer<C> = Arc<dyn Fn() -> Arc<C> + Send + Sync>;

/// One way of producing an instance of a service.
pub trait Factory: Send + Sync {
  /// How many constructor dependencies this factory needs. Services try
  /// their factories from the most to the least complex.
  fn dependency_complexity(&self) -> usize;

  /// Every dependency that must be fulfilled before [`Factory::create`].
  fn dependencies(&self) -> &[Dependency];

  fn can_create(&self) -> bool {
    self.dependencies().iter().all(Dependency::is_fulfilled)
  }

  /// Tries to fulfill every dependency from `registry`.
  ///
  /// Returns whether all of them are fulfilled. Partial fulfillment is kept.
  fn fulfill(&self, registry: &ServiceRegistry) -> Result<bool, ResolveError> {
    let mut fulfilled = true;
    for dependency in self.dependencies() {
      if !dependency.fulfill_from(registry)? {
        fulfilled = false;
      }
    }
    Ok(fulfilled)
  }

  fn create(&self) -> Result<Instance, ResolveError>;
}

/// Builds an implementation through one of its declared constructors, then
/// injects its declared members.
pub(crate) struct ConstructorFactory<T, C: ?Sized> {
  arity: usize,
  // Constructor dependencies in argument order, then property dependencies.
  dependencies: Vec<Dependency>,
  build: BuildFn<T>,
  properties: Vec<ApplyFn<T>>,
  upcast: Upcast<T, C>,
}

impl<T, C> ConstructorFactory<T, C>
where
  T: Send + Sync + 'static,
  C: ?Sized + Any + Send + Sync,
{
  pub(crate) fn new(
    constructor: ConstructorTemplate<T>,
    properties: &[PropertyTemplate<T>],
    upcast: Upcast<T, C>,
  ) -> Self {
    let arity = constructor.contracts.len();
    let dependencies = constructor
      .contracts
      .iter()
      .enumerate()
      .map(|(position, contract)| Dependency::constructor(*contract, position))
      .chain(
        properties
          .iter()
          .map(|property| Dependency::property(property.contract, property.member)),
      )
      .collect();

    Self {
      arity,
      dependencies,
      build: constructor.build,
      properties: properties.iter().map(|property| property.apply.clone()).collect(),
      upcast,
    }
  }
}

impl<T, C> Factory for ConstructorFactory<T, C>
where
  T: Send + Sync + 'static,
  C: ?Sized + Any + Send + Sync,
{
  fn dependency_complexity(&self) -> usize {
    self.arity
  }

  fn dependencies(&self) -> &[Dependency] {
    &self.dependencies
  }

  fn create(&self) -> Result<Instance, ResolveError> {
    if !self.can_create() {
      return Err(ResolveError::Unfulfilled {
        implementation: type_name::<T>(),
      });
    }

    let (arguments, members) = self.dependencies.split_at(self.arity);
    let arguments = arguments
      .iter()
      .map(Dependency::resolve)
      .collect::<Result<Vec<_>, _>>()?;

    let mut value = (self.build)(arguments)?;
    for (dependency, apply) in members.iter().zip(&self.properties) {
      apply(&mut value, dependency.resolve()?)?;
    }

    Ok(Instance::new::<C>((self.upcast)(Arc::new(value))))
  }
}

impl<T, C: ?Sized> fmt::Debug for ConstructorFactory<T, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConstructorFactory")
      .field("implementation", &type_name::<T>())
      .field("arity", &self.arity)
      .field("dependencies", &self.dependencies)
      .finish()
  }
}

/// Calls a user-supplied producer. Always creatable.
pub(crate) struct ProducerFactory<C: ?Sized> {
  producer: Producer<C>,
}

impl<C: ?Sized + Any + Send + Sync> ProducerFactory<C> {
  pub(crate) fn new(producer: Producer<C>) -> Self {
    Self { producer }
  }
}

impl<C: ?Sized + Any + Send + Sync> Factory for ProducerFactory<C> {
  fn dependency_complexity(&self) -> usize {
    0
  }

  fn dependencies(&self) -> &[Dependency] {
    &[]
  }

  fn create(&self) -> Result<Instance, ResolveError> {
    Ok(Instance::new::<C>((self.producer)()))
  }
}

/// Hands out the same pre-built instance on every call.
pub(crate) struct InstanceFactory {
  instance: Instance,
}

impl InstanceFactory {
  pub(crate) fn new(instance: Instance) -> Self {
    Self { instance }
  }
}

impl Factory for InstanceFactory {
  fn dependency_complexity(&self) -> usize {
    0
  }

  fn dependencies(&self) -> &[Dependency] {
    &[]
  }

  fn create(&self) -> Result<Instance, ResolveError> {
    Ok(self.instance.clone())
  }
}
