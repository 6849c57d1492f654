//! A single unresolved edge of the object graph.

use crate::core::{Contract, Instance};
use crate::error::ResolveError;
use crate::registry::ServiceRegistry;
use crate::service::Service;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Where a fulfilled dependency is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
  /// A positional constructor argument.
  Constructor { position: usize },
  /// A settable member, applied after construction.
  Property { member: &'static str },
}

/// A contract required by a factory, together with the service bound to
/// provide it.
///
/// Binding ([`Dependency::fulfill`]) is kept apart from building
/// ([`Dependency::resolve`]) so a factory can find out whether it is viable
/// before any nested instance gets built.
pub struct Dependency {
  contract: Contract,
  locator: Locator,
  // Weak: services may depend on each other, the registry owns them.
  provider: RwLock<Weak<Service>>,
}

impl Dependency {
  pub fn constructor(contract: Contract, position: usize) -> Self {
    Self::new(contract, Locator::Constructor { position })
  }

  pub fn property(contract: Contract, member: &'static str) -> Self {
    Self::new(contract, Locator::Property { member })
  }

  fn new(contract: Contract, locator: Locator) -> Self {
    Self {
      contract,
      locator,
      provider: RwLock::new(Weak::new()),
    }
  }

  pub fn contract(&self) -> Contract {
    self.contract
  }

  pub fn locator(&self) -> Locator {
    self.locator
  }

  pub fn is_fulfilled(&self) -> bool {
    self.provider.read().strong_count() > 0
  }

  /// The service bound to this dependency, if any.
  pub fn providing_service(&self) -> Option<Arc<Service>> {
    self.provider.read().upgrade()
  }

  /// Binds `service` as the provider of this dependency.
  ///
  /// Fails with [`ResolveError::TypeMismatch`] when the service is registered
  /// for a different contract.
  pub fn fulfill(&self, service: &Arc<Service>) -> Result<(), ResolveError> {
    if service.contract() != self.contract {
      return Err(ResolveError::TypeMismatch {
        expected: self.contract.name(),
        found: service.contract().name(),
      });
    }
    *self.provider.write() = Arc::downgrade(service);
    Ok(())
  }

  /// Binds the single unnamed service `registry` offers for the contract.
  ///
  /// Returns `Ok(false)` without touching the binding when there is none.
  pub fn fulfill_from(&self, registry: &ServiceRegistry) -> Result<bool, ResolveError> {
    match registry.unnamed_service(self.contract) {
      Some(service) => {
        self.fulfill(&service)?;
        trace!(contract = %self.contract, locator = ?self.locator, "dependency fulfilled");
        Ok(true)
      }
      None => Ok(false),
    }
  }

  /// Builds the instance for this dependency through its providing service.
  pub fn resolve(&self) -> Result<Instance, ResolveError> {
    let service = self
      .providing_service()
      .ok_or(ResolveError::DependencyUnfulfilled {
        contract: self.contract.name(),
      })?;
    service.resolve()
  }
}

impl fmt::Debug for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dependency")
      .field("contract", &self.contract)
      .field("locator", &self.locator)
      .field("fulfilled", &self.is_fulfilled())
      .finish()
  }
}
