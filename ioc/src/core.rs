//! Core data structures shared by every part of the container: the contract
//! key, the type-erased instance handle and the re-entrancy guard.

use crate::error::{ContainerError, ResolveError};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

thread_local! {
  // Services currently being built on this thread, keyed by address.
  static RESOLVING_STACK: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes a service onto the thread-local resolution stack. If the
/// service is already on the stack the object graph loops back on itself and
/// entering fails. Dropping the guard pops the service again.
pub(crate) struct ResolutionGuard {
  key: usize,
}

impl ResolutionGuard {
  pub(crate) fn enter(key: usize, contract: Contract) -> Result<Self, ResolveError> {
    let inserted = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(key));
    if !inserted {
      return Err(ResolveError::Circular {
        contract: contract.name(),
      });
    }
    Ok(Self { key })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.key);
    });
  }
}

/// The abstract type under which services are registered and looked up.
///
/// A contract can name a concrete type (`Contract::of::<Config>()`) or a trait
/// object (`Contract::of::<dyn Greeter>()`). Two contracts are equal when they
/// name the same type; the stored type name only serves diagnostics.
///
/// `Contract` doubles as the runtime type token for callers that cannot use
/// the generic API, see [`Container::resolve_contract`](crate::Container::resolve_contract).
#[derive(Clone, Copy)]
pub struct Contract {
  id: TypeId,
  name: &'static str,
}

impl Contract {
  pub fn of<C: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<C>(),
      name: std::any::type_name::<C>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  /// The fully-qualified type name of the contract.
  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn is<C: ?Sized + Any>(&self) -> bool {
    self.id == TypeId::of::<C>()
  }
}

impl PartialEq for Contract {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Contract {}

impl Hash for Contract {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for Contract {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Contract({})", self.name)
  }
}

impl fmt::Display for Contract {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A built service, erased to its contract.
///
/// An `Instance` wraps the `Arc<C>` produced for contract `C`. Cloning the
/// handle never clones the service itself, so lifespans can hand the very same
/// instance out again.
#[derive(Clone)]
pub struct Instance {
  contract: Contract,
  value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
  pub fn new<C: ?Sized + Any + Send + Sync>(value: Arc<C>) -> Self {
    Self {
      contract: Contract::of::<C>(),
      value: Arc::new(value),
    }
  }

  /// The contract this instance was built for.
  pub fn contract(&self) -> Contract {
    self.contract
  }

  /// Recovers the typed service, or `None` if `C` is not the instance's contract.
  pub fn downcast<C: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<C>> {
    self.value.downcast_ref::<Arc<C>>().cloned()
  }

  /// Whether both handles refer to the same built service.
  pub fn ptr_eq(&self, other: &Instance) -> bool {
    Arc::ptr_eq(&self.value, &other.value)
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({})", self.contract.name)
  }
}

/// Rejects names that cannot identify a registration.
pub(crate) fn validate_name(name: &str) -> Result<(), ContainerError> {
  if name.trim().is_empty() {
    return Err(ContainerError::InvalidArgument {
      argument: "name",
      reason: "service names must not be empty or whitespace",
    });
  }
  Ok(())
}
