//! How implementation types declare the ways they can be built.
//!
//! Rust has no runtime reflection, so a type that the container should build
//! implements [`Injectable`] and lists its candidate constructors and
//! injectable members on a [`Describer`]. The container turns every declared
//! constructor into a factory and picks between them at resolution time.

use crate::core::{Contract, Instance};
use crate::error::ResolveError;
use crate::lifespan::Transient;
use crate::registry::ServiceRegistry;
use crate::service::Service;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::sync::{Arc, Weak};

/// A type the container can construct from its own dependencies.
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{Describer, Injectable};
///
/// struct Clock;
/// struct Scheduler {
///   clock: Option<Arc<Clock>>,
/// }
///
/// impl Injectable for Scheduler {
///   fn describe(d: &mut Describer<Self>) {
///     d.constructor(|(clock,): (Arc<Clock>,)| Scheduler { clock: Some(clock) })
///       .constructor(|()| Scheduler { clock: None });
///   }
/// }
/// ```
pub trait Injectable: Sized + Any + Send + Sync {
  fn describe(describer: &mut Describer<Self>);
}

pub(crate) type BuildFn<T> = Arc<dyn Fn(Vec<Instance>) -> Result<T, ResolveError> + Send + Sync>;
pub(crate) type ApplyFn<T> = Arc<dyn Fn(&mut T, Instance) -> Result<(), ResolveError> + Send + Sync>;

pub(crate) struct ConstructorTemplate<T> {
  pub(crate) contracts: Vec<Contract>,
  pub(crate) build: BuildFn<T>,
}

pub(crate) struct PropertyTemplate<T> {
  pub(crate) member: &'static str,
  pub(crate) contract: Contract,
  pub(crate) apply: ApplyFn<T>,
}

/// Collects the constructors and injectable members of `T`.
pub struct Describer<T> {
  constructors: Vec<ConstructorTemplate<T>>,
  properties: Vec<PropertyTemplate<T>>,
}

impl<T: Injectable> Describer<T> {
  pub(crate) fn describe() -> Self {
    let mut describer = Self {
      constructors: Vec::new(),
      properties: Vec::new(),
    };
    T::describe(&mut describer);
    describer
  }

  pub(crate) fn into_parts(self) -> (Vec<ConstructorTemplate<T>>, Vec<PropertyTemplate<T>>) {
    (self.constructors, self.properties)
  }

  /// Declares a constructor taking the dependencies in `A`.
  ///
  /// `A` is a tuple of `Arc`s, one per dependency, e.g.
  /// `(Arc<dyn Repository>, Arc<Config>)`; `()` declares a constructor
  /// without dependencies.
  pub fn constructor<A: Arguments>(&mut self, build: impl Fn(A) -> T + Send + Sync + 'static) -> &mut Self {
    self.constructor_fallible(move |arguments: A| Ok(build(arguments)))
  }

  /// Declares a constructor that may fail once its dependencies are built.
  pub fn constructor_fallible<A: Arguments>(
    &mut self,
    build: impl Fn(A) -> Result<T, ResolveError> + Send + Sync + 'static,
  ) -> &mut Self {
    self.constructors.push(ConstructorTemplate {
      contracts: A::contracts(),
      build: Arc::new(move |instances: Vec<Instance>| build(A::from_instances(instances)?)),
    });
    self
  }

  /// Declares `T::default` as a constructor without dependencies.
  pub fn default_constructor(&mut self) -> &mut Self
  where
    T: Default,
  {
    self.constructor(|()| T::default())
  }

  /// Declares a member that receives an instance of contract `D` after
  /// construction, whichever constructor was used.
  pub fn property<D: ?Sized + Any + Send + Sync>(
    &mut self,
    member: &'static str,
    apply: impl Fn(&mut T, Arc<D>) + Send + Sync + 'static,
  ) -> &mut Self {
    let contract = Contract::of::<D>();
    self.properties.push(PropertyTemplate {
      member,
      contract,
      apply: Arc::new(move |target: &mut T, instance: Instance| -> Result<(), ResolveError> {
        let value = instance.downcast::<D>().ok_or(ResolveError::TypeMismatch {
          expected: contract.name(),
          found: instance.contract().name(),
        })?;
        apply(target, value);
        Ok(())
      }),
    });
    self
  }
}

/// The dependency list of a constructor: a tuple of `Arc<D>` values.
///
/// Implemented for tuples of up to eight dependencies.
pub trait Arguments: Sized + 'static {
  /// The contract of each positional argument.
  fn contracts() -> Vec<Contract>;

  /// Rebuilds the typed tuple from instances given in argument order.
  fn from_instances(instances: Vec<Instance>) -> Result<Self, ResolveError>;
}

fn take_argument<D: ?Sized + Any + Send + Sync>(
  instances: &mut impl Iterator<Item = Instance>,
  position: usize,
) -> Result<Arc<D>, ResolveError> {
  let instance = instances.next().ok_or(ResolveError::ArgumentMismatch {
    position,
    expected: type_name::<D>(),
    found: "<missing>",
  })?;
  instance.downcast::<D>().ok_or(ResolveError::ArgumentMismatch {
    position,
    expected: type_name::<D>(),
    found: instance.contract().name(),
  })
}

macro_rules! impl_arguments {
  ($($arg:ident => $position:tt),*) => {
    impl<$($arg: ?Sized + Any + Send + Sync),*> Arguments for ($(Arc<$arg>,)*) {
      fn contracts() -> Vec<Contract> {
        vec![$(Contract::of::<$arg>()),*]
      }

      #[allow(unused_mut, unused_variables)]
      fn from_instances(instances: Vec<Instance>) -> Result<Self, ResolveError> {
        let mut instances = instances.into_iter();
        Ok(($(take_argument::<$arg>(&mut instances, $position)?,)*))
      }
    }
  };
}

impl_arguments!();
impl_arguments!(A0 => 0);
impl_arguments!(A0 => 0, A1 => 1);
impl_arguments!(A0 => 0, A1 => 1, A2 => 2);
impl_arguments!(A0 => 0, A1 => 1, A2 => 2, A3 => 3);
impl_arguments!(A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4);
impl_arguments!(A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5);
impl_arguments!(A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6);
impl_arguments!(A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6, A7 => 7);

type ServiceMaker = Arc<dyn Fn(Weak<ServiceRegistry>) -> Service + Send + Sync>;

/// The types known to be constructible from one container.
///
/// Resolving a contract that has no registration falls back to building the
/// contract type itself, which is only possible for types listed here or in
/// an ancestor's catalog. Types learned by a child stay invisible to its
/// parent.
#[derive(Default)]
pub(crate) struct Catalog {
  parent: Option<Arc<Catalog>>,
  makers: DashMap<Contract, ServiceMaker>,
}

impl Catalog {
  pub(crate) fn create_child(self: &Arc<Self>) -> Arc<Self> {
    Arc::new(Self {
      parent: Some(Arc::clone(self)),
      makers: DashMap::new(),
    })
  }

  pub(crate) fn learn<T: Injectable>(&self) {
    self.makers.entry(Contract::of::<T>()).or_insert_with(|| {
      let maker: ServiceMaker = Arc::new(|registry: Weak<ServiceRegistry>| {
        Service::for_type::<T, T>(
          registry,
          None,
          Box::new(Transient),
          Arc::new(|service: Arc<T>| service),
        )
      });
      maker
    });
  }

  pub(crate) fn knows(&self, contract: Contract) -> bool {
    self.makers.contains_key(&contract)
      || self
        .parent
        .as_ref()
        .is_some_and(|parent| parent.knows(contract))
  }

  /// An unregistered, transient service building `contract` itself.
  pub(crate) fn make(&self, contract: Contract, registry: Weak<ServiceRegistry>) -> Option<Service> {
    // Clone the maker out so no map shard stays locked while it runs.
    match self.makers.get(&contract).map(|entry| entry.value().clone()) {
      Some(maker) => Some(maker(registry)),
      None => self.parent.as_ref()?.make(contract, registry),
    }
  }
}
