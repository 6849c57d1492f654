//! Public macros for ergonomic registration and resolution.

/// Resolves a service from a container, panicking if it cannot be built.
///
/// Use this where a missing dependency is a programming error. For a
/// non-panicking version, call [`Container::resolve`](crate::Container::resolve)
/// or use [`maybe_resolve!`](crate::maybe_resolve).
///
/// # Panics
///
/// Panics with the resolution error if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{resolve, Container};
///
/// let container = Container::new();
/// container.register_instance(Arc::new(String::from("hello"))).unwrap();
///
/// let message = resolve!(container, String);
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{register, resolve, Container, Describer, Injectable};
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
/// impl Injectable for EnglishGreeter {
///   fn describe(d: &mut Describer<Self>) {
///     d.default_constructor();
///   }
/// }
///
/// let container = Container::new();
/// register!(container, dyn Greeter => EnglishGreeter).unwrap();
///
/// let greeter = resolve!(container, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  // Trait arms come first: `trait Name` does not parse as a type.
  ($container:expr, trait $trait_ident:ident) => {
    $container
      .resolve::<dyn $trait_ident>()
      .unwrap_or_else(|error| {
        panic!(
          "Failed to resolve required trait service: {}: {}",
          ::std::any::type_name::<dyn $trait_ident>(),
          error
        )
      })
  };

  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $container
      .resolve_named::<dyn $trait_ident>($name)
      .unwrap_or_else(|error| {
        panic!(
          "Failed to resolve required trait service with name '{}': {}: {}",
          $name,
          ::std::any::type_name::<dyn $trait_ident>(),
          error
        )
      })
  };

  ($container:expr, $type:ty) => {
    $container.resolve::<$type>().unwrap_or_else(|error| {
      panic!(
        "Failed to resolve required service: {}: {}",
        ::std::any::type_name::<$type>(),
        error
      )
    })
  };

  ($container:expr, $type:ty, $name:expr) => {
    $container
      .resolve_named::<$type>($name)
      .unwrap_or_else(|error| {
        panic!(
          "Failed to resolve required service with name '{}': {}: {}",
          $name,
          ::std::any::type_name::<$type>(),
          error
        )
      })
  };
}

/// Resolves a service from a container, returning `None` if it cannot be built.
///
/// ```
/// use trellis_ioc::{maybe_resolve, Container};
///
/// let container = Container::new();
/// assert!(maybe_resolve!(container, String).is_none());
/// ```
#[macro_export]
macro_rules! maybe_resolve {
  ($container:expr, trait $trait_ident:ident) => {
    $container.try_resolve::<dyn $trait_ident>()
  };

  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    $container.try_resolve_named::<dyn $trait_ident>($name)
  };

  ($container:expr, $type:ty) => {
    $container.try_resolve::<$type>()
  };

  ($container:expr, $type:ty, $name:expr) => {
    $container.try_resolve_named::<$type>($name)
  };
}

/// Registers an implementation under a contract, writing the upcast for you.
///
/// `register!(container, dyn Trait => Impl)` registers `Impl` for `dyn Trait`;
/// a trailing [`ServiceOptions`](crate::ServiceOptions) sets the name and
/// lifespan. Expands to a call returning the registration `Result`.
///
/// ```
/// use trellis_ioc::{register, Container, Describer, Injectable, ServiceOptions};
///
/// trait Store: Send + Sync {}
///
/// #[derive(Default)]
/// struct MemoryStore;
/// impl Store for MemoryStore {}
/// impl Injectable for MemoryStore {
///   fn describe(d: &mut Describer<Self>) {
///     d.default_constructor();
///   }
/// }
///
/// let container = Container::new();
/// register!(container, dyn Store => MemoryStore, ServiceOptions::named("memory")).unwrap();
/// assert!(container.resolve_named::<dyn Store>("memory").is_ok());
/// ```
#[macro_export]
macro_rules! register {
  ($container:expr, $contract:ty => $impl:ty) => {
    $container.register::<$contract, $impl>(|service: ::std::sync::Arc<$impl>| {
      service as ::std::sync::Arc<$contract>
    })
  };

  ($container:expr, $contract:ty => $impl:ty, $options:expr) => {
    $container.register_with::<$contract, $impl>(
      $options,
      |service: ::std::sync::Arc<$impl>| service as ::std::sync::Arc<$contract>,
    )
  };
}
