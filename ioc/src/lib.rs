//! # Trellis IoC
//!
//! A scoped Inversion of Control (IoC) container for Rust that builds fully
//! wired object graphs.
//!
//! Implementation types declare the constructors they can be built with.
//! When a service is requested, the container picks the most specific
//! constructor whose dependencies it can satisfy, resolving those
//! dependencies transitively.
//!
//! ## Core Concepts
//!
//! - **Contract**: The type a service is requested by, usually `dyn Trait`.
//! - **Injectable**: Implemented by types the container builds; lists their
//!   constructors and injectable members on a [`Describer`].
//! - **Service**: A registration of a contract, with an optional name and a
//!   [`Lifespan`] deciding how long a built instance is reused.
//! - **Scopes**: [`Container::create_child`] opens a nested container that sees
//!   every registration of its parent while keeping its own private.
//! - **Macros**: `resolve!`, `maybe_resolve!` and `register!` shorten the
//!   common calls.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use trellis_ioc::{register, resolve, Container, Describer, Injectable, ServiceOptions};
//!
//! // Define a trait and a concrete implementation.
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: Arc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     self.message.to_string()
//!   }
//! }
//!
//! // Tell the container how to build it.
//! impl Injectable for EnglishGreeter {
//!   fn describe(d: &mut Describer<Self>) {
//!     d.constructor(|(message,): (Arc<String>,)| EnglishGreeter { message });
//!   }
//! }
//!
//! fn main() {
//!   let container = Container::new();
//!
//!   // Register a plain value and a service implementing a trait.
//!   container.register_instance(Arc::new(String::from("Hello, World!"))).unwrap();
//!   register!(container, dyn Greeter => EnglishGreeter, ServiceOptions::new().container_scoped()).unwrap();
//!
//!   // Resolve the service by its trait; its dependency is injected.
//!   let greeter = resolve!(container, trait Greeter);
//!   assert_eq!(greeter.greet(), "Hello, World!");
//! }
//! ```

mod container;
mod core;
mod dependency;
mod describe;
mod error;
mod factory;
mod lifespan;
mod macros;
mod module;
mod options;
mod registry;
mod service;

pub use crate::core::{Contract, Instance};
pub use container::Container;
pub use dependency::{Dependency, Locator};
pub use describe::{Arguments, Describer, Injectable};
pub use error::{ConflictReason, ContainerError, ResolveError, Result};
pub use factory::Factory;
pub use lifespan::{Cached, ContainerScoped, Lifespan, Transient, DEFAULT_CACHE_TIMEOUT};
pub use module::Module;
pub use options::ServiceOptions;
pub use registry::ServiceRegistry;
pub use service::Service;
