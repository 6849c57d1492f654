//! Grouped registrations applied to a container in one step.

use crate::container::Container;
use crate::error::Result;
use tracing::{debug, warn};

/// A reusable set of registrations.
///
/// ```
/// use std::sync::Arc;
/// use trellis_ioc::{Container, Module, Result};
///
/// struct Settings;
///
/// impl Module for Settings {
///   fn bootstrap(&self, container: &Container) -> Result<()> {
///     container.register_instance(Arc::new(String::from("production")))
///   }
/// }
///
/// let container = Container::new();
/// container.bootstrap([&Settings as &dyn Module]).unwrap();
/// assert_eq!(*container.resolve::<String>().unwrap(), "production");
/// ```
pub trait Module {
  /// A label used when logging the bootstrap.
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  /// Registers this module's services on `container`.
  fn bootstrap(&self, container: &Container) -> Result<()>;
}

impl Container {
  /// Applies every module in order, stopping at the first one that fails.
  ///
  /// Registrations made by modules that already succeeded are kept.
  pub fn bootstrap<'a>(&self, modules: impl IntoIterator<Item = &'a dyn Module>) -> Result<()> {
    for module in modules {
      debug!(module = module.name(), "bootstrapping module");
      module.bootstrap(self).map_err(|error| {
        warn!(module = module.name(), %error, "module bootstrap failed");
        error
      })?;
    }
    Ok(())
  }
}
