//! Per-registration configuration.

use crate::lifespan::{Cached, ContainerScoped, Lifespan, Transient};
use std::fmt;
use std::time::Duration;

/// How a service is registered: under which name and with which lifespan.
///
/// The defaults register an unnamed service that is built anew on every
/// resolution.
///
/// ```
/// use std::time::Duration;
/// use trellis_ioc::ServiceOptions;
///
/// let options = ServiceOptions::named("primary").cached_for(Duration::from_secs(30));
/// assert_eq!(options.name(), Some("primary"));
/// ```
pub struct ServiceOptions {
  name: Option<String>,
  lifespan: Box<dyn Lifespan>,
}

impl ServiceOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Options for a service registered under `name`.
  pub fn named(name: impl Into<String>) -> Self {
    Self::new().with_name(name)
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_lifespan(mut self, lifespan: impl Lifespan + 'static) -> Self {
    self.lifespan = Box::new(lifespan);
    self
  }

  /// Reuse the first built instance for as long as the container lives.
  pub fn container_scoped(self) -> Self {
    self.with_lifespan(ContainerScoped::new())
  }

  /// Reuse a built instance until it goes unused for the default cache timeout.
  pub fn cached(self) -> Self {
    self.with_lifespan(Cached::new())
  }

  /// Reuse a built instance until it goes unused for `timeout`.
  pub fn cached_for(self, timeout: Duration) -> Self {
    self.with_lifespan(Cached::with_timeout(timeout))
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub(crate) fn into_parts(self) -> (Option<String>, Box<dyn Lifespan>) {
    (self.name, self.lifespan)
  }
}

impl Default for ServiceOptions {
  fn default() -> Self {
    Self {
      name: None,
      lifespan: Box::new(Transient),
    }
  }
}

impl fmt::Debug for ServiceOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceOptions")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}
