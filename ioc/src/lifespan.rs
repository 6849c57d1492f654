//! Lifespans decide whether a built instance is reused by later resolutions.

use crate::core::Instance;
use parking_lot::Mutex;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::trace;

/// How long [`Cached`] keeps an instance when no timeout is given.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// A strategy for retaining a built instance across resolutions.
///
/// A [`Service`](crate::Service) asks its lifespan for a live instance before
/// building, and hands every freshly built instance to [`Lifespan::hold`].
pub trait Lifespan: Send + Sync {
  /// Retains `instance` for later resolutions.
  fn hold(&self, instance: Instance);

  /// The retained instance, if it is still alive.
  fn instance(&self) -> Option<Instance>;

  /// Marks the retained instance as used.
  fn refresh(&self);

  /// Drops the retained instance unconditionally.
  fn kill(&self);
}

/// Never retains anything; every resolution builds a new instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct Transient;

impl Lifespan for Transient {
  fn hold(&self, _instance: Instance) {}

  fn instance(&self) -> Option<Instance> {
    None
  }

  fn refresh(&self) {}

  fn kill(&self) {}
}

/// Retains the first built instance for as long as the owning container lives.
#[derive(Default)]
pub struct ContainerScoped {
  slot: Mutex<Option<Instance>>,
}

impl ContainerScoped {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Lifespan for ContainerScoped {
  fn hold(&self, instance: Instance) {
    *self.slot.lock() = Some(instance);
  }

  fn instance(&self) -> Option<Instance> {
    self.slot.lock().clone()
  }

  fn refresh(&self) {}

  fn kill(&self) {
    self.slot.lock().take();
  }
}

impl fmt::Debug for ContainerScoped {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerScoped")
      .field("holding", &self.slot.lock().is_some())
      .finish()
  }
}

struct CacheState {
  timeout: Duration,
  held: Option<(Instance, Instant)>,
}

impl CacheState {
  fn has_timed_out(&self, now: Instant) -> bool {
    match &self.held {
      Some((_, held_at)) => now.saturating_duration_since(*held_at) > self.timeout,
      None => false,
    }
  }
}

/// Retains an instance until it has gone unused for longer than a timeout.
///
/// Expiry is lazy: nothing runs in the background, the timeout is only checked
/// when the instance is read or refreshed.
pub struct Cached {
  state: Mutex<CacheState>,
}

impl Cached {
  /// A cache with the [`DEFAULT_CACHE_TIMEOUT`].
  pub fn new() -> Self {
    Self::with_timeout(DEFAULT_CACHE_TIMEOUT)
  }

  pub fn with_timeout(timeout: Duration) -> Self {
    Self {
      state: Mutex::new(CacheState {
        timeout,
        held: None,
      }),
    }
  }

  pub fn timeout(&self) -> Duration {
    self.state.lock().timeout
  }

  pub fn set_timeout(&self, timeout: Duration) {
    self.state.lock().timeout = timeout;
  }
}

impl Default for Cached {
  fn default() -> Self {
    Self::new()
  }
}

impl Lifespan for Cached {
  fn hold(&self, instance: Instance) {
    self.state.lock().held = Some((instance, Instant::now()));
  }

  fn instance(&self) -> Option<Instance> {
    let mut state = self.state.lock();
    if state.has_timed_out(Instant::now()) {
      trace!(timeout = ?state.timeout, "cached instance expired");
      state.held = None;
    }
    state.held.as_ref().map(|(instance, _)| instance.clone())
  }

  fn refresh(&self) {
    let now = Instant::now();
    let mut state = self.state.lock();
    if state.has_timed_out(now) {
      return;
    }
    if let Some((_, held_at)) = state.held.as_mut() {
      *held_at = now;
    }
  }

  fn kill(&self) {
    self.state.lock().held = None;
  }
}

impl fmt::Debug for Cached {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("Cached")
      .field("timeout", &state.timeout)
      .field("holding", &state.held.is_some())
      .finish()
  }
}
