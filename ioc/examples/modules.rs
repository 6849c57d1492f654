use std::sync::Arc;
use std::time::Duration;
use trellis_ioc::{register, resolve, Container, Describer, Injectable, Module, Result, ServiceOptions};
use tracing_subscriber::EnvFilter;

trait Cache: Send + Sync {
  fn summary(&self) -> String;
}

struct MemoryCache {
  capacity: Arc<usize>,
}
impl Cache for MemoryCache {
  fn summary(&self) -> String {
    format!("memory cache holding up to {} entries", self.capacity)
  }
}
impl Injectable for MemoryCache {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|(capacity,): (Arc<usize>,)| MemoryCache { capacity });
  }
}

struct ConfigModule;
impl Module for ConfigModule {
  fn bootstrap(&self, container: &Container) -> Result<()> {
    container.register_instance(Arc::new(1024usize))
  }
}

struct CacheModule;
impl Module for CacheModule {
  fn name(&self) -> &str {
    "cache"
  }

  fn bootstrap(&self, container: &Container) -> Result<()> {
    register!(
      container,
      dyn Cache => MemoryCache,
      ServiceOptions::new().cached_for(Duration::from_secs(60))
    )
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let container = Container::new();
  container.bootstrap([&ConfigModule as &dyn Module, &CacheModule]).unwrap();

  let cache = resolve!(container, trait Cache);
  println!("{}", cache.summary());
}
