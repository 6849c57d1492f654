use std::sync::Arc;
use trellis_ioc::{Container, Describer, Injectable};
use tracing_subscriber::EnvFilter;

struct Settings {
  region: String,
}

struct Metrics;

impl Injectable for Metrics {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|()| Metrics);
  }
}

// A client with several ways to be built. The container uses the most
// specific constructor whose dependencies it can satisfy.
struct StorageClient {
  region: String,
  metrics: bool,
}

impl Injectable for StorageClient {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|()| StorageClient {
      region: "us-east-1".to_string(),
      metrics: false,
    })
    .constructor(|(settings,): (Arc<Settings>,)| StorageClient {
      region: settings.region.clone(),
      metrics: false,
    })
    .constructor(|(settings, _metrics): (Arc<Settings>, Arc<Metrics>)| StorageClient {
      region: settings.region.clone(),
      metrics: true,
    });
  }
}

fn report(container: &Container) {
  let client = container.resolve::<StorageClient>().unwrap();
  println!("StorageClient(region = {}, metrics = {})", client.region, client.metrics);
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let container = Container::new();
  container.register_self::<StorageClient>().unwrap();

  // Nothing else registered: the default constructor is used.
  report(&container);

  // Settings alone: the one-argument constructor wins.
  container
    .register_instance(Arc::new(Settings {
      region: "eu-west-2".to_string(),
    }))
    .unwrap();
  report(&container);

  // Settings and metrics: the two-argument constructor wins.
  container.register_self::<Metrics>().unwrap();
  report(&container);
}
