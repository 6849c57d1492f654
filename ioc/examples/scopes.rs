use std::sync::Arc;
use trellis_ioc::{register, Container, Describer, Injectable, ServiceOptions};
use tracing_subscriber::EnvFilter;

trait Session: Send + Sync {
  fn user(&self) -> String;
}

struct RequestSession {
  user: Arc<String>,
}
impl Session for RequestSession {
  fn user(&self) -> String {
    self.user.to_string()
  }
}
impl Injectable for RequestSession {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|(user,): (Arc<String>,)| RequestSession { user });
  }
}

struct Database {
  id: usize,
}

fn handle_request(app: &Container, user: &str) {
  // Each request gets its own scope on top of the application container.
  let request = app.create_child();
  request.register_instance(Arc::new(user.to_string())).unwrap();
  register!(request, dyn Session => RequestSession, ServiceOptions::new().container_scoped()).unwrap();

  let session = request.resolve::<dyn Session>().unwrap();
  let database = request.resolve::<Database>().unwrap();
  println!("request for {} uses database #{}", session.user(), database.id);
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let app = Container::new();
  app
    .register_producer_with(ServiceOptions::new().container_scoped(), || Arc::new(Database { id: 1 }))
    .unwrap();

  handle_request(&app, "alice");
  handle_request(&app, "bob");

  // Request-scoped registrations never leak into the application container.
  println!("app sees a session: {}", app.try_resolve::<dyn Session>().is_some());
}
