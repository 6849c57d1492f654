use std::sync::Arc;
use trellis_ioc::{register, resolve, Container, Describer, Injectable};
use tracing_subscriber::EnvFilter;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

impl Injectable for ConsoleLogger {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|()| ConsoleLogger);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

// 4. Tell the container how to build it. It never creates its own logger.
impl Injectable for ReportService {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|(logger,): (Arc<dyn Logger>,)| ReportService { logger });
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let container = Container::new();

  // --- Registration ---
  register!(container, dyn Logger => ConsoleLogger).unwrap();
  container.register_self::<ReportService>().unwrap();

  // --- Resolution ---
  // The container picks ReportService's constructor and injects the logger.
  let report_service = resolve!(container, ReportService);
  report_service.generate_report();
}
