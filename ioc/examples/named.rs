use std::sync::Arc;
use trellis_ioc::{register, resolve, Container, Describer, Injectable, ServiceOptions};
use tracing_subscriber::EnvFilter;

trait Notifier: Send + Sync {
  fn notify(&self, message: &str);
}

struct EmailNotifier;
impl Notifier for EmailNotifier {
  fn notify(&self, message: &str) {
    println!("[EMAIL]: {}", message);
  }
}
impl Injectable for EmailNotifier {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|()| EmailNotifier);
  }
}

struct SmsNotifier {
  sender: Arc<String>,
}
impl Notifier for SmsNotifier {
  fn notify(&self, message: &str) {
    println!("[SMS from {}]: {}", self.sender, message);
  }
}
impl Injectable for SmsNotifier {
  fn describe(d: &mut Describer<Self>) {
    d.constructor(|(sender,): (Arc<String>,)| SmsNotifier { sender });
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let container = Container::new();
  container.register_instance(Arc::new(String::from("+1-555-0100"))).unwrap();

  // Register multiple implementations of the same trait under different names.
  register!(container, dyn Notifier => EmailNotifier, ServiceOptions::named("email")).unwrap();
  register!(container, dyn Notifier => SmsNotifier, ServiceOptions::named("sms")).unwrap();

  // Resolve specific implementations by name.
  resolve!(container, trait Notifier, "email").notify("Your order has shipped.");
  resolve!(container, trait Notifier, "sms").notify("Your package is out for delivery.");

  // Or all of them at once.
  for notifier in container.resolve_all::<dyn Notifier>().unwrap() {
    notifier.notify("Broadcast.");
  }

  // An unnamed registration next to named ones is refused.
  if let Err(error) = register!(container, dyn Notifier => EmailNotifier) {
    println!("Refused: {}", error);
  }
}
