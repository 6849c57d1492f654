use thiserror::Error;

/// Failures raised inside the resolution engine.
///
/// These never leave the container on their own: [`Container`](crate::Container)
/// wraps them into [`ContainerError::Resolution`], where they remain reachable
/// through [`std::error::Error::source`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("service for contract '{found}' does not fulfill a dependency on '{expected}'")]
  TypeMismatch {
    expected: &'static str,
    found: &'static str,
  },

  #[error("dependency on '{contract}' has not been fulfilled")]
  DependencyUnfulfilled { contract: &'static str },

  #[error("cannot create '{implementation}' because not all of its dependencies have been fulfilled")]
  Unfulfilled { implementation: &'static str },

  #[error("no factory of '{}' could be satisfied for contract '{contract}'{}", implementation_or_unknown(.implementation), named(.name))]
  NoViableFactory {
    contract: &'static str,
    implementation: Option<&'static str>,
    name: Option<String>,
  },

  #[error("no service is registered for contract '{contract}' and the contract cannot be constructed")]
  NotConstructible { contract: &'static str },

  #[error("no service is registered for contract '{contract}' named '{name}'")]
  NotRegistered { contract: &'static str, name: String },

  #[error("{count} unnamed services are registered for contract '{contract}'")]
  Ambiguous { contract: &'static str, count: usize },

  #[error("circular dependency detected while resolving '{contract}'")]
  Circular { contract: &'static str },

  #[error("argument {position} expected '{expected}' but received '{found}'")]
  ArgumentMismatch {
    position: usize,
    expected: &'static str,
    found: &'static str,
  },

  #[error("the container that owns '{contract}' has been dropped")]
  ScopeDropped { contract: &'static str },

  #[error("constructor of '{implementation}' failed: {message}")]
  Construction {
    implementation: &'static str,
    message: String,
  },
}

/// Why a registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictReason {
  #[error("an unnamed service is already registered")]
  DuplicateUnnamed,
  #[error("a service with this name is already registered")]
  DuplicateName,
  #[error("an unnamed service is registered, so named services are not allowed")]
  UnnamedExists,
  #[error("named services are registered, so an unnamed service is not allowed")]
  NamedExists,
}

/// The error type surfaced by [`Container`](crate::Container).
#[derive(Debug, Error)]
pub enum ContainerError {
  #[error("invalid argument '{argument}': {reason}")]
  InvalidArgument {
    argument: &'static str,
    reason: &'static str,
  },

  #[error("cannot register contract '{contract}'{}: {reason}", named(.name))]
  RegistrationConflict {
    contract: &'static str,
    name: Option<String>,
    reason: ConflictReason,
  },

  #[error("could not build '{}' for contract '{contract}'{}", implementation_or_unknown(.implementation), named(.name))]
  Resolution {
    contract: &'static str,
    implementation: Option<&'static str>,
    name: Option<String>,
    #[source]
    source: ResolveError,
  },
}

impl ContainerError {
  /// The engine failure behind a resolution error.
  pub fn resolve_error(&self) -> Option<&ResolveError> {
    match self {
      ContainerError::Resolution { source, .. } => Some(source),
      _ => None,
    }
  }
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;

fn named(name: &Option<String>) -> String {
  match name {
    Some(name) => format!(" named '{}'", name),
    None => String::new(),
  }
}

fn implementation_or_unknown(implementation: &Option<&'static str>) -> &'static str {
  implementation.unwrap_or("<unknown>")
}
