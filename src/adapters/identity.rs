//! Environment Identity Gate
//!
//! Reports a user session as present when the identity provider's
//! session token is exported in the environment. The token itself is
//! opaque here and never logged.

use std::sync::Arc;

use crate::config::IdentityConfig;
use crate::ports::identity::{IdentityGate, OpenGate, SessionStatus};

/// `IdentityGate` reading a session token from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvTokenGate {
  token_env: String,
}

impl EnvTokenGate {
  pub fn new(token_env: impl Into<String>) -> Self {
    Self {
      token_env: token_env.into(),
    }
  }
}

impl IdentityGate for EnvTokenGate {
  fn session_status(&self) -> SessionStatus {
    match std::env::var(&self.token_env) {
      Ok(token) if !token.trim().is_empty() => SessionStatus::Authenticated,
      _ => SessionStatus::Anonymous,
    }
  }
}

/// Pick the gate for the configured identity policy.
pub fn gate_from_config(config: &IdentityConfig) -> Arc<dyn IdentityGate> {
  if config.require_session {
    Arc::new(EnvTokenGate::new(config.token_env.clone()))
  } else {
    Arc::new(OpenGate)
  }
}
