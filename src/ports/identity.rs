//! Identity Port - Session Gate
//!
//! Authentication is delegated to an external identity provider. The
//! engine only asks whether a session exists before starting wallet work.

/// Session status reported by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
  /// Session lookup still running; operations must not start.
  Loading,
  /// No session; the collaborator handles the redirect.
  Anonymous,
  Authenticated,
}

/// Read-only view of the identity collaborator.
pub trait IdentityGate: Send + Sync + 'static {
  fn session_status(&self) -> SessionStatus;
}

/// Gate that always reports an authenticated session.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl IdentityGate for OpenGate {
  fn session_status(&self) -> SessionStatus {
    SessionStatus::Authenticated
  }
}
