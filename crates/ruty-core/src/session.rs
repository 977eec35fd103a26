//! The authenticated caller of a request.

use uuid::Uuid;

/// Identity resolved from a bearer token.
///
/// Handlers receive this value explicitly; nothing reads the current user
/// from ambient request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user_id: Uuid,
  pub email:   String,
}
