//! Navigation error taxonomy.
//!
//! # Categories
//! - Guard exception: a before/resolve guard returned `Err` or panicked
//! - Navigation aborted: a guard called `next.abort()` (control flow, not a fault)
//! - Native failure: the host primitive itself failed
//! - After-hook exception: isolated per hook, navigation already succeeded
//!
//! # Design Decisions
//! - `NavigationError` is `Clone` so the same value can reach error handlers
//!   and the original caller
//! - Aborts never reach the error handler registry

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::guards::GuardPhase;
use crate::host::NavigationKind;
use crate::location::LocationError;

/// Errors surfaced by the navigation pipeline.
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    /// Another navigation is in flight; the call never reached the host.
    #[error("navigation locked: another navigation is in flight")]
    Locked,

    /// A guard explicitly aborted the navigation.
    #[error("navigation aborted by {phase} guard")]
    Aborted { phase: GuardPhase },

    /// A guard failed while deciding.
    #[error("{phase} guard failed: {error}")]
    Guard { phase: GuardPhase, error: GuardError },

    /// An after hook failed. The navigation itself already happened.
    #[error("after hook failed: {error}")]
    AfterHook { error: GuardError },

    /// The host primitive reported a failure.
    #[error("{kind} failed: {message}")]
    Native { kind: NavigationKind, message: String },

    /// A target or page location could not be decoded.
    #[error(transparent)]
    Location(#[from] LocationError),

    /// No router has been registered as the global default.
    #[error("no router instance found")]
    NoRouter,

    /// The host dropped the call without settling it.
    #[error("navigation interrupted before it settled")]
    Interrupted,
}

impl NavigationError {
    /// Whether this error is the expected outcome of a guard calling `abort`.
    pub fn is_abort(&self) -> bool {
        matches!(self, NavigationError::Aborted { .. })
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            NavigationError::Locked => "locked",
            NavigationError::Aborted { .. } => "aborted",
            NavigationError::Guard { .. } => "guard_error",
            NavigationError::AfterHook { .. } => "after_hook_error",
            NavigationError::Native { .. } => "native_error",
            NavigationError::Location(_) => "location_error",
            NavigationError::NoRouter => "no_router",
            NavigationError::Interrupted => "interrupted",
        }
    }
}

/// Failure raised by a guard or hook.
///
/// Any `std::error::Error` converts into it, so guards can use `?`.
#[derive(Clone)]
pub struct GuardError {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl GuardError {
    /// Build an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Message(message.into())),
        }
    }

    /// The underlying error value.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }
}

impl<E> From<E> for GuardError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            inner: Arc::new(err),
        }
    }
}

impl fmt::Debug for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GuardError").field(&self.inner).finish()
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_error_from_std_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: GuardError = io.into();
        assert_eq!(err.to_string(), "denied");
    }

    #[test]
    fn test_error_messages() {
        let err = NavigationError::Aborted {
            phase: GuardPhase::Before,
        };
        assert_eq!(err.to_string(), "navigation aborted by before guard");
        assert!(err.is_abort());

        let err = NavigationError::Guard {
            phase: GuardPhase::Resolve,
            error: GuardError::msg("boom"),
        };
        assert_eq!(err.to_string(), "resolve guard failed: boom");
        assert_eq!(err.label(), "guard_error");
    }
}
