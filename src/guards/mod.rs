//! Navigation guards.
//!
//! # Data Flow
//! ```text
//! Router::before_each / before_resolve / after_each / on_error
//!     → registry.rs (ordered, removable by handle)
//!
//! Intercepted navigation:
//!     before registry snapshot → chain.rs (sequential, short-circuit)
//!     → resolve registry snapshot → chain.rs
//!     → native call
//!     → after registry snapshot → run_after_hooks (independent)
//! ```
//!
//! # Design Decisions
//! - Guards report through a typed `Next` instead of an untyped callback
//! - Registries are snapshotted before a run; guards may add or remove
//!   guards without affecting the chain already in flight

pub mod action;
pub mod chain;
pub mod registry;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, NavigationError};
use crate::location::RouteLocation;

pub use action::{NavigationAction, Next};
pub use chain::{run_after_hooks, ChainOutcome, GuardChain};
pub use registry::{Registration, Registry};

/// Return type of guards and after hooks.
pub type GuardResult = Result<(), GuardError>;

/// `(to, from, next)` before/resolve guard.
pub type GuardFn = dyn Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync;

/// `(to, from)` hook run after a successful navigation.
pub type AfterHookFn = dyn Fn(&RouteLocation, &RouteLocation) -> GuardResult + Send + Sync;

/// Error notification callback.
pub type ErrorHandlerFn = dyn Fn(&NavigationError) + Send + Sync;

/// Which phase of a navigation a guard belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardPhase {
    Before,
    Resolve,
    After,
}

impl GuardPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardPhase::Before => "before",
            GuardPhase::Resolve => "resolve",
            GuardPhase::After => "after",
        }
    }
}

impl fmt::Display for GuardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered error handlers.
///
/// A handler that panics is logged and skipped; the others still run.
#[derive(Debug, Clone)]
pub struct ErrorHandlers {
    handlers: Registry<ErrorHandlerFn>,
}

impl ErrorHandlers {
    pub fn new() -> Self {
        Self {
            handlers: Registry::new("error"),
        }
    }

    pub fn register(&self, handler: Arc<ErrorHandlerFn>) -> Registration {
        self.handlers.register(handler)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Notify every handler of `error`.
    pub fn dispatch(&self, error: &NavigationError) {
        for handler in self.handlers.snapshot() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(error))) {
                tracing::error!(
                    error = %error,
                    panic = %chain::panic_message(payload.as_ref()),
                    "error in on_error handler"
                );
            }
        }
    }
}

impl Default for ErrorHandlers {
    fn default() -> Self {
        Self::new()
    }
}
