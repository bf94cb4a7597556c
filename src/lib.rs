//! Guarded page navigation for stack-based hosts.
//!
//! Every navigation primitive of the host (push, replace, replace-all,
//! tab switch, back) is intercepted; registered guards decide whether the
//! transition happens, where it goes, and what runs afterwards.

pub mod config;
pub mod error;
pub mod global;
pub mod guards;
pub mod host;
pub mod interception;
pub mod location;
pub mod observability;
pub mod router;

pub use config::RouterConfig;
pub use error::{GuardError, NavigationError};
pub use global::{
    create_router, on_before_route_leave, on_before_route_update, set_global_router, use_route,
    use_router, ScopedGuard,
};
pub use guards::{GuardPhase, GuardResult, NavigationAction, Next, Registration};
pub use host::{MemoryHost, NavigationHost, NavigationKind};
pub use location::{RouteLocation, RouteTarget};
pub use router::{BackOptions, NavigateOptions, PendingNavigation, Router, RouterOptions};
