//! Router instance.
//!
//! # Data Flow
//! ```text
//! Router::new(options, host)
//!     → current.rs seeded from the host's top page
//!     → interception::install (five primitives + page-shown)
//!
//! router.push(target)
//!     → lock.rs pre-check
//!     → api.rs builds the native request
//!     → host call → interception adapter → guards
//! ```
//!
//! # Design Decisions
//! - `Router` is a cheap clonable handle; all state sits behind one `Arc`
//! - Interceptors hold the router weakly and pass calls through once it is gone
//! - The global default router lives in `crate::global`, not here

pub mod api;
pub mod current;
pub mod lock;
pub mod routes;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::config::{RouterConfig, RouterMode};
use crate::error::NavigationError;
use crate::guards::{
    AfterHookFn, ErrorHandlers, GuardFn, GuardResult, Next, Registration, Registry,
};
use crate::host::NavigationHost;
use crate::interception::{self, Attachment};
use crate::location::RouteLocation;

pub use api::{BackOptions, NavigateOptions, PendingNavigation};
pub use current::CurrentRoute;
pub use lock::{LockTicket, NavigationLock};
pub use routes::{RouteRecord, RouteTable};

/// Construction options for a [`Router`].
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub mode: RouterMode,
    pub routes: Vec<RouteRecord>,
    /// Warn when a guard has not continued after this long.
    pub guard_stall_warning: Option<Duration>,
}

impl RouterOptions {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            mode: config.mode,
            routes: config.routes.clone(),
            guard_stall_warning: config
                .navigation
                .guard_stall_warning_ms
                .map(Duration::from_millis),
        }
    }

    pub fn with_routes(mut self, routes: Vec<RouteRecord>) -> Self {
        self.routes = routes;
        self
    }
}

pub(crate) struct RouterInner {
    pub(crate) host: Arc<dyn NavigationHost>,
    pub(crate) before: Registry<GuardFn>,
    pub(crate) resolve: Registry<GuardFn>,
    pub(crate) after: Registry<AfterHookFn>,
    pub(crate) errors: ErrorHandlers,
    pub(crate) lock: NavigationLock,
    pub(crate) current: CurrentRoute,
    pub(crate) routes: RouteTable,
    pub(crate) mode: RouterMode,
    pub(crate) stall_warning: Option<Duration>,
    attachment: Mutex<Option<Attachment>>,
}

/// Handle to a router instance.
#[derive(Clone)]
pub struct Router {
    pub(crate) inner: Arc<RouterInner>,
}

impl Router {
    /// Build a router and hook it into `host`.
    ///
    /// Interceptors already installed on `host` are replaced.
    pub fn new(options: RouterOptions, host: Arc<dyn NavigationHost>) -> Self {
        let initial = host
            .current_pages()
            .last()
            .map(RouteLocation::from_page)
            .unwrap_or_else(RouteLocation::root);

        let inner = Arc::new(RouterInner {
            host,
            before: Registry::new("before_each"),
            resolve: Registry::new("before_resolve"),
            after: Registry::new("after_each"),
            errors: ErrorHandlers::new(),
            lock: NavigationLock::new(),
            current: CurrentRoute::new(initial),
            routes: RouteTable::new(options.routes),
            mode: options.mode,
            stall_warning: options.guard_stall_warning,
            attachment: Mutex::new(None),
        });

        let attachment = interception::install(&inner);
        *inner
            .attachment
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(attachment);

        tracing::info!(
            mode = ?inner.mode,
            routes = inner.routes.len(),
            current = %inner.current.snapshot().full_path,
            "router initialized"
        );
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<RouterInner>) -> Self {
        Self { inner }
    }

    /// Register a guard run before every navigation.
    pub fn before_each<F>(&self, guard: F) -> Registration
    where
        F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
    {
        self.inner.before.register(Arc::new(guard))
    }

    /// Register a guard run after every before guard has continued.
    pub fn before_resolve<F>(&self, guard: F) -> Registration
    where
        F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
    {
        self.inner.resolve.register(Arc::new(guard))
    }

    /// Register a hook run after a successful forward navigation.
    pub fn after_each<F>(&self, hook: F) -> Registration
    where
        F: Fn(&RouteLocation, &RouteLocation) -> GuardResult + Send + Sync + 'static,
    {
        self.inner.after.register(Arc::new(hook))
    }

    /// Register an error handler.
    pub fn on_error<F>(&self, handler: F) -> Registration
    where
        F: Fn(&NavigationError) + Send + Sync + 'static,
    {
        self.inner.errors.register(Arc::new(handler))
    }

    /// Snapshot of the current route.
    pub fn current_route(&self) -> RouteLocation {
        self.inner.current.snapshot()
    }

    /// Reactive handle to the current route.
    pub fn route(&self) -> CurrentRoute {
        self.inner.current.clone()
    }

    /// Receiver notified on every current-route change.
    pub fn subscribe(&self) -> watch::Receiver<RouteLocation> {
        self.inner.current.subscribe()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    pub fn add_route(&self, record: RouteRecord) {
        self.inner.routes.add_route(record);
    }

    pub fn remove_route(&self, name: &str) -> bool {
        self.inner.routes.remove_route(name)
    }

    pub fn remove_route_by<F>(&self, predicate: F) -> bool
    where
        F: Fn(&RouteRecord) -> bool,
    {
        self.inner.routes.remove_route_by(predicate)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.inner.routes.has_route(name)
    }

    pub fn mode(&self) -> RouterMode {
        self.inner.mode
    }

    /// Whether a navigation is in flight.
    pub fn is_locked(&self) -> bool {
        self.inner.lock.is_held()
    }

    pub fn host(&self) -> Arc<dyn NavigationHost> {
        self.inner.host.clone()
    }

    /// Remove every interceptor and listener this router installed.
    ///
    /// Hooks another router has since installed on the same host are left in
    /// place. In-flight lock tickets are released. Returns `false` if already
    /// detached.
    pub fn detach(&self) -> bool {
        let attachment = self
            .inner
            .attachment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match attachment {
            Some(attachment) => {
                interception::uninstall(self.inner.host.as_ref(), attachment);
                tracing::info!("router detached from host");
                true
            }
            None => false,
        }
    }

    /// Whether two handles point at the same router.
    pub fn ptr_eq(&self, other: &Router) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("mode", &self.inner.mode)
            .field("current", &self.inner.current.snapshot().full_path)
            .field("before_each", &self.inner.before.len())
            .field("before_resolve", &self.inner.resolve.len())
            .field("after_each", &self.inner.after.len())
            .field("on_error", &self.inner.errors.len())
            .field("locked", &self.inner.lock.is_held())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::host::{MemoryHost, NavigationKind};

    fn host() -> Arc<MemoryHost> {
        Arc::new(MemoryHost::new(HostConfig {
            entry_page: "pages/index/index".into(),
            ..HostConfig::default()
        }))
    }

    #[test]
    fn test_new_seeds_current_route_and_installs_hooks() {
        let host = host();
        let router = Router::new(RouterOptions::default(), host.clone());
        assert_eq!(router.current_route().path, "/pages/index/index");
        for kind in NavigationKind::ALL {
            assert!(host.has_interceptor(kind));
        }
        assert_eq!(host.listener_count(), 1);
    }

    #[test]
    fn test_detach_removes_hooks_once() {
        let host = host();
        let router = Router::new(RouterOptions::default(), host.clone());
        assert!(router.detach());
        assert!(!router.detach());
        assert!(!host.has_interceptor(NavigationKind::Push));
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_detach_keeps_newer_router_hooks() {
        let host = host();
        let older = Router::new(RouterOptions::default(), host.clone());
        let newer = Router::new(RouterOptions::default(), host.clone());
        assert_eq!(host.listener_count(), 2);

        assert!(older.detach());
        for kind in NavigationKind::ALL {
            assert!(host.has_interceptor(kind), "{kind} hook removed");
        }
        assert_eq!(host.listener_count(), 1);

        assert!(newer.detach());
        assert!(!host.has_interceptor(NavigationKind::Push));
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_registration_handles() {
        let router = Router::new(RouterOptions::default(), host());
        let handle = router.before_each(|_, _, next| {
            next.proceed();
            Ok(())
        });
        assert_eq!(router.inner.before.len(), 1);
        assert!(handle.remove());
        assert!(!handle.remove());
        assert!(router.inner.before.is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = RouterConfig::default();
        config.navigation.guard_stall_warning_ms = Some(250);
        config.routes.push(RouteRecord::new("/pages/a", "a"));
        let options = RouterOptions::from_config(&config);
        assert_eq!(options.guard_stall_warning, Some(Duration::from_millis(250)));
        assert_eq!(options.routes.len(), 1);
    }
}
