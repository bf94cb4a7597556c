//! Process-wide default router and the helpers built on it.
//!
//! # Responsibilities
//! - Hold the router registered by `create_router` / `set_global_router`
//! - Look it up for code that has no router handle at hand
//! - Page-scoped leave/update guards that de-register on drop
//!
//! # Design Decisions
//! - Explicit `Router` handles are the primary API; the global is only a
//!   default for helpers. Last writer wins.
//! - Page-scoped guards capture the page that was on top when they were
//!   registered

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::NavigationError;
use crate::guards::{GuardResult, Next, Registration};
use crate::host::NavigationHost;
use crate::location::{normalize_path, RouteLocation};
use crate::router::{CurrentRoute, Router, RouterInner, RouterOptions};

static GLOBAL_ROUTER: ArcSwapOption<RouterInner> = ArcSwapOption::const_empty();

/// Build a router and make it the global default.
pub fn create_router(options: RouterOptions, host: Arc<dyn NavigationHost>) -> Router {
    let router = Router::new(options, host);
    set_global_router(&router);
    router
}

/// Make `router` the global default, replacing any previous one.
pub fn set_global_router(router: &Router) {
    GLOBAL_ROUTER.store(Some(router.inner.clone()));
}

/// Forget the global default. Returns the router that was registered.
pub fn clear_global_router() -> Option<Router> {
    GLOBAL_ROUTER.swap(None).map(Router::from_inner)
}

/// The global default router.
pub fn use_router() -> Result<Router, NavigationError> {
    match GLOBAL_ROUTER.load_full() {
        Some(inner) => Ok(Router::from_inner(inner)),
        None => {
            tracing::error!("no router instance found; call create_router first");
            Err(NavigationError::NoRouter)
        }
    }
}

/// Reactive current route of the global default router.
pub fn use_route() -> Result<CurrentRoute, NavigationError> {
    use_router().map(|router| router.route())
}

/// Guard run only when navigating away from the page on top right now.
pub fn on_before_route_leave<F>(guard: F) -> Result<ScopedGuard, NavigationError>
where
    F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
{
    Ok(use_router()?.on_before_route_leave(guard))
}

/// Guard run only when the page on top right now navigates to itself.
pub fn on_before_route_update<F>(guard: F) -> Result<ScopedGuard, NavigationError>
where
    F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
{
    Ok(use_router()?.on_before_route_update(guard))
}

/// A guard tied to a page's lifetime. Dropping it removes the guard.
#[must_use = "the guard is removed as soon as this value is dropped"]
#[derive(Debug)]
pub struct ScopedGuard {
    registration: Registration,
}

impl ScopedGuard {
    /// Remove the guard now.
    pub fn remove(self) {}
}

impl Drop for ScopedGuard {
    fn drop(&mut self) {
        self.registration.remove();
    }
}

impl Router {
    /// Router-scoped variant of [`on_before_route_leave`].
    pub fn on_before_route_leave<F>(&self, guard: F) -> ScopedGuard
    where
        F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
    {
        let page = self.top_page_path();
        let registration = self.before_each(move |to, from, next| match &page {
            Some(page) if normalize_path(&from.path) == *page => guard(to, from, next),
            _ => {
                next.proceed();
                Ok(())
            }
        });
        ScopedGuard { registration }
    }

    /// Router-scoped variant of [`on_before_route_update`].
    pub fn on_before_route_update<F>(&self, guard: F) -> ScopedGuard
    where
        F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
    {
        let page = self.top_page_path();
        let registration = self.before_each(move |to, from, next| match &page {
            Some(page)
                if normalize_path(&to.path) == *page && normalize_path(&from.path) == *page =>
            {
                guard(to, from, next)
            }
            _ => {
                next.proceed();
                Ok(())
            }
        });
        ScopedGuard { registration }
    }

    fn top_page_path(&self) -> Option<String> {
        self.inner
            .host
            .current_pages()
            .last()
            .map(|page| normalize_path(&page.route))
    }
}
