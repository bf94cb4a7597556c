//! Interceptor installed on each host primitive.
//!
//! # Responsibilities
//! - Translate a native request into `to`/`from` locations
//! - Take the navigation lock and run the before and resolve chains
//! - Apply redirects and back-step adjustments to the native request
//! - Release the lock on every exit path
//! - Refresh the current route and run after hooks on a successful push
//!
//! # Design Decisions
//! - A directive from the resolve chain wins over one from the before chain
//! - A directive the primitive cannot honour is ignored with a warning
//! - Guards are not re-run for a redirected target
//! - A back call reaching past the bottom of the stack passes through with
//!   neither guards nor lock; the host reports the failure

use std::sync::{Arc, Weak};

use crate::error::NavigationError;
use crate::guards::{run_after_hooks, ChainOutcome, GuardChain, GuardPhase};
use crate::host::{
    CallId, Interceptor, NativeRequest, NativeResponse, NativeTarget, NavigationKind, Resume,
};
use crate::interception::TicketMap;
use crate::location::RouteLocation;
use crate::observability::metrics;
use crate::router::RouterInner;

/// Interceptor bound to one primitive of one router.
pub struct NavigationInterceptor {
    kind: NavigationKind,
    router: Weak<RouterInner>,
    tickets: TicketMap,
}

impl NavigationInterceptor {
    pub(crate) fn new(kind: NavigationKind, router: Weak<RouterInner>, tickets: TicketMap) -> Self {
        Self {
            kind,
            router,
            tickets,
        }
    }

    pub fn kind(&self) -> NavigationKind {
        self.kind
    }

    fn release(&self, call: CallId) {
        if self.tickets.remove(&call).is_some() {
            tracing::trace!(%call, kind = %self.kind, "navigation lock released");
        }
    }

    fn target_location(
        &self,
        router: &RouterInner,
        request: &NativeRequest,
    ) -> Result<Option<RouteLocation>, NavigationError> {
        match &request.target {
            NativeTarget::Url(url) => Ok(Some(RouteLocation::parse(url)?)),
            NativeTarget::Back { .. } => {
                let pages = router.host.current_pages();
                let delta = request.back_delta().unwrap_or(1) as usize;
                let Some(index) = pages.len().checked_sub(1 + delta) else {
                    return Ok(None);
                };
                Ok(pages.get(index).map(RouteLocation::from_page))
            }
        }
    }
}

impl Interceptor for NavigationInterceptor {
    fn invoke(&self, call: CallId, request: NativeRequest, resume: Resume) {
        let Some(router) = self.router.upgrade() else {
            resume.proceed(request);
            return;
        };

        let to = match self.target_location(&router, &request) {
            Ok(Some(to)) => to,
            Ok(None) => {
                tracing::debug!(%call, kind = %self.kind, native = ?request.target, "back target outside the page stack; passing through");
                resume.proceed(request);
                return;
            }
            Err(error) => {
                tracing::warn!(%call, kind = %self.kind, error = %error, "cannot build navigation target");
                metrics::record_navigation(self.kind, error.label());
                router.errors.dispatch(&error);
                resume.reject(error);
                return;
            }
        };
        let from = router.current.snapshot();

        self.tickets.insert(call, router.lock.acquire());
        tracing::debug!(%call, kind = %self.kind, to = %to.full_path, from = %from.full_path, "navigation started");

        let attempt = Attempt {
            kind: self.kind,
            call,
            request,
            resume,
            tickets: self.tickets.clone(),
            to: Arc::new(to),
            from: Arc::new(from),
            router,
        };
        attempt.run_before();
    }

    fn success(&self, call: CallId, response: &NativeResponse) {
        metrics::record_navigation(self.kind, "ok");
        tracing::debug!(%call, kind = %self.kind, message = %response.message, "navigation succeeded");
        if self.kind != NavigationKind::Push {
            return;
        }
        let Some(router) = self.router.upgrade() else {
            return;
        };

        let pages = router.host.current_pages();
        let [.., previous, current] = pages.as_slice() else {
            return;
        };
        let to = RouteLocation::from_page(current);
        let from = RouteLocation::from_page(previous);
        router.current.update(&to);
        run_after_hooks(&router.after.snapshot(), &to, &from, &router.errors);
    }

    fn fail(&self, call: CallId, error: &NavigationError) {
        self.release(call);
        metrics::record_navigation(self.kind, error.label());
        tracing::warn!(%call, kind = %self.kind, error = %error, "native navigation failed");
        if let Some(router) = self.router.upgrade() {
            router.errors.dispatch(error);
        }
    }

    fn complete(&self, call: CallId) {
        self.release(call);
    }
}

/// One guarded navigation between `invoke` and the host's decision.
struct Attempt {
    kind: NavigationKind,
    call: CallId,
    request: NativeRequest,
    resume: Resume,
    tickets: TicketMap,
    to: Arc<RouteLocation>,
    from: Arc<RouteLocation>,
    router: Arc<RouterInner>,
}

impl Attempt {
    fn chain(&self, phase: GuardPhase) -> GuardChain {
        let guards = match phase {
            GuardPhase::Resolve => self.router.resolve.snapshot(),
            _ => self.router.before.snapshot(),
        };
        GuardChain::new(
            phase,
            guards,
            self.to.clone(),
            self.from.clone(),
            self.router.errors.clone(),
        )
        .stall_warning(self.router.stall_warning)
    }

    fn run_before(self) {
        let chain = self.chain(GuardPhase::Before);
        chain.run(move |outcome| match outcome {
            ChainOutcome::Abort => self.reject(NavigationError::Aborted {
                phase: GuardPhase::Before,
            }),
            ChainOutcome::Failed(error) => self.reject(error),
            directive => self.run_resolve(directive),
        });
    }

    fn run_resolve(self, before: ChainOutcome) {
        let chain = self.chain(GuardPhase::Resolve);
        chain.run(move |outcome| match outcome {
            ChainOutcome::Abort => self.reject(NavigationError::Aborted {
                phase: GuardPhase::Resolve,
            }),
            ChainOutcome::Failed(error) => self.reject(error),
            ChainOutcome::Proceed => self.proceed(before),
            directive => self.proceed(directive),
        });
    }

    fn proceed(self, directive: ChainOutcome) {
        let Attempt {
            kind,
            call,
            request,
            resume,
            ..
        } = self;

        let request = match (directive, kind) {
            (ChainOutcome::Proceed, _) => request,
            (ChainOutcome::Redirect(target), kind) if kind != NavigationKind::Back => {
                let native = target.to_native();
                tracing::debug!(%call, kind = %kind, redirect = %native.url, "navigation redirected");
                let events = if native.events.is_empty() {
                    request.events
                } else {
                    native.events
                };
                NativeRequest {
                    target: NativeTarget::Url(native.url),
                    events,
                    animation: request.animation,
                }
            }
            (ChainOutcome::AdjustSteps(delta), NavigationKind::Back) => {
                tracing::debug!(%call, delta, "back navigation steps adjusted");
                NativeRequest {
                    target: NativeTarget::Back { delta },
                    ..request
                }
            }
            (directive, kind) => {
                tracing::warn!(%call, kind = %kind, directive = ?directive, "guard directive does not apply to this navigation; ignored");
                request
            }
        };
        resume.proceed(request);
    }

    fn reject(self, error: NavigationError) {
        self.tickets.remove(&self.call);
        if error.is_abort() {
            tracing::info!(call = %self.call, kind = %self.kind, to = %self.to.full_path, reason = %error, "navigation aborted");
        }
        metrics::record_navigation(self.kind, error.label());
        self.resume.reject(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::error::GuardError;
    use crate::guards::Next;
    use crate::host::{MemoryHost, NavigationHost, PerformedCall};
    use crate::router::{Router, RouterOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn setup() -> (Arc<MemoryHost>, Router) {
        let host = Arc::new(MemoryHost::new(HostConfig {
            entry_page: "pages/index/index".into(),
            pages: vec![
                "pages/index/index".into(),
                "pages/a/index".into(),
                "pages/b/index".into(),
                "pages/login/index".into(),
            ],
            tab_pages: Vec::new(),
            max_stack_depth: 10,
        }));
        let router = Router::new(RouterOptions::default(), host.clone());
        (host, router)
    }

    fn direct(host: &MemoryHost, kind: NavigationKind, request: NativeRequest) -> Arc<Mutex<Option<Result<NativeResponse, NavigationError>>>> {
        let slot = Arc::new(Mutex::new(None));
        let sink = slot.clone();
        host.call(kind, request, Box::new(move |outcome| {
            *sink.lock().unwrap() = Some(outcome);
        }));
        slot
    }

    fn last_target(host: &MemoryHost) -> NativeTarget {
        host.performed().last().map(|p: &PerformedCall| p.target.clone()).unwrap()
    }

    #[test]
    fn test_lock_held_until_complete_with_no_guards() {
        let (host, router) = setup();
        direct(&host, NavigationKind::Push, NativeRequest::url("/pages/a/index"));
        assert!(router.is_locked());
        host.run_until_idle();
        assert!(!router.is_locked());
    }

    #[test]
    fn test_resolve_abort_releases_lock() {
        let (host, router) = setup();
        router.before_resolve(|_, _, next| {
            next.abort();
            Ok(())
        });
        let outcome = direct(&host, NavigationKind::Push, NativeRequest::url("/pages/a/index"));
        assert!(matches!(
            outcome.lock().unwrap().take(),
            Some(Err(NavigationError::Aborted { phase: GuardPhase::Resolve }))
        ));
        assert!(!router.is_locked());
        assert_eq!(host.pending(), 0);
    }

    #[test]
    fn test_resolve_directive_wins_over_before() {
        let (host, router) = setup();
        router.before_each(|_, _, next| {
            next.redirect("/pages/a/index");
            Ok(())
        });
        router.before_resolve(|_, _, next| {
            next.redirect("/pages/b/index");
            Ok(())
        });
        direct(&host, NavigationKind::Replace, NativeRequest::url("/pages/login/index"));
        host.run_until_idle();
        assert_eq!(last_target(&host), NativeTarget::Url("/pages/b/index".into()));
    }

    #[test]
    fn test_before_redirect_survives_proceeding_resolve() {
        let (host, router) = setup();
        router.before_each(|to, _, next| {
            if to.path == "/pages/b/index" {
                next.redirect(crate::location::RouteTarget::location("pages/login/index").with_query("from", "b"));
            } else {
                next.proceed();
            }
            Ok(())
        });
        router.before_resolve(|_, _, next| {
            next.proceed();
            Ok(())
        });
        direct(&host, NavigationKind::Push, NativeRequest::url("/pages/b/index"));
        host.run_until_idle();
        assert_eq!(
            last_target(&host),
            NativeTarget::Url("/pages/login/index?from=b".into())
        );
        assert_eq!(router.current_route().query_value("from"), Some("b"));
    }

    #[test]
    fn test_adjust_steps_on_back() {
        let (host, router) = setup();
        for page in ["/pages/a/index", "/pages/b/index"] {
            direct(&host, NavigationKind::Push, NativeRequest::url(page));
            host.run_until_idle();
        }
        let seen_to = Arc::new(Mutex::new(String::new()));
        let s = seen_to.clone();
        router.before_each(move |to, _, next: Next| {
            *s.lock().unwrap() = to.path.clone();
            next.adjust_steps(2);
            Ok(())
        });
        direct(&host, NavigationKind::Back, NativeRequest::back(1));
        host.run_until_idle();

        assert_eq!(*seen_to.lock().unwrap(), "/pages/a/index");
        assert_eq!(last_target(&host), NativeTarget::Back { delta: 2 });
        assert_eq!(host.current_pages().len(), 1);
        assert_eq!(router.current_route().path, "/pages/index/index");
    }

    #[test]
    fn test_adjust_steps_ignored_for_push() {
        let (host, router) = setup();
        router.before_each(|_, _, next| {
            next.adjust_steps(3);
            Ok(())
        });
        direct(&host, NavigationKind::Push, NativeRequest::url("/pages/a/index"));
        host.run_until_idle();
        assert_eq!(last_target(&host), NativeTarget::Url("/pages/a/index".into()));
    }

    #[test]
    fn test_back_past_stack_passes_through() {
        let (host, router) = setup();
        let ran = Arc::new(AtomicUsize::new(0));
        let r = ran.clone();
        router.before_each(move |_, _, next| {
            r.fetch_add(1, Ordering::SeqCst);
            next.proceed();
            Ok(())
        });
        let outcome = direct(&host, NavigationKind::Back, NativeRequest::back(1));
        assert!(!router.is_locked());
        host.run_until_idle();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(outcome.lock().unwrap().as_ref().unwrap().is_err());
    }

    #[test]
    fn test_native_failure_reaches_handlers_and_releases() {
        let (host, router) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        router.on_error(move |err| s.lock().unwrap().push(err.label()));

        direct(&host, NavigationKind::Push, NativeRequest::url("/pages/nowhere/index"));
        host.run_until_idle();
        assert_eq!(*seen.lock().unwrap(), vec!["native_error"]);
        assert!(!router.is_locked());
    }

    #[test]
    fn test_guard_error_reaches_handlers_once() {
        let (host, router) = setup();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        router.on_error(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        router.before_each(|_, _, _next| Err(GuardError::msg("no session")));

        let outcome = direct(&host, NavigationKind::ReplaceAll, NativeRequest::url("/pages/a/index"));
        assert!(matches!(
            outcome.lock().unwrap().take(),
            Some(Err(NavigationError::Guard { .. }))
        ));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!router.is_locked());
        assert!(host.performed().is_empty());
    }

    #[test]
    fn test_dropped_router_passes_through() {
        let (host, router) = setup();
        router.before_each(|_, _, next| {
            next.abort();
            Ok(())
        });
        drop(router);
        let outcome = direct(&host, NavigationKind::Push, NativeRequest::url("/pages/a/index"));
        host.run_until_idle();
        assert!(outcome.lock().unwrap().as_ref().unwrap().is_ok());
    }
}
