//! Sequential guard execution.
//!
//! # Responsibilities
//! - Run one guard at a time, in registration order
//! - Move on only when the current guard consumes its `Next`
//! - Short-circuit on abort, redirect, step adjustment or guard failure
//! - Run after hooks independently of each other
//!
//! # Design Decisions
//! - Continuation-driven, not future-driven: a guard that never continues
//!   suspends the chain, nothing times it out
//! - The final continuation fires exactly once; a `Next` used after the
//!   chain settled is ignored
//! - Guard failures (`Err` or panic) are reported to the error handlers and
//!   end the chain as `Failed`

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{GuardError, NavigationError};
use crate::guards::{AfterHookFn, ErrorHandlers, GuardFn, GuardPhase, NavigationAction, Next};
use crate::location::{RouteLocation, RouteTarget};
use crate::observability::metrics;

/// How a guard chain ended.
#[derive(Debug, Clone)]
pub enum ChainOutcome {
    Proceed,
    Abort,
    Redirect(RouteTarget),
    AdjustSteps(u32),
    Failed(NavigationError),
}

impl From<NavigationAction> for ChainOutcome {
    fn from(action: NavigationAction) -> Self {
        match action {
            NavigationAction::Proceed => ChainOutcome::Proceed,
            NavigationAction::Abort => ChainOutcome::Abort,
            NavigationAction::Redirect(target) => ChainOutcome::Redirect(target),
            NavigationAction::AdjustSteps(delta) => ChainOutcome::AdjustSteps(delta),
        }
    }
}

type Done = Box<dyn FnOnce(ChainOutcome) + Send>;

/// An ordered list of guards bound to one transition.
pub struct GuardChain {
    phase: GuardPhase,
    guards: Vec<Arc<GuardFn>>,
    to: Arc<RouteLocation>,
    from: Arc<RouteLocation>,
    errors: ErrorHandlers,
    stall_warning: Option<Duration>,
}

impl GuardChain {
    pub fn new(
        phase: GuardPhase,
        guards: Vec<Arc<GuardFn>>,
        to: Arc<RouteLocation>,
        from: Arc<RouteLocation>,
        errors: ErrorHandlers,
    ) -> Self {
        Self {
            phase,
            guards,
            to,
            from,
            errors,
            stall_warning: None,
        }
    }

    /// Log a warning when a guard has not continued after `delay`.
    ///
    /// Diagnostic only; needs a Tokio runtime and never aborts the chain.
    pub fn stall_warning(mut self, delay: Option<Duration>) -> Self {
        self.stall_warning = delay;
        self
    }

    /// Start the chain. `done` runs exactly once, possibly re-entrantly from
    /// inside the last guard's `next` call.
    pub fn run<F>(self, done: F)
    where
        F: FnOnce(ChainOutcome) + Send + 'static,
    {
        if self.guards.is_empty() {
            done(ChainOutcome::Proceed);
            return;
        }

        let state = Arc::new(ChainState {
            phase: self.phase,
            guards: self.guards,
            to: self.to,
            from: self.from,
            errors: self.errors,
            stall_warning: self.stall_warning,
            done: Mutex::new(Some(Box::new(done))),
        });
        state.step(0);
    }
}

struct ChainState {
    phase: GuardPhase,
    guards: Vec<Arc<GuardFn>>,
    to: Arc<RouteLocation>,
    from: Arc<RouteLocation>,
    errors: ErrorHandlers,
    stall_warning: Option<Duration>,
    done: Mutex<Option<Done>>,
}

impl ChainState {
    fn step(self: Arc<Self>, index: usize) {
        let Some(guard) = self.guards.get(index).cloned() else {
            self.settle(ChainOutcome::Proceed);
            return;
        };

        let continued = Arc::new(AtomicBool::new(false));
        self.watch_for_stall(index, continued.clone());

        let state = self.clone();
        let flag = continued.clone();
        let next = Next::new(self.phase, move |action| {
            flag.store(true, Ordering::Release);
            if state.is_settled() {
                tracing::warn!(
                    phase = %state.phase,
                    index,
                    action = ?action,
                    "guard continued after the chain had already settled; ignored"
                );
                return;
            }
            match action {
                NavigationAction::Proceed => state.step(index + 1),
                other => {
                    tracing::debug!(
                        phase = %state.phase,
                        index,
                        action = ?other,
                        to = %state.to.full_path,
                        "guard ended chain"
                    );
                    state.settle(other.into());
                }
            }
        });

        tracing::trace!(phase = %self.phase, index, to = %self.to.full_path, "running guard");
        let result = panic::catch_unwind(AssertUnwindSafe(|| guard(&self.to, &self.from, next)));
        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(payload) => GuardError::msg(panic_message(payload.as_ref())),
        };
        continued.store(true, Ordering::Release);
        self.fail(index, error);
    }

    fn fail(&self, index: usize, error: GuardError) {
        tracing::error!(
            phase = %self.phase,
            index,
            to = %self.to.full_path,
            error = %error,
            "navigation guard error"
        );
        metrics::record_guard_failure(self.phase);

        let err = NavigationError::Guard {
            phase: self.phase,
            error,
        };
        self.errors.dispatch(&err);
        if !self.settle(ChainOutcome::Failed(err)) {
            tracing::warn!(
                phase = %self.phase,
                index,
                "guard failed after the chain had already settled; outcome unchanged"
            );
        }
    }

    fn is_settled(&self) -> bool {
        self.done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Fire the final continuation. Returns `false` if it already fired.
    fn settle(&self, outcome: ChainOutcome) -> bool {
        let done = self
            .done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match done {
            Some(done) => {
                done(outcome);
                true
            }
            None => false,
        }
    }

    fn watch_for_stall(&self, index: usize, continued: Arc<AtomicBool>) {
        let Some(delay) = self.stall_warning else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let phase = self.phase;
        let to = self.to.full_path.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if !continued.load(Ordering::Acquire) {
                tracing::warn!(
                    phase = %phase,
                    index,
                    to = %to,
                    waited_ms = delay.as_millis() as u64,
                    "guard has not called next; navigation is still pending"
                );
            }
        });
    }
}

/// Run every after hook. A failing hook is reported and the rest still run.
///
/// Returns the number of hooks that failed.
pub fn run_after_hooks(
    hooks: &[Arc<AfterHookFn>],
    to: &RouteLocation,
    from: &RouteLocation,
    errors: &ErrorHandlers,
) -> usize {
    let mut failures = 0;
    for (index, hook) in hooks.iter().enumerate() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| hook(to, from)));
        let error = match result {
            Ok(Ok(())) => continue,
            Ok(Err(error)) => error,
            Err(payload) => GuardError::msg(panic_message(payload.as_ref())),
        };
        failures += 1;
        tracing::error!(index, to = %to.full_path, error = %error, "after navigation hook error");
        metrics::record_after_hook_failure();
        errors.dispatch(&NavigationError::AfterHook { error });
    }
    failures
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{GuardResult, Registry};
    use std::sync::atomic::AtomicUsize;

    fn loc(path: &str) -> Arc<RouteLocation> {
        Arc::new(RouteLocation::parse(path).unwrap())
    }

    fn guard<F>(f: F) -> Arc<GuardFn>
    where
        F: Fn(&RouteLocation, &RouteLocation, Next) -> GuardResult + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn run(guards: Vec<Arc<GuardFn>>, errors: ErrorHandlers) -> Arc<Mutex<Vec<ChainOutcome>>> {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = outcomes.clone();
        GuardChain::new(GuardPhase::Before, guards, loc("/to"), loc("/from"), errors)
            .run(move |outcome| sink.lock().unwrap().push(outcome));
        outcomes
    }

    fn counting_handlers() -> (ErrorHandlers, Arc<AtomicUsize>) {
        let handlers = ErrorHandlers::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        handlers.register(Arc::new(move |_err: &NavigationError| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        (handlers, count)
    }

    #[test]
    fn test_empty_chain_proceeds() {
        let outcomes = run(Vec::new(), ErrorHandlers::new());
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], ChainOutcome::Proceed));
    }

    #[test]
    fn test_guards_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let guards = (0..3)
            .map(|i| {
                let order = order.clone();
                guard(move |_, _, next| {
                    order.lock().unwrap().push(i);
                    next.proceed();
                    Ok(())
                })
            })
            .collect();

        let outcomes = run(guards, ErrorHandlers::new());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert!(matches!(outcomes.lock().unwrap()[0], ChainOutcome::Proceed));
    }

    #[test]
    fn test_abort_short_circuits() {
        let later = Arc::new(AtomicUsize::new(0));
        let l = later.clone();
        let guards = vec![
            guard(|_, _, next| {
                next.abort();
                Ok(())
            }),
            guard(move |_, _, next| {
                l.fetch_add(1, Ordering::SeqCst);
                next.proceed();
                Ok(())
            }),
        ];

        let (errors, handled) = counting_handlers();
        let outcomes = run(guards, errors);
        assert!(matches!(outcomes.lock().unwrap()[0], ChainOutcome::Abort));
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_redirect_ends_chain() {
        let guards = vec![
            guard(|_, _, next| {
                next.redirect("/pages/login/index");
                Ok(())
            }),
            guard(|_, _, _next| panic!("must not run")),
        ];
        let outcomes = run(guards, ErrorHandlers::new());
        match &outcomes.lock().unwrap()[0] {
            ChainOutcome::Redirect(target) => {
                assert_eq!(target.to_native().url, "/pages/login/index");
            }
            other => panic!("unexpected outcome: {other:?}"),
        };
    }

    #[test]
    fn test_error_is_reported_and_stops_chain() {
        let later = Arc::new(AtomicUsize::new(0));
        let l = later.clone();
        let guards = vec![
            guard(|_, _, _next| Err(GuardError::msg("denied"))),
            guard(move |_, _, next| {
                l.fetch_add(1, Ordering::SeqCst);
                next.proceed();
                Ok(())
            }),
        ];

        let (errors, handled) = counting_handlers();
        let outcomes = run(guards, errors);
        match &outcomes.lock().unwrap()[0] {
            ChainOutcome::Failed(NavigationError::Guard { phase, error }) => {
                assert_eq!(*phase, GuardPhase::Before);
                assert_eq!(error.to_string(), "denied");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_is_treated_as_failure() {
        let guards = vec![guard(|_, _, _next| panic!("guard exploded"))];
        let (errors, handled) = counting_handlers();
        let outcomes = run(guards, errors);
        match &outcomes.lock().unwrap()[0] {
            ChainOutcome::Failed(err) => assert!(err.to_string().contains("guard exploded")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_after_next_does_not_settle_twice() {
        let guards = vec![guard(|_, _, next| {
            next.proceed();
            Err(GuardError::msg("late"))
        })];
        let (errors, handled) = counting_handlers();
        let outcomes = run(guards, errors);
        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], ChainOutcome::Proceed));
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stored_next_after_error_is_ignored() {
        let parked: Arc<Mutex<Option<Next>>> = Arc::new(Mutex::new(None));
        let slot = parked.clone();
        let later = Arc::new(AtomicUsize::new(0));
        let l = later.clone();
        let guards = vec![
            guard(move |_, _, next| {
                *slot.lock().unwrap() = Some(next);
                Err(GuardError::msg("boom"))
            }),
            guard(move |_, _, next| {
                l.fetch_add(1, Ordering::SeqCst);
                next.proceed();
                Ok(())
            }),
        ];

        let (errors, handled) = counting_handlers();
        let outcomes = run(guards, errors);
        let next = parked.lock().unwrap().take().unwrap();
        next.proceed();

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], ChainOutcome::Failed(_)));
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_suspended_guard_resumes_later() {
        let parked: Arc<Mutex<Option<Next>>> = Arc::new(Mutex::new(None));
        let slot = parked.clone();
        let guards = vec![guard(move |_, _, next| {
            *slot.lock().unwrap() = Some(next);
            Ok(())
        })];

        let outcomes = run(guards, ErrorHandlers::new());
        assert!(outcomes.lock().unwrap().is_empty());

        let next = parked.lock().unwrap().take().unwrap();
        next.proceed();
        assert!(matches!(outcomes.lock().unwrap()[0], ChainOutcome::Proceed));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contains(&self, needle: &str) -> bool {
            String::from_utf8_lossy(&self.0.lock().unwrap()).contains(needle)
        }
    }

    fn run_with_stall_warning(guards: Vec<Arc<GuardFn>>) -> Arc<Mutex<Vec<ChainOutcome>>> {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = outcomes.clone();
        GuardChain::new(GuardPhase::Before, guards, loc("/to"), loc("/from"), ErrorHandlers::new())
            .stall_warning(Some(Duration::from_millis(10)))
            .run(move |outcome| sink.lock().unwrap().push(outcome));
        outcomes
    }

    #[tokio::test]
    async fn test_stall_warning_logged_for_parked_guard() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let parked: Arc<Mutex<Option<Next>>> = Arc::new(Mutex::new(None));
        let slot = parked.clone();
        let outcomes = run_with_stall_warning(vec![guard(move |_, _, next| {
            *slot.lock().unwrap() = Some(next);
            Ok(())
        })]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(logs.contains("guard has not called next"));
        assert!(outcomes.lock().unwrap().is_empty());

        let next = parked.lock().unwrap().take().unwrap();
        next.proceed();
        assert!(matches!(outcomes.lock().unwrap()[0], ChainOutcome::Proceed));
    }

    #[tokio::test]
    async fn test_no_stall_warning_when_guard_continues() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let outcomes = run_with_stall_warning(vec![guard(|_, _, next| {
            next.proceed();
            Ok(())
        })]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(outcomes.lock().unwrap()[0], ChainOutcome::Proceed));
        assert!(!logs.contains("guard has not called next"));
    }

    #[test]
    fn test_after_hooks_isolated() {
        let ran = Arc::new(AtomicUsize::new(0));
        let hooks: Registry<AfterHookFn> = Registry::new("after");
        let r1 = ran.clone();
        hooks.register(Arc::new(move |_: &RouteLocation, _: &RouteLocation| -> GuardResult {
            r1.fetch_add(1, Ordering::SeqCst);
            Err(GuardError::msg("first fails"))
        }));
        hooks.register(Arc::new(|_: &RouteLocation, _: &RouteLocation| -> GuardResult {
            panic!("second panics")
        }));
        let r3 = ran.clone();
        hooks.register(Arc::new(move |_: &RouteLocation, _: &RouteLocation| -> GuardResult {
            r3.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let (errors, handled) = counting_handlers();
        let failures = run_after_hooks(&hooks.snapshot(), &loc("/to"), &loc("/from"), &errors);
        assert_eq!(failures, 2);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(handled.load(Ordering::SeqCst), 2);
    }
}
