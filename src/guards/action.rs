//! Guard decisions and the continuation guards call to report them.

use std::fmt;

use crate::guards::GuardPhase;
use crate::location::RouteTarget;

/// What a guard decided about the navigation.
#[derive(Debug, Clone)]
pub enum NavigationAction {
    /// Let the next guard (or the navigation) run.
    Proceed,
    /// Cancel the whole navigation.
    Abort,
    /// Navigate somewhere else using the same primitive.
    Redirect(RouteTarget),
    /// Back navigation only: go back this many pages instead.
    AdjustSteps(u32),
}

impl NavigationAction {
    pub fn is_proceed(&self) -> bool {
        matches!(self, NavigationAction::Proceed)
    }
}

type Resume = Box<dyn FnOnce(NavigationAction) + Send>;

/// Single-use continuation handed to every guard.
///
/// The chain waits until the guard consumes it. A guard may keep it and call
/// it later (for example after an async check). Dropping it unused stalls the
/// navigation for good.
pub struct Next {
    phase: Option<GuardPhase>,
    resume: Option<Resume>,
}

impl Next {
    pub(crate) fn new<F>(phase: GuardPhase, resume: F) -> Self
    where
        F: FnOnce(NavigationAction) + Send + 'static,
    {
        Self {
            phase: Some(phase),
            resume: Some(Box::new(resume)),
        }
    }

    /// A continuation backed by an arbitrary closure, for driving guards in isolation.
    pub fn from_fn<F>(resume: F) -> Self
    where
        F: FnOnce(NavigationAction) + Send + 'static,
    {
        Self {
            phase: None,
            resume: Some(Box::new(resume)),
        }
    }

    /// Continue with the next guard.
    pub fn proceed(self) {
        self.resolve(NavigationAction::Proceed);
    }

    /// Cancel the navigation.
    pub fn abort(self) {
        self.resolve(NavigationAction::Abort);
    }

    /// Send the navigation to another target.
    pub fn redirect(self, target: impl Into<RouteTarget>) {
        self.resolve(NavigationAction::Redirect(target.into()));
    }

    /// Change how many pages a back navigation pops.
    pub fn adjust_steps(self, delta: u32) {
        self.resolve(NavigationAction::AdjustSteps(delta));
    }

    /// Report an explicit decision.
    pub fn resolve(mut self, action: NavigationAction) {
        if let Some(resume) = self.resume.take() {
            resume(action);
        }
    }
}

impl Drop for Next {
    fn drop(&mut self) {
        if self.resume.is_some() {
            tracing::warn!(
                phase = ?self.phase,
                "guard dropped its continuation without calling it; navigation is stalled"
            );
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("phase", &self.phase)
            .field("pending", &self.resume.is_some())
            .finish()
    }
}
