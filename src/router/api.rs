//! Public navigation API.
//!
//! # Responsibilities
//! - Normalize caller targets into host primitive calls
//! - Refuse to start while the navigation lock is held
//! - Expose the host callback as a future
//!
//! # Design Decisions
//! - No guards run here; the interception adapter runs them for every call,
//!   whether it comes through this API or straight from the host
//! - A held lock is reported synchronously; the host is never called
//! - Error handlers are notified by the adapter, not here, so a native
//!   failure reaches them once

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::NavigationError;
use crate::host::{Animation, NativeOutcome, NativeRequest, NavigationKind};
use crate::location::RouteTarget;
use crate::observability::metrics;
use crate::router::Router;

/// Extra options for a forward navigation.
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    pub animation: Animation,
}

impl NavigateOptions {
    pub fn animation(animation_type: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            animation: Animation {
                animation_type: Some(animation_type.into()),
                duration_ms: Some(duration_ms),
            },
        }
    }
}

/// Options for a back navigation. A bare `u32` converts into a delta.
#[derive(Debug, Clone)]
pub struct BackOptions {
    pub delta: u32,
    pub animation: Animation,
}

impl Default for BackOptions {
    fn default() -> Self {
        Self {
            delta: 1,
            animation: Animation::default(),
        }
    }
}

impl From<u32> for BackOptions {
    fn from(delta: u32) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }
}

/// Outcome of a navigation started through the API.
///
/// Resolves once the host settles the call. Resolves to
/// [`NavigationError::Interrupted`] if the host drops the call unsettled.
#[derive(Debug)]
pub struct PendingNavigation {
    kind: NavigationKind,
    rx: oneshot::Receiver<NativeOutcome>,
}

impl PendingNavigation {
    pub fn kind(&self) -> NavigationKind {
        self.kind
    }

    /// Non-blocking check; `None` while the call is still in flight.
    pub fn try_result(&mut self) -> Option<NativeOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(NavigationError::Interrupted)),
        }
    }
}

impl Future for PendingNavigation {
    type Output = NativeOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(NavigationError::Interrupted)))
    }
}

impl Router {
    /// Open `to` on top of the page stack.
    pub fn push(&self, to: impl Into<RouteTarget>) -> Result<PendingNavigation, NavigationError> {
        self.push_with(to, NavigateOptions::default())
    }

    /// [`Router::push`] with animation options.
    pub fn push_with(
        &self,
        to: impl Into<RouteTarget>,
        options: NavigateOptions,
    ) -> Result<PendingNavigation, NavigationError> {
        let native = to.into().to_native();
        let request = NativeRequest::url(native.url)
            .with_events(native.events)
            .with_animation(options.animation);
        self.dispatch(NavigationKind::Push, request)
    }

    /// Switch to a tab page.
    pub fn push_tab(&self, to: impl Into<RouteTarget>) -> Result<PendingNavigation, NavigationError> {
        self.dispatch_url(NavigationKind::SwitchTab, to.into())
    }

    /// Replace the current page.
    pub fn replace(&self, to: impl Into<RouteTarget>) -> Result<PendingNavigation, NavigationError> {
        self.dispatch_url(NavigationKind::Replace, to.into())
    }

    /// Close every page and open `to`.
    pub fn replace_all(
        &self,
        to: impl Into<RouteTarget>,
    ) -> Result<PendingNavigation, NavigationError> {
        self.dispatch_url(NavigationKind::ReplaceAll, to.into())
    }

    /// Go back `delta` pages (`router.back(2)`) or with full options.
    pub fn back(&self, options: impl Into<BackOptions>) -> Result<PendingNavigation, NavigationError> {
        let options = options.into();
        let request = NativeRequest::back(options.delta).with_animation(options.animation);
        self.dispatch(NavigationKind::Back, request)
    }

    /// Resolves immediately; the router is usable as soon as it is built.
    pub async fn is_ready(&self) {}

    fn dispatch_url(
        &self,
        kind: NavigationKind,
        target: RouteTarget,
    ) -> Result<PendingNavigation, NavigationError> {
        self.dispatch(kind, NativeRequest::url(target.to_native().url))
    }

    fn dispatch(
        &self,
        kind: NavigationKind,
        request: NativeRequest,
    ) -> Result<PendingNavigation, NavigationError> {
        if self.inner.lock.is_held() {
            tracing::warn!(kind = %kind, native = ?request.target, "navigation rejected: lock held");
            metrics::record_lock_rejection();
            return Err(NavigationError::Locked);
        }

        tracing::debug!(kind = %kind, native = ?request.target, "navigation requested");
        let (tx, rx) = oneshot::channel();
        self.inner.host.call(
            kind,
            request,
            Box::new(move |outcome| {
                // The caller may have dropped the future; nothing to report then.
                let _ = tx.send(outcome);
            }),
        );
        Ok(PendingNavigation { kind, rx })
    }
}
