//! Host environment collaborator.
//!
//! # Data Flow
//! ```text
//! NavigationHost::call(kind, request, callback)
//!     → interceptor.invoke(call, request, resume)      (if installed)
//!     → resume.proceed(request') / resume.reject(err)
//!     → host performs the transition
//!     → interceptor.success | interceptor.fail
//!     → interceptor.complete
//!     → page-show listeners
//!     → callback(outcome)
//! ```
//!
//! # Design Decisions
//! - The host owns the page stack; the router only reads it
//! - Every call gets a host-assigned `CallId` so per-call state can be
//!   tracked across the separate interceptor hooks
//! - One interceptor per primitive; installing again replaces it

pub mod memory;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NavigationError;
use crate::location::{EventMap, Query};

pub use memory::{MemoryHost, PerformedCall};

/// The five host navigation primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    /// Open a new page on top of the stack.
    Push,
    /// Replace the top page.
    Replace,
    /// Close every page and open one.
    ReplaceAll,
    /// Switch to a tab page, closing every non-tab page.
    SwitchTab,
    /// Pop one or more pages.
    Back,
}

impl NavigationKind {
    pub const ALL: [NavigationKind; 5] = [
        NavigationKind::Push,
        NavigationKind::Replace,
        NavigationKind::ReplaceAll,
        NavigationKind::SwitchTab,
        NavigationKind::Back,
    ];

    /// The host's name for the primitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationKind::Push => "navigateTo",
            NavigationKind::Replace => "redirectTo",
            NavigationKind::ReplaceAll => "reLaunch",
            NavigationKind::SwitchTab => "switchTab",
            NavigationKind::Back => "navigateBack",
        }
    }
}

impl fmt::Display for NavigationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-assigned identifier of one primitive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One open page as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Route without a leading `/`, e.g. `pages/index/index`.
    pub route: String,
    /// Launch options (the query the page was opened with).
    pub options: Query,
}

impl PageEntry {
    pub fn new(route: impl Into<String>, options: Query) -> Self {
        Self {
            route: route.into(),
            options,
        }
    }
}

/// Transition animation hints. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Animation {
    pub animation_type: Option<String>,
    pub duration_ms: Option<u32>,
}

/// Where a primitive call goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeTarget {
    Url(String),
    Back { delta: u32 },
}

/// Parameters of a primitive call.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    pub target: NativeTarget,
    pub events: EventMap,
    pub animation: Animation,
}

impl NativeRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            target: NativeTarget::Url(url.into()),
            events: EventMap::new(),
            animation: Animation::default(),
        }
    }

    pub fn back(delta: u32) -> Self {
        Self {
            target: NativeTarget::Back { delta },
            events: EventMap::new(),
            animation: Animation::default(),
        }
    }

    pub fn with_events(mut self, events: EventMap) -> Self {
        self.events = events;
        self
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = animation;
        self
    }

    /// The target URL, for every primitive except back.
    pub fn target_url(&self) -> Option<&str> {
        match &self.target {
            NativeTarget::Url(url) => Some(url),
            NativeTarget::Back { .. } => None,
        }
    }

    /// Pages to pop; `0` counts as `1`.
    pub fn back_delta(&self) -> Option<u32> {
        match self.target {
            NativeTarget::Back { delta } => Some(delta.max(1)),
            NativeTarget::Url(_) => None,
        }
    }
}

/// Successful primitive result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeResponse {
    pub kind: NavigationKind,
    /// Host status line, e.g. `navigateTo:ok`.
    pub message: String,
}

impl NativeResponse {
    pub fn ok(kind: NavigationKind) -> Self {
        Self {
            kind,
            message: format!("{}:ok", kind.as_str()),
        }
    }
}

/// Settled result of a primitive call.
pub type NativeOutcome = Result<NativeResponse, NavigationError>;

/// Caller-side completion callback of a primitive call.
pub type NativeCallback = Box<dyn FnOnce(NativeOutcome) + Send>;

/// Continuation handed to [`Interceptor::invoke`].
///
/// `proceed` lets the host perform the call (possibly with new parameters);
/// `reject` fails the call without performing it.
pub struct Resume(Box<dyn FnOnce(Result<NativeRequest, NavigationError>) + Send>);

impl Resume {
    pub fn new<F>(resume: F) -> Self
    where
        F: FnOnce(Result<NativeRequest, NavigationError>) + Send + 'static,
    {
        Self(Box::new(resume))
    }

    pub fn proceed(self, request: NativeRequest) {
        (self.0)(Ok(request));
    }

    pub fn reject(self, error: NavigationError) {
        (self.0)(Err(error));
    }
}

impl fmt::Debug for Resume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resume")
    }
}

/// Hooks the host fires around one primitive.
pub trait Interceptor: Send + Sync {
    /// Runs before the host performs the call.
    fn invoke(&self, call: CallId, request: NativeRequest, resume: Resume);

    /// The call succeeded.
    fn success(&self, _call: CallId, _response: &NativeResponse) {}

    /// The host failed to perform the call.
    fn fail(&self, _call: CallId, _error: &NavigationError) {}

    /// The performed call settled, whatever the outcome.
    fn complete(&self, _call: CallId) {}
}

/// Page-shown notification callback.
pub type PageShowListener = Arc<dyn Fn() + Send + Sync>;

/// Handle of a registered page-shown listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Navigation primitives and page-stack introspection offered by a host.
pub trait NavigationHost: Send + Sync {
    /// Issue a primitive call. `callback` fires once the call settles.
    fn call(&self, kind: NavigationKind, request: NativeRequest, callback: NativeCallback);

    /// Install the interceptor for `kind`, replacing any previous one.
    fn add_interceptor(&self, kind: NavigationKind, interceptor: Arc<dyn Interceptor>);

    /// Remove the interceptor for `kind` if it is still `interceptor`.
    ///
    /// Returns `false` when another interceptor has replaced it since.
    fn remove_interceptor(&self, kind: NavigationKind, interceptor: &Arc<dyn Interceptor>) -> bool;

    /// Currently open pages, bottom first.
    fn current_pages(&self) -> Vec<PageEntry>;

    /// Register a listener fired whenever a page is shown.
    fn on_page_show(&self, listener: PageShowListener) -> ListenerId;

    /// Remove a page-shown listener.
    fn off_page_show(&self, id: ListenerId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let names: Vec<_> = NavigationKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["navigateTo", "redirectTo", "reLaunch", "switchTab", "navigateBack"]
        );
    }

    #[test]
    fn test_back_delta_zero_counts_as_one() {
        assert_eq!(NativeRequest::back(0).back_delta(), Some(1));
        assert_eq!(NativeRequest::back(3).back_delta(), Some(3));
        assert_eq!(NativeRequest::url("/a").back_delta(), None);
    }

    #[test]
    fn test_ok_response_message() {
        assert_eq!(NativeResponse::ok(NavigationKind::Push).message, "navigateTo:ok");
    }
}
