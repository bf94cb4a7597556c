//! In-memory host with a simulated page stack.
//!
//! # Responsibilities
//! - Implement the five primitives over a `Vec<PageEntry>`
//! - Fire interceptor hooks in host order
//! - Enforce the usual host rules (tab pages, unknown pages, stack depth)
//!
//! # Design Decisions
//! - `invoke` runs synchronously inside `call`; the transition itself is
//!   queued and applied by `run_until_idle`, so two calls issued back to
//!   back overlap the way they do on a real host
//! - No lock is held while interceptors, listeners or callbacks run

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::HostConfig;
use crate::error::NavigationError;
use crate::host::{
    CallId, Interceptor, ListenerId, NativeCallback, NativeOutcome, NativeRequest, NativeResponse,
    NativeTarget, NavigationHost, NavigationKind, PageEntry, PageShowListener, Resume,
};
use crate::location::query::extract_query;
use crate::location::Query;

/// A transition the host actually performed (or attempted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformedCall {
    pub kind: NavigationKind,
    pub target: NativeTarget,
    pub succeeded: bool,
}

struct Task {
    kind: NavigationKind,
    call: CallId,
    request: NativeRequest,
    interceptor: Option<Arc<dyn Interceptor>>,
    callback: NativeCallback,
}

type TaskQueue = Arc<Mutex<VecDeque<Task>>>;

/// Deterministic host used by the binary and tests.
pub struct MemoryHost {
    config: HostConfig,
    pages: Mutex<Vec<PageEntry>>,
    interceptors: Mutex<HashMap<NavigationKind, Arc<dyn Interceptor>>>,
    listeners: Mutex<Vec<(ListenerId, PageShowListener)>>,
    next_listener: AtomicU64,
    queue: TaskQueue,
    performed: Mutex<Vec<PerformedCall>>,
}

impl MemoryHost {
    /// Create a host with the configured entry page open.
    pub fn new(config: HostConfig) -> Self {
        let entry = PageEntry::new(trim_route(&config.entry_page), Query::new());
        Self {
            config,
            pages: Mutex::new(vec![entry]),
            interceptors: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            performed: Mutex::new(Vec::new()),
        }
    }

    /// Apply queued transitions until none are left. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match task {
                Some(task) => {
                    self.perform(task);
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Number of queued, not yet applied transitions.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Transitions applied so far.
    pub fn performed(&self) -> Vec<PerformedCall> {
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an interceptor is installed for `kind`.
    pub fn has_interceptor(&self, kind: NavigationKind) -> bool {
        self.interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    /// Number of registered page-shown listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Host-initiated return to a tab page (e.g. the user taps the tab bar).
    ///
    /// Bypasses every primitive and interceptor; only page-shown fires.
    pub fn reenter_tab(&self, route: &str) -> Result<(), NavigationError> {
        let route = trim_route(route);
        if !self.is_tab(&route) {
            return Err(self.native_error(
                NavigationKind::SwitchTab,
                format!("`{route}` is not a tab page"),
            ));
        }
        *self.pages.lock().unwrap_or_else(PoisonError::into_inner) =
            vec![PageEntry::new(route, Query::new())];
        self.notify_page_show();
        Ok(())
    }

    /// Fire page-shown listeners without changing the stack.
    pub fn notify_page_show(&self) {
        let listeners: Vec<PageShowListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn interceptor(&self, kind: NavigationKind) -> Option<Arc<dyn Interceptor>> {
        self.interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    fn perform(&self, task: Task) {
        let Task {
            kind,
            call,
            request,
            interceptor,
            callback,
        } = task;

        let outcome = self.apply(kind, &request);
        tracing::debug!(
            %call,
            kind = %kind,
            native = ?request.target,
            ok = outcome.is_ok(),
            "host transition applied"
        );
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PerformedCall {
                kind,
                target: request.target.clone(),
                succeeded: outcome.is_ok(),
            });

        if let Some(interceptor) = &interceptor {
            match &outcome {
                Ok(response) => interceptor.success(call, response),
                Err(error) => interceptor.fail(call, error),
            }
            interceptor.complete(call);
        }
        if outcome.is_ok() {
            self.notify_page_show();
        }
        callback(outcome);
    }

    fn apply(&self, kind: NavigationKind, request: &NativeRequest) -> NativeOutcome {
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);

        if let NativeTarget::Back { .. } = request.target {
            let delta = request.back_delta().unwrap_or(1) as usize;
            if pages.len() <= 1 {
                return Err(self.native_error(kind, "cannot go back from the first page"));
            }
            let keep = pages.len().saturating_sub(delta).max(1);
            pages.truncate(keep);
            return Ok(NativeResponse::ok(kind));
        }

        let url = request.target_url().unwrap_or_default();
        let route = trim_route(url.split_once('?').map_or(url, |(path, _)| path));
        let options = extract_query(url)?;

        if !self.is_known(&route) {
            return Err(self.native_error(kind, format!("page `{route}` is not found")));
        }
        let is_tab = self.is_tab(&route);

        match kind {
            NavigationKind::Push => {
                if is_tab {
                    return Err(self.native_error(kind, "can not navigateTo a tabbar page"));
                }
                if pages.len() >= self.config.max_stack_depth {
                    return Err(self.native_error(
                        kind,
                        format!("page stack limit of {} reached", self.config.max_stack_depth),
                    ));
                }
                pages.push(PageEntry::new(route, options));
            }
            NavigationKind::Replace => {
                if is_tab {
                    return Err(self.native_error(kind, "can not redirectTo a tabbar page"));
                }
                pages.pop();
                pages.push(PageEntry::new(route, options));
            }
            NavigationKind::ReplaceAll => {
                *pages = vec![PageEntry::new(route, options)];
            }
            NavigationKind::SwitchTab => {
                if !is_tab {
                    return Err(self.native_error(kind, "can not switchTab to a non-tabbar page"));
                }
                *pages = vec![PageEntry::new(route, Query::new())];
            }
            NavigationKind::Back => {
                return Err(self.native_error(kind, "navigateBack takes a delta, not a url"));
            }
        }
        Ok(NativeResponse::ok(kind))
    }

    fn is_known(&self, route: &str) -> bool {
        self.config.pages.is_empty()
            || self.config.pages.iter().any(|page| trim_route(page) == route)
            || self.is_tab(route)
    }

    fn is_tab(&self, route: &str) -> bool {
        self.config.tab_pages.iter().any(|page| trim_route(page) == route)
    }

    fn native_error(&self, kind: NavigationKind, message: impl Into<String>) -> NavigationError {
        NavigationError::Native {
            kind,
            message: message.into(),
        }
    }
}

impl NavigationHost for MemoryHost {
    fn call(&self, kind: NavigationKind, request: NativeRequest, callback: NativeCallback) {
        let call = CallId::new();
        tracing::debug!(%call, kind = %kind, native = ?request.target, "host call");

        let Some(interceptor) = self.interceptor(kind) else {
            self.queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(Task {
                    kind,
                    call,
                    request,
                    interceptor: None,
                    callback,
                });
            return;
        };

        let queue = self.queue.clone();
        let hooks = interceptor.clone();
        let resume = Resume::new(move |decision| match decision {
            Ok(request) => {
                queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(Task {
                        kind,
                        call,
                        request,
                        interceptor: Some(hooks),
                        callback,
                    });
            }
            Err(error) => {
                tracing::debug!(%call, kind = %kind, error = %error, "host call rejected by interceptor");
                callback(Err(error));
            }
        });
        interceptor.invoke(call, request, resume);
    }

    fn add_interceptor(&self, kind: NavigationKind, interceptor: Arc<dyn Interceptor>) {
        self.interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, interceptor);
    }

    fn remove_interceptor(&self, kind: NavigationKind, interceptor: &Arc<dyn Interceptor>) -> bool {
        let mut installed = self
            .interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match installed.get(&kind) {
            Some(current) if Arc::ptr_eq(current, interceptor) => {
                installed.remove(&kind);
                true
            }
            _ => false,
        }
    }

    fn current_pages(&self) -> Vec<PageEntry> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn on_page_show(&self, listener: PageShowListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    fn off_page_show(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(listener_id, _)| *listener_id != id);
    }
}

fn trim_route(route: &str) -> String {
    route.trim_start_matches('/').to_string()
}
