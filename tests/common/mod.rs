//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use page_router::config::HostConfig;
use page_router::host::NativeOutcome;
use page_router::{MemoryHost, NavigationError, NavigationHost, NavigationKind, Router, RouterOptions};
use page_router::host::NativeRequest;

pub const INDEX: &str = "pages/index/index";
pub const DETAIL: &str = "pages/detail/index";
pub const LOGIN: &str = "pages/login/index";
pub const HOME: &str = "pages/home/index";
pub const MINE: &str = "pages/mine/index";

/// Host with a handful of pages, two of them tabs.
pub fn host() -> Arc<MemoryHost> {
    Arc::new(MemoryHost::new(HostConfig {
        entry_page: INDEX.to_string(),
        pages: [INDEX, DETAIL, LOGIN, HOME, MINE]
            .iter()
            .map(|page| page.to_string())
            .collect(),
        tab_pages: vec![HOME.to_string(), MINE.to_string()],
        max_stack_depth: 10,
    }))
}

/// Fresh host plus a router attached to it.
pub fn setup() -> (Arc<MemoryHost>, Router) {
    let host = host();
    let router = Router::new(RouterOptions::default(), host.clone());
    (host, router)
}

/// Collects the label of every error the router reports.
#[allow(dead_code)]
pub fn record_errors(router: &Router) -> Arc<Mutex<Vec<&'static str>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    router.on_error(move |err: &NavigationError| sink.lock().unwrap().push(err.label()));
    seen
}

/// Issue a primitive call straight to the host, bypassing the router API.
#[allow(dead_code)]
pub fn call_direct(
    host: &MemoryHost,
    kind: NavigationKind,
    request: NativeRequest,
) -> Arc<Mutex<Option<NativeOutcome>>> {
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    host.call(
        kind,
        request,
        Box::new(move |outcome| {
            *sink.lock().unwrap() = Some(outcome);
        }),
    );
    slot
}

/// Routes on the host's stack, bottom first.
#[allow(dead_code)]
pub fn stack(host: &MemoryHost) -> Vec<String> {
    host.current_pages().into_iter().map(|page| page.route).collect()
}
