//! Binding between the guard pipeline and the host's primitives.
//!
//! # Data Flow
//! ```text
//! host call (from the public API or direct)
//!     → adapter.rs invoke: build to/from, take lock
//!     → before chain → resolve chain
//!     → resume.proceed(request') | resume.reject(err) + release
//! host settles the call
//!     → success: current route, after hooks (push)
//!     → fail: release, error handlers
//!     → complete: release
//! page shown
//!     → page_show.rs: current route from the top page
//! ```
//!
//! # Design Decisions
//! - One interceptor per primitive sharing one in-flight ticket map keyed by
//!   `CallId`; removing the entry is what releases the lock
//! - Interceptors hold the router weakly
//! - Uninstall only removes the interceptors this router installed; a newer
//!   router on the same host keeps its own

pub mod adapter;
pub mod page_show;

use std::sync::Arc;

use dashmap::DashMap;

use crate::host::{CallId, Interceptor, ListenerId, NavigationHost, NavigationKind};
use crate::router::{LockTicket, RouterInner};

pub use adapter::NavigationInterceptor;

/// In-flight lock tickets by host call.
pub(crate) type TicketMap = Arc<DashMap<CallId, LockTicket>>;

/// What a router installed on its host.
pub(crate) struct Attachment {
    interceptors: Vec<(NavigationKind, Arc<dyn Interceptor>)>,
    listener: ListenerId,
    tickets: TicketMap,
}

pub(crate) fn install(router: &Arc<RouterInner>) -> Attachment {
    let tickets: TicketMap = Arc::new(DashMap::new());
    let mut interceptors = Vec::with_capacity(NavigationKind::ALL.len());
    for kind in NavigationKind::ALL {
        let interceptor: Arc<dyn Interceptor> = Arc::new(NavigationInterceptor::new(
            kind,
            Arc::downgrade(router),
            tickets.clone(),
        ));
        router.host.add_interceptor(kind, interceptor.clone());
        interceptors.push((kind, interceptor));
    }
    let listener = page_show::listen(router);
    tracing::debug!(kinds = interceptors.len(), "navigation interceptors installed");
    Attachment {
        interceptors,
        listener,
        tickets,
    }
}

pub(crate) fn uninstall(host: &dyn NavigationHost, attachment: Attachment) {
    let mut removed = 0;
    for (kind, interceptor) in &attachment.interceptors {
        if host.remove_interceptor(*kind, interceptor) {
            removed += 1;
        } else {
            tracing::debug!(kind = %kind, "interceptor replaced by another router; left in place");
        }
    }
    host.off_page_show(attachment.listener);
    let in_flight = attachment.tickets.len();
    attachment.tickets.clear();
    tracing::debug!(removed, in_flight, "navigation interceptors removed");
}
