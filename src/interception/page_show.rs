//! Keeps the current route in step with pages the host shows on its own
//! (tab bar taps, back gestures, re-launches). Runs no guards.

use std::sync::Arc;

use crate::host::ListenerId;
use crate::location::RouteLocation;
use crate::router::RouterInner;

pub(crate) fn listen(router: &Arc<RouterInner>) -> ListenerId {
    let weak = Arc::downgrade(router);
    router.host.on_page_show(Arc::new(move || {
        let Some(router) = weak.upgrade() else {
            return;
        };
        let Some(page) = router.host.current_pages().pop() else {
            return;
        };
        if page.route.is_empty() {
            return;
        }
        let location = RouteLocation::from_page(&page);
        tracing::trace!(path = %location.full_path, "page shown");
        router.current.update(&location);
    }))
}
