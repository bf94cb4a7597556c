//! Reactive current route.
//!
//! A single long-lived `RouteLocation` behind a `watch` channel. Updates
//! patch it field by field so subscribers see every change on the same
//! channel without re-subscribing.

use tokio::sync::watch;

use crate::location::RouteLocation;

#[derive(Debug, Clone)]
pub struct CurrentRoute {
    tx: watch::Sender<RouteLocation>,
}

impl CurrentRoute {
    pub fn new(initial: RouteLocation) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Copy of the current route.
    pub fn snapshot(&self) -> RouteLocation {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every later update.
    pub fn subscribe(&self) -> watch::Receiver<RouteLocation> {
        self.tx.subscribe()
    }

    /// Overwrite every field with `next`. Notifies only if something changed.
    pub fn update(&self, next: &RouteLocation) {
        self.tx.send_if_modified(|current| {
            if current == next {
                return false;
            }
            current.path.clone_from(&next.path);
            current.full_path.clone_from(&next.full_path);
            current.query.clone_from(&next.query);
            current.name.clone_from(&next.name);
            current.meta.clone_from(&next.meta);
            current.hash.clone_from(&next.hash);
            true
        });
    }
}

impl Default for CurrentRoute {
    fn default() -> Self {
        Self::new(RouteLocation::root())
    }
}
