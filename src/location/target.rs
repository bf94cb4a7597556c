//! Caller-supplied navigation targets.
//!
//! # Responsibilities
//! - Accept a literal path or a path + query object
//! - Normalize relative paths to absolute ones
//! - Produce the URL handed to a host primitive
//!
//! # Design Decisions
//! - Event listeners travel with the target but are opaque to the pipeline

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::location::normalize_path;
use crate::location::query::{serialize_query, Query};

/// Listener for a page-to-page event channel.
pub type EventListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Named event listeners passed along with a push.
#[derive(Clone, Default)]
pub struct EventMap(HashMap<String, EventListener>);

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, event: impl Into<String>, listener: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.0.insert(event.into(), Arc::new(listener));
    }

    pub fn get(&self, event: &str) -> Option<&EventListener> {
        self.0.get(event)
    }

    /// Invoke the listener registered for `event`, if any.
    pub fn emit(&self, event: &str, payload: &Value) -> bool {
        match self.0.get(event) {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for EventMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// A navigation target as supplied by a caller or a redirecting guard.
#[derive(Debug, Clone)]
pub enum RouteTarget {
    /// A literal path, possibly with an inline query string.
    Path(String),
    /// A path plus query parameters to serialise.
    Location {
        path: String,
        query: Query,
        events: EventMap,
    },
}

impl RouteTarget {
    /// Start an object-style target.
    pub fn location(path: impl Into<String>) -> Self {
        RouteTarget::Location {
            path: path.into(),
            query: Query::new(),
            events: EventMap::new(),
        }
    }

    /// Add a query parameter. A literal path is promoted to an object target.
    pub fn with_query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (path, mut query, events) = self.into_parts();
        query.insert(key.into(), value.into());
        RouteTarget::Location {
            path,
            query,
            events,
        }
    }

    /// Attach an event listener. A literal path is promoted to an object target.
    pub fn with_event<F>(self, event: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let (path, query, mut events) = self.into_parts();
        events.insert(event, listener);
        RouteTarget::Location {
            path,
            query,
            events,
        }
    }

    fn into_parts(self) -> (String, Query, EventMap) {
        match self {
            RouteTarget::Path(path) => (path, Query::new(), EventMap::new()),
            RouteTarget::Location {
                path,
                query,
                events,
            } => (path, query, events),
        }
    }

    /// Resolve into the URL and events handed to a host primitive.
    pub fn to_native(&self) -> NativeUrl {
        match self {
            RouteTarget::Path(path) => NativeUrl {
                url: normalize_path(path),
                events: EventMap::new(),
            },
            RouteTarget::Location {
                path,
                query,
                events,
            } => NativeUrl {
                url: format!("{}{}", normalize_path(path), serialize_query(query)),
                events: events.clone(),
            },
        }
    }
}

impl From<&str> for RouteTarget {
    fn from(path: &str) -> Self {
        RouteTarget::Path(path.to_string())
    }
}

impl From<String> for RouteTarget {
    fn from(path: String) -> Self {
        RouteTarget::Path(path)
    }
}

impl From<&String> for RouteTarget {
    fn from(path: &String) -> Self {
        RouteTarget::Path(path.clone())
    }
}

/// URL plus events, ready for a host call.
#[derive(Debug, Clone, Default)]
pub struct NativeUrl {
    pub url: String,
    pub events: EventMap,
}
