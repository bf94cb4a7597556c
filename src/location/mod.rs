//! Route location model.
//!
//! # Data Flow
//! ```text
//! Caller input (string or path object)
//!     → target.rs (normalize, serialise query)
//!     → NativeUrl handed to a host primitive
//!
//! Intercepted URL / host page
//!     → route.rs (split on '?', parse query)
//!     → RouteLocation seen by guards
//! ```
//!
//! # Design Decisions
//! - Locations are values, rebuilt per transition
//! - Parse and serialise are inverses on the query step (ordering aside)
//! - No route matching: `name` and `meta` stay empty

pub mod query;
pub mod route;
pub mod target;

use thiserror::Error;

pub use query::{parse_query, serialize_query, Query};
pub use route::RouteLocation;
pub use target::{EventMap, NativeUrl, RouteTarget};

/// Errors raised while decoding locations.
#[derive(Debug, Clone, Error)]
pub enum LocationError {
    /// A `%` not followed by two hex digits.
    #[error("malformed percent escape in query component `{component}`")]
    MalformedEscape { component: String },

    /// A query component decoded into invalid UTF-8.
    #[error("failed to decode query component `{component}`: {source}")]
    Decode {
        component: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Prefix `/` onto relative paths.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("pages/a"), "/pages/a");
        assert_eq!(normalize_path("/pages/a"), "/pages/a");
        assert_eq!(normalize_path(""), "/");
    }
}
