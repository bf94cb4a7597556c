//! Normalized navigation source/target.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::host::PageEntry;
use crate::location::query::{parse_query, serialize_query, Query};
use crate::location::{normalize_path, LocationError};

/// Description of where a navigation comes from or goes to.
///
/// Built fresh on every transition. `path` never carries the query string;
/// `full_path` is the input as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLocation {
    pub path: String,
    pub full_path: String,
    pub query: Query,
    pub name: String,
    pub meta: Map<String, Value>,
    pub hash: String,
}

impl RouteLocation {
    /// Build a location from a full path such as `/pages/a?id=1`.
    pub fn parse(full_path: &str) -> Result<Self, LocationError> {
        Self::with_query(full_path, Query::new())
    }

    /// Build a location, overlaying `extra` on top of the parsed query.
    pub fn with_query(full_path: &str, extra: Query) -> Result<Self, LocationError> {
        let (path, raw_query) = match full_path.split_once('?') {
            Some((path, raw)) => (path, raw),
            None => (full_path, ""),
        };

        let mut query = if raw_query.is_empty() {
            Query::new()
        } else {
            parse_query(raw_query)?
        };
        query.extend(extra);

        Ok(Self {
            path: path.to_string(),
            full_path: full_path.to_string(),
            query,
            ..Self::default()
        })
    }

    /// Build a location from a page on the host's stack.
    ///
    /// Hosts report routes without a leading `/`; the location always has one.
    pub fn from_page(page: &PageEntry) -> Self {
        let path = normalize_path(&page.route);
        Self {
            full_path: format!("{path}{}", serialize_query(&page.options)),
            path,
            query: page.options.clone(),
            ..Self::default()
        }
    }

    /// The root location used before the host reports any page.
    pub fn root() -> Self {
        Self {
            path: "/".to_string(),
            full_path: "/".to_string(),
            ..Self::default()
        }
    }

    /// Alias of [`RouteLocation::query`].
    pub fn params(&self) -> &Query {
        &self.query
    }

    /// Look up a single query value.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}
