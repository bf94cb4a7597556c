//! Route table.
//!
//! Ordered, mutable list of route records. Kept for callers that want to
//! attach metadata to paths; navigation never consults it.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the route table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub meta: Map<String, Value>,
}

impl RouteRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    records: Arc<RwLock<Vec<RouteRecord>>>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn add_route(&self, record: RouteRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Remove the first record named `name`.
    pub fn remove_route(&self, name: &str) -> bool {
        self.remove_route_by(|record| record.name == name)
    }

    /// Remove the first record matching `predicate`.
    pub fn remove_route_by<F>(&self, predicate: F) -> bool
    where
        F: Fn(&RouteRecord) -> bool,
    {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.iter().position(|record| predicate(record)) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|record| record.name == name)
    }

    /// Find the record registered for `path` (leading `/` optional).
    pub fn find_by_path(&self, path: &str) -> Option<RouteRecord> {
        let wanted = path.trim_start_matches('/');
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.path.trim_start_matches('/') == wanted)
            .cloned()
    }

    pub fn routes(&self) -> Vec<RouteRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
