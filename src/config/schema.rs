//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router
//! and its in-memory host. Every section has defaults, so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::router::RouteRecord;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// URL mode. Informational only; navigation behaves the same in both.
    pub mode: RouterMode,

    /// Seed entries of the route table.
    pub routes: Vec<RouteRecord>,

    /// Guard pipeline settings.
    pub navigation: NavigationConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// In-memory host settings.
    pub host: HostConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    #[default]
    History,
    Hash,
}

/// Guard pipeline settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Warn when a guard has not called `next` after this many milliseconds.
    pub guard_stall_warning_ms: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `page_router=debug`.
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "page_router=info".to_string(),
            json: false,
        }
    }
}

/// In-memory host settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Page open at start-up.
    pub entry_page: String,

    /// Known pages. Empty means every page exists.
    pub pages: Vec<String>,

    /// Pages reachable only through `switchTab`.
    pub tab_pages: Vec<String>,

    /// Maximum number of pages on the stack.
    #[serde(default = "default_max_stack_depth")]
    pub max_stack_depth: usize,
}

fn default_max_stack_depth() -> usize {
    10
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            entry_page: "pages/index/index".to_string(),
            pages: Vec::new(),
            tab_pages: Vec::new(),
            max_stack_depth: default_max_stack_depth(),
        }
    }
}
