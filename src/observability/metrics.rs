//! Navigation metrics.
//!
//! # Metrics
//! - `router_navigations_total` (counter): settled navigations by kind, outcome
//! - `router_lock_rejections_total` (counter): API calls refused by the lock
//! - `router_guard_failures_total` (counter): guard exceptions by phase
//! - `router_after_hook_failures_total` (counter): after hook exceptions
//! - `router_navigation_lock_held` (gauge): 1 while a navigation is in flight

use crate::guards::GuardPhase;
use crate::host::NavigationKind;

pub fn record_navigation(kind: NavigationKind, outcome: &'static str) {
    metrics::counter!(
        "router_navigations_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_lock_rejection() {
    metrics::counter!("router_lock_rejections_total").increment(1);
}

pub fn record_guard_failure(phase: GuardPhase) {
    metrics::counter!("router_guard_failures_total", "phase" => phase.as_str()).increment(1);
}

pub fn record_after_hook_failure() {
    metrics::counter!("router_after_hook_failures_total").increment(1);
}

pub fn set_lock_held(held: bool) {
    metrics::gauge!("router_navigation_lock_held").set(if held { 1.0 } else { 0.0 });
}
