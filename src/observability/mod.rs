//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline decisions (lock, guards, native calls)
//!     → tracing events with structured fields
//!     → metrics.rs (counters, lock gauge)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → whatever metrics recorder the application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics exporter; without a recorder the
//!   `metrics` macros are no-ops
//! - Log filter comes from config and can be overridden by `RUST_LOG`

pub mod logging;
pub mod metrics;
