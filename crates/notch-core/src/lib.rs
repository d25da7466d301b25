//! Collection engine for `notch`: rule-set registry, device scheduler,
//! collation/writer, and driver orchestration.
//!
//! `notch-filter` (pure, no I/O) and `notch-common` (shared value types)
//! sit below this crate; `notch-cli` sits above it and owns the process
//! entry point.

pub mod collator;
pub mod collection;
pub mod config;
pub mod driver;
pub mod error;
pub mod external;
pub mod mock;
pub mod model;
pub mod rulesets;
pub mod scheduler;
pub mod target_cache;

pub use collection::Collection;
pub use driver::{Driver, DriverSummary, Selector};
