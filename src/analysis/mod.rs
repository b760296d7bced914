//! Analysis modules.
//!
//! Facet extraction, aggregation, and timestamp normalization. Everything
//! here is pure and synchronous.

pub mod aggregator;
pub mod facets;
pub mod timestamp;

pub use aggregator::*;
pub use timestamp::{to_utc_with_offset, window_ending_at};
