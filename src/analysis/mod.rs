//! Analysis modules.
//!
//! Distribution summaries over the record collection.

pub mod aggregator;

pub use aggregator::*;
