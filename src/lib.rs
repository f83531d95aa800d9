//! Sell-Through Checker - marketplace sold/live sell-through tracking
//!
//! Runs a marketplace search for each item in a list, reads the sold and live
//! listing counts from the result pages, and keeps a deduplicated history of
//! sell-through percentages that can be reviewed and exported.

// Module declarations
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;
