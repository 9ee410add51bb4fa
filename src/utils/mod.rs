//! Utility functions and helpers
//!
//! This module contains time formatting and logging setup.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::clock_label;
