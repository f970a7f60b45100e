//! Unit test harness for frosting-motion.
//!
//! Exercises configuration parsing and validation through the public API.

mod config_parsing;
mod config_validation;
