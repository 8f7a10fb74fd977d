//! Fuel route CLI library.
//!
//! Command handlers, output formatting and logging setup for the `fuelroute`
//! binary. Kept as a library so handlers can be tested without spawning a
//! process.

pub mod commands;
pub mod logging;
pub mod output;
