//! Utilities shared between the Hiroba binaries and library crates.

pub mod logger;
pub mod time;
