//! Configuration for the session core.
//!
//! Values come from built-in defaults, an optional TOML file and environment
//! overrides, in that order.

mod config;

pub use config::*;
