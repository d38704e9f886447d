//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML file, fills in defaults for
//! anything absent, and validates the result before the loop starts.

pub mod config;
