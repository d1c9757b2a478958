//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the daemon's TOML configuration from the XDG
//! config directory and falls back to built-in defaults when the file does not
//! exist.  The daemon never writes the file.

pub mod config;
