//! Utility functions for vigil
//!
//! Provides environment variable handling and settings loading.

pub mod env;

pub use env::{load_env, load_oracle_settings, load_scan_settings};
