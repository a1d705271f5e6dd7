//! # Keynav Util
//!
//! Helpers shared by the keynav crates that sit outside the navigation core:
//! the legacy numeric keycode table and the JSON configuration store.

pub mod config;
pub mod legacy_keycodes;

pub use config::{ConfigError, KeynavConfig, SelectorConfig, default_config_path, expand_tilde};
