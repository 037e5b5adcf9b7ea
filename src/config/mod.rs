//! Configuration system for steptrack.
//!
//! This module provides the configuration structures and CLI definitions for
//! the steptrack binary. Layers are merged with the `ortho_config` crate:
//! CLI flags override environment variables, which override configuration
//! files, which override defaults.
//!
//! The configuration file is expected at `~/.config/steptrack/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! test_name = "checkout_flow"
//!
//! [logging]
//! level = "debug"
//!
//! [reconciliation]
//! mode = "lenient"
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{CheckArgs, Cli, Commands};
pub use loader::{env_var_names, load_config, load_config_with_env};
pub use types::{AppConfig, LoggingConfig, ReconciliationConfig};
