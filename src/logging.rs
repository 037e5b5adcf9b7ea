//! Log filter construction for the steptrack binary.
//!
//! `RUST_LOG` wins over the configured `logging.level`, matching the usual
//! `tracing-subscriber` convention.

use mockable::Env;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Builds the `tracing` filter for a run.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` when the chosen directive is not a
/// valid `EnvFilter` directive.
pub fn build_filter<E: Env>(config: &LoggingConfig, env: &E) -> Result<EnvFilter> {
    let (field, directive) = match env.string("RUST_LOG") {
        Some(value) if !value.trim().is_empty() => ("RUST_LOG", value),
        _ => ("logging.level", config.level.clone()),
    };
    EnvFilter::try_new(&directive).map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("'{directive}' is not a valid log filter: {e}"),
        }
        .into()
    })
}
