//! Configuration data types for steptrack.

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::tracker::ReconciliationMode;

/// Name used for runs whose test name is configured nowhere.
const UNNAMED_TEST: &str = "unnamed";

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
    /// `steptrack=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

/// End-of-run reconciliation configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// How to treat an unfinished step that has no failed child.
    pub mode: ReconciliationMode,
}

/// Root application configuration.
///
/// Loaded from configuration files, environment variables, and command-line
/// arguments. The precedence order (lowest to highest) is: defaults,
/// configuration file, environment variables, command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `--config`
/// 2. Path specified via `STEPTRACK_CONFIG_PATH`
/// 3. `.steptrack.toml` in the current working directory
/// 4. `.steptrack.toml` in the home directory
/// 5. `~/.config/steptrack/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "STEPTRACK",
    discovery(
        app_name = "steptrack",
        env_var = "STEPTRACK_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".steptrack.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Name stamped onto every step of the run.
    pub test_name: Option<String>,

    /// Logging configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub logging: LoggingConfig,

    /// Reconciliation configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub reconciliation: ReconciliationConfig,
}

impl AppConfig {
    /// Resolves the test name for a run.
    ///
    /// A configured, non-blank `test_name` wins over `fallback` (typically the
    /// name declared by a step script). Surrounding whitespace is trimmed.
    #[must_use]
    pub fn resolve_test_name(&self, fallback: Option<&str>) -> String {
        [self.test_name.as_deref(), fallback]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(UNNAMED_TEST)
            .to_owned()
    }
}
