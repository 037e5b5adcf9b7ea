//! Configuration loading with layered precedence.
//!
//! Layers are composed by hand with `MergeComposer` rather than through the
//! derived `load()`, because the clap `Cli` owns subcommand dispatch and
//! because typed environment values must fail fast instead of being ignored.
//!
//! # Environment Variable Handling
//!
//! `STEPTRACK_RECONCILIATION_MODE` must be `strict` or `lenient`; any other
//! value returns an error immediately rather than silently falling back to
//! the default. String fields such as `STEPTRACK_TEST_NAME` are always
//! accepted.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::{DefaultEnv, Env};
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Reconciliation mode (`strict`/`lenient`). Invalid values return an error.
    Mode,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    /// The environment variable name (e.g., `STEPTRACK_TEST_NAME`).
    env_var: &'static str,
    /// The JSON path segments (e.g., `["logging", "level"]`).
    path: &'static [&'static str],
    /// The expected value type.
    var_type: EnvVarType,
}

/// Table of all environment variables and their JSON paths.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "STEPTRACK_TEST_NAME",
        path: &["test_name"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "STEPTRACK_LOG_LEVEL",
        path: &["logging", "level"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "STEPTRACK_RECONCILIATION_MODE",
        path: &["reconciliation", "mode"],
        var_type: EnvVarType::Mode,
    },
];

/// Returns the list of environment variable names recognised by the config loader.
///
/// Tests use this to clear every `STEPTRACK_*` variable without keeping a
/// second hard-coded list in sync.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Load a configuration file and push it to the composer.
///
/// The parent directory is opened as a `cap_std` capability and the file is
/// read relative to it.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Load configuration with full layer precedence from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if configuration loading fails due to:
/// - An explicit `--config` path that does not exist
/// - Malformed configuration files
/// - An invalid `STEPTRACK_RECONCILIATION_MODE` value
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    load_config_with_env(cli, &DefaultEnv::new())
}

/// Load configuration with full layer precedence, reading environment
/// variables through `env`.
///
/// Sources, lowest precedence first:
/// 1. Application defaults defined in the struct
/// 2. Configuration file (`--config`, or discovered via `STEPTRACK_CONFIG_PATH`
///    and XDG paths)
/// 3. Environment variables prefixed with `STEPTRACK_`
/// 4. Command-line arguments (from the provided `Cli`)
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env<E: Env>(cli: &Cli, env: &E) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    // Layer 1: Defaults (serialised from AppConfig::default()).
    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    // Layer 2: Configuration file. An explicit path must exist.
    let config_path = match cli.config.clone() {
        Some(path) if path.exists() => Some(path),
        Some(path) => {
            return Err(ConfigError::FileNotFound {
                path: path.into_std_path_buf(),
            }
            .into());
        }
        None => discover_config_file(),
    };
    if let Some(ref path) = config_path {
        load_config_file(path, &mut composer)?;
    }

    // Layer 3: Environment variables.
    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    // Layer 4: CLI overrides.
    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;

    Ok(config)
}

/// Finds the first existing configuration file among the discovery candidates.
fn discover_config_file() -> Option<Utf8PathBuf> {
    let discovery = ConfigDiscovery::builder("steptrack")
        .env_var("STEPTRACK_CONFIG_PATH")
        .config_file_name("config.toml")
        .dotfile_name(".steptrack.toml")
        .build();
    discovery
        .candidates()
        .into_iter()
        .filter(|p| p.exists())
        .find_map(|p| Utf8PathBuf::try_from(p).ok())
}

/// Collect `STEPTRACK_*` environment variables into a JSON value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a typed variable has an unparseable
/// value.
fn collect_env_vars<E: Env>(env: &E) -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = env.string(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Mode => {
                let normalised = raw_value.trim().to_ascii_lowercase();
                if !matches!(normalised.as_str(), "strict" | "lenient") {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected strict or lenient, got '{raw_value}'"),
                    }
                    .into());
                }
                Value::String(normalised)
            }
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path in a JSON map, creating intermediate
/// objects as needed.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(ref test_name) = cli.test_name {
        overrides.insert("test_name".to_owned(), Value::String(test_name.clone()));
    }

    if cli.lenient {
        let mut reconciliation = Map::new();
        reconciliation.insert("mode".to_owned(), Value::String("lenient".to_owned()));
        overrides.insert("reconciliation".to_owned(), Value::Object(reconciliation));
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
