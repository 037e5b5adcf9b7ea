//! Shared fixtures and helper functions for config tests.

use crate::config::AppConfig;
use crate::tracker::ReconciliationMode;
use ortho_config::{MergeComposer, toml};
use rstest::fixture;
use std::sync::Arc;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let source = r#"
        test_name = "checkout_flow"

        [logging]
        level = "steptrack=debug"

        [reconciliation]
        mode = "lenient"
    "#;

    toml::from_str(source).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let source = r#"
        test_name = "smoke"
    "#;

    toml::from_str(source).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, ortho_config::serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.test_name.is_none(), "test_name should be None");
    assert_eq!(
        config.logging.level, "info",
        "logging.level should be info"
    );
    assert_eq!(
        config.reconciliation.mode,
        ReconciliationMode::Strict,
        "reconciliation.mode should be Strict"
    );
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers for
/// testing layer precedence.
pub fn create_composer_with_file_and_env()
-> Result<MergeComposer, ortho_config::serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "test_name": "from-file",
            "logging": { "level": "warn" }
        }),
        None,
    );

    composer.push_environment(json!({
        "test_name": "from-env"
    }));

    Ok(composer)
}
