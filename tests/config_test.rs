//! Tests for layered settings loading

use std::fs;

use tempfile::TempDir;

use audtarget::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_loading_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
provider = "lotame"

[grammar]
max_inclusion_groups = 3
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).unwrap();

    assert_eq!(settings.provider, "lotame");
    assert_eq!(settings.grammar.max_inclusion_groups, 3);
    assert_eq!(settings.grammar.max_exclusion_groups, 1);
    assert_eq!(settings.category_key("42"), "lotame:42");
}

#[test]
fn given_invalid_local_config_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "provider = [").unwrap();

    let err = Settings::load(Some(dir.path())).unwrap_err();

    assert!(err.to_string().contains(".audtarget.toml"), "got: {err}");
}

#[test]
fn given_effective_settings_when_rendering_toml_then_round_trips() {
    let settings = Settings::default();
    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed, settings);
}
