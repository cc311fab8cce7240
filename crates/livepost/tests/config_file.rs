//! Configuration loading from a TOML file layered over compiled defaults.

use std::fs;

use livepost::LivepostConfig;

#[test]
fn loads_values_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("livepost.toml");
    fs::write(
        &path,
        r#"
previewable_post_types = ["post", "recipe"]
date_format = "%d/%m/%Y %H:%M:%S"
"#,
    )
    .unwrap();

    let config = LivepostConfig::load(Some(&path)).unwrap();
    assert_eq!(config.previewable_post_types(), vec!["post", "recipe"]);
    assert_eq!(config.date_format, "%d/%m/%Y %H:%M:%S");
    assert!(config.is_previewable("recipe"));
    assert!(!config.is_previewable("page"));
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("livepost.toml");
    fs::write(&path, "").unwrap();

    let config = LivepostConfig::load(Some(&path)).unwrap();
    assert_eq!(config.previewable_post_types(), vec!["post", "page"]);
    assert_eq!(config.date_format, "%Y-%m-%d %H:%M:%S");
}

#[test]
fn config_round_trips_through_toml() {
    let config = LivepostConfig {
        previewable_post_types: Some(vec!["post".into()]),
        date_format: "%Y-%m-%d %H:%M:%S".into(),
    };

    let serialized = toml::to_string(&config).unwrap();
    let reparsed: LivepostConfig = toml::from_str(&serialized).unwrap();
    assert_eq!(reparsed, config);
}
