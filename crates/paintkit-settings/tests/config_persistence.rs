use paintkit_settings::{Config, FillType, MediaMode, SettingsPersistence, TravelAlgorithm};
use tempfile::TempDir;

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.fill.fill_type = "cam".to_string();
    config.fill.hatch = true;
    config.travel.travel_algorithm = TravelAlgorithm::TspOpt;
    config.travel.seed = Some(7);
    config.job.media_mode = MediaMode::Pen;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.fill.resolve_fill_type().unwrap(), FillType::Cam);
}

#[test]
fn test_json_round_trip_uses_camel_case() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    Config::default().save_to_file(&path).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"fillSpacing\""));
    assert!(raw.contains("\"strokeOvershoot\""));
    assert!(raw.contains("\"iterationMultiplier\""));

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    let err = Config::default().save_to_file(&path).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"fill": {"fillSpacing": -2.0}}"#).unwrap();
    let err = Config::load_from_file(&path).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_load_or_default_falls_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let settings = SettingsPersistence::load_or_default(Some(&path));
    assert_eq!(settings.config(), &Config::default());
    assert_eq!(settings.path(), Some(path.as_path()));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("paintkit").join("config.toml");

    let mut settings = SettingsPersistence::new();
    settings.config_mut().canvas.margin = 12.0;
    settings.save_to_file(&path).unwrap();

    let loaded = SettingsPersistence::load_from_file(&path).unwrap();
    assert_eq!(loaded.config().canvas.margin, 12.0);
}
