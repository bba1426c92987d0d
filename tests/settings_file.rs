use spectrogram_generator::settings::{Settings, SettingsError};

#[test]
fn first_run_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("spectrogram_config.toml");

    let settings = Settings::load_or_create(&path).unwrap();
    assert_eq!(settings, Settings::default());
    assert!(path.is_file());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[DEFAULT]"));
    assert!(text.contains("[ZOOM]"));
}

#[test]
fn save_overwrites_and_load_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut settings = Settings::default();
    settings.full.width = "1200".into();
    settings.zoom.zoom_duration = "0:10".into();
    settings.full.sox_path = "/opt/sox/bin/sox".into();
    settings.save(&path).unwrap();

    let loaded = Settings::load_or_create(&path).unwrap();
    assert_eq!(loaded, settings);

    settings.full.width = "800".into();
    settings.save(&path).unwrap();
    assert_eq!(Settings::load(&path).unwrap().full.width, "800");
}

#[test]
fn user_typed_text_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut settings = Settings::default();
    settings.full.width = "12x".into();
    settings.save(&path).unwrap();
    assert_eq!(Settings::load(&path).unwrap().full.width, "12x");
}

#[test]
fn corrupt_file_is_reported_and_defaults_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[DEFAULT\nwidth = ").unwrap();

    assert!(matches!(Settings::load(&path), Err(SettingsError::Parse(_))));
    assert_eq!(Settings::load_or_default(&path), Settings::default());
}

#[test]
fn missing_file_is_an_io_error_for_plain_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::Io { .. }));
}
