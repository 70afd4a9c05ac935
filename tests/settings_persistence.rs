use live_overlay::settings::Settings;
use live_overlay::Platform;
use tempfile::tempdir;

#[test]
fn empty_file_loads_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "  \n").unwrap();
    assert_eq!(Settings::load(&path).unwrap(), Settings::default());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(Settings::load(&path).is_err());
}

#[test]
fn saved_urls_and_tuning_survive_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut settings = Settings {
        debug_logging: true,
        locate_attempts: 7,
        locate_interval_ms: 500,
        ..Settings::default()
    };
    settings.set_saved_url(Platform::Bili, "https://live.bilibili.com/42");
    settings.save(&path).unwrap();

    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(
        loaded.saved_url(Platform::Bili),
        Some("https://live.bilibili.com/42")
    );
    assert_eq!(loaded.saved_url(Platform::Yt), None);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"bili_live_url\""));
    assert!(!raw.contains("yt_live_url"));
}
