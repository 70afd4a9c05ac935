use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.txt");

    live_overlay::logging::init(true, Some(path.clone()));
    tracing::info!("overlay started");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("overlay started"));

    // A second call is ignored instead of panicking.
    live_overlay::logging::init(false, None);
}
