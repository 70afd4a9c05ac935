use std::time::{Duration, Instant};

use live_overlay::backend::mock::{BackendCall, MockBackend};
use live_overlay::backend::WindowEvent;
use live_overlay::overlay::input::PointerInput;
use live_overlay::session::RecordingSession;
use live_overlay::settings::Settings;
use live_overlay::{AppPhase, AppStatus, LiveApp, Platform};

fn running_app(backend: &MockBackend, session: &RecordingSession, now: Instant) -> LiveApp {
    backend.add_window("bilibili 哔哩哔哩直播");
    let settings = Settings {
        locate_interval_ms: 10,
        ..Settings::default()
    };
    let mut app = LiveApp::start(
        Box::new(backend.clone()),
        Box::new(session.clone()),
        &settings,
        Platform::Bili,
        now,
    )
    .expect("start");
    app.step(now + Duration::from_millis(10));
    assert_eq!(app.phase(), AppPhase::Running);
    app
}

#[test]
fn rapid_close_presses_quit_the_session_once() {
    let backend = MockBackend::new();
    let session = RecordingSession::new("哔哩哔哩");
    let now = Instant::now();
    let mut app = running_app(&backend, &session, now);
    let overlay = app.host().overlay().unwrap().window();
    let host = app.host().window();

    for _ in 0..3 {
        backend.push_event(WindowEvent::Pointer {
            window: overlay,
            input: PointerInput::LeftPressed {
                local: (260, 5),
                global: (260, 5),
            },
        });
    }
    let status = app.step(now + Duration::from_millis(20));
    assert!(matches!(status, AppStatus::Finished(Ok(()))));
    assert_eq!(session.quits(), 1);

    let destroys: Vec<_> = backend
        .calls()
        .into_iter()
        .filter(|call| matches!(call, BackendCall::Destroy(_)))
        .collect();
    assert_eq!(
        destroys,
        vec![BackendCall::Destroy(overlay), BackendCall::Destroy(host)]
    );

    drop(app);
    assert_eq!(session.quits(), 1);
}

#[test]
fn host_close_request_and_failed_quit_still_release_windows() {
    let backend = MockBackend::new();
    let session = RecordingSession::new("哔哩哔哩");
    session.set_fail_quit(true);
    let now = Instant::now();
    let mut app = running_app(&backend, &session, now);
    let host = app.host().window();

    backend.push_event(WindowEvent::CloseRequested { window: host });
    assert!(app.step(now + Duration::from_millis(20)).is_finished());
    assert_eq!(session.quits(), 1);
    assert!(app.host().is_closed());
    assert!(backend.window(host).is_none());
}
