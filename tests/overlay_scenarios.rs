use live_overlay::backend::mock::MockBackend;
use live_overlay::backend::{NativeWindowHandle, WindowEvent};
use live_overlay::geometry::{Rect, Size};
use live_overlay::host::{HostSignal, HostWindow};
use live_overlay::overlay::input::{HitAction, HitRegion, OverlayState, PointerInput};
use live_overlay::overlay::render::{OverlayStyle, Rgba};

const HOST_ORIGIN: (i32, i32) = (100, 100);

fn host_with_overlay(backend: &MockBackend) -> HostWindow {
    let mut host =
        HostWindow::create(backend, "host", HOST_ORIGIN, Size::new(300, 600)).expect("host");
    let content = backend.add_window("Streamer - Live");
    host.embed(backend, content).expect("embed");
    host.attach_overlay(
        backend,
        vec![HitRegion::close(Rect::new(249, 0, 45, 29))],
        OverlayStyle::default(),
    )
    .expect("overlay");
    host
}

fn overlay_of(host: &HostWindow) -> NativeWindowHandle {
    host.overlay().expect("overlay attached").window()
}

/// Build a pointer event for a local position on the overlay, with the global
/// position derived from the host's current origin.
fn at(host: &HostWindow, local: (i32, i32), kind: &str) -> WindowEvent {
    let origin = host.origin();
    let global = (origin.0 + local.0, origin.1 + local.1);
    let input = match kind {
        "press" => PointerInput::LeftPressed { local, global },
        "release" => PointerInput::LeftReleased { local, global },
        "drag" => PointerInput::Moved {
            local,
            global,
            left_held: true,
        },
        _ => PointerInput::Moved {
            local,
            global,
            left_held: false,
        },
    };
    WindowEvent::Pointer {
        window: overlay_of(host),
        input,
    }
}

#[test]
fn press_inside_close_region_closes_without_drag() {
    let backend = MockBackend::new();
    let mut host = host_with_overlay(&backend);

    let press = at(&host, (260, 10), "press");
    assert_eq!(host.dispatch(&backend, press), HostSignal::Close);
    let overlay = host.overlay().unwrap();
    assert!(overlay.input().drag_session().is_none());
    assert_eq!(host.origin(), HOST_ORIGIN);
}

#[test]
fn drag_moves_host_by_pointer_delta() {
    let backend = MockBackend::new();
    let mut host = host_with_overlay(&backend);

    host.dispatch(&backend, at(&host, (10, 10), "press"));
    assert_eq!(host.overlay().unwrap().state(), OverlayState::Dragging);

    // Global (120, 125): the pointer moved by (10, 15) from (110, 110).
    let drag = WindowEvent::Pointer {
        window: overlay_of(&host),
        input: PointerInput::Moved {
            local: (10, 10),
            global: (120, 125),
            left_held: true,
        },
    };
    assert_eq!(host.dispatch(&backend, drag), HostSignal::Continue);
    assert_eq!(host.origin(), (110, 115));
    assert_eq!(host.overlay().unwrap().origin(), (110, 115));
}

#[test]
fn each_drag_starts_from_a_fresh_anchor() {
    let backend = MockBackend::new();
    let mut host = host_with_overlay(&backend);

    host.dispatch(&backend, at(&host, (10, 10), "press"));
    let first = host.overlay().unwrap().input().drag_session().unwrap();
    assert_eq!(first.anchor_offset, (10, 10));
    host.dispatch(&backend, at(&host, (10, 10), "release"));
    assert!(host.overlay().unwrap().input().drag_session().is_none());

    host.dispatch(&backend, at(&host, (50, 70), "press"));
    let second = host.overlay().unwrap().input().drag_session().unwrap();
    assert_eq!(second.anchor_offset, (50, 70));
}

#[test]
fn capture_loss_ends_the_drag() {
    let backend = MockBackend::new();
    let mut host = host_with_overlay(&backend);

    host.dispatch(&backend, at(&host, (10, 10), "press"));
    host.dispatch(
        &backend,
        WindowEvent::Pointer {
            window: overlay_of(&host),
            input: PointerInput::CaptureLost,
        },
    );
    assert!(host.overlay().unwrap().input().drag_session().is_none());

    host.dispatch(&backend, at(&host, (40, 40), "drag"));
    assert_eq!(host.origin(), HOST_ORIGIN);
}

#[test]
fn highlight_follows_hover() {
    let backend = MockBackend::new();
    let mut host = host_with_overlay(&backend);
    let style = OverlayStyle::default();
    host.present_overlay(&backend).unwrap();

    host.dispatch(&backend, at(&host, (270, 15), "hover"));
    assert_eq!(host.overlay().unwrap().hovered(), Some(HitAction::Close));
    host.present_overlay(&backend).unwrap();
    let frame = backend.last_frame(overlay_of(&host)).unwrap();
    assert_eq!(frame.pixel(270, 15), style.close_highlight);
    assert_eq!(frame.pixel(10, 10), style.floor);

    host.dispatch(&backend, at(&host, (20, 300), "hover"));
    assert_eq!(host.overlay().unwrap().state(), OverlayState::Idle);
    host.present_overlay(&backend).unwrap();
    let frame = backend.last_frame(overlay_of(&host)).unwrap();
    assert_eq!(frame.pixel(270, 15), style.floor);
    assert_ne!(frame.pixel(270, 15), Rgba::TRANSPARENT);
}
