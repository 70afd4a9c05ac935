use std::time::Duration;

use live_overlay::backend::mock::MockBackend;
use live_overlay::locator::{LocatePoll, PollOutcome, WindowLocator};

#[test]
fn first_case_insensitive_match_wins() {
    let backend = MockBackend::new();
    backend.add_window("Inbox - Mail");
    let first = backend.add_window("Lofi Girl - YouTube");
    backend.add_window("Another youtube stream");

    let locator = WindowLocator::new(&backend);
    assert_eq!(locator.locate("YOUTUBE"), Some(first));
    assert_eq!(locator.locate("mail"), locator.locate("Mail"));
}

#[test]
fn hidden_and_child_windows_are_ignored() {
    let backend = MockBackend::new();
    let hidden = backend.add_window("YouTube (hidden)");
    backend.set_visible(hidden, false);
    let parent = backend.add_window("Editor");
    let child = backend.add_window("YouTube child");
    backend.set_parent(child, Some(parent));

    let locator = WindowLocator::new(&backend);
    assert_eq!(locator.locate("youtube"), None);

    let visible = backend.add_window("YouTube");
    assert_eq!(locator.locate("youtube"), Some(visible));
}

#[test]
fn unreadable_titles_and_failed_enumeration_find_nothing() {
    let backend = MockBackend::new();
    backend.add_unreadable_window();
    let target = backend.add_window("哔哩哔哩直播");

    let locator = WindowLocator::new(&backend);
    assert_eq!(locator.locate("哔哩哔哩"), Some(target));

    backend.set_fail_enumeration(true);
    assert_eq!(locator.locate("哔哩哔哩"), None);
}

#[test]
fn poll_gives_up_after_its_bound() {
    let backend = MockBackend::new();
    let locator = WindowLocator::new(&backend);
    let interval = Duration::from_millis(50);
    let mut poll = LocatePoll::new("YouTube", 2, interval);

    assert_eq!(poll.poll(&locator), PollOutcome::Retry(interval));
    match poll.poll(&locator) {
        PollOutcome::Exhausted(failure) => {
            assert_eq!(failure.attempts, 2);
            assert_eq!(failure.substring, "YouTube");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    let window = backend.add_window("YouTube");
    assert!(matches!(poll.poll(&locator), PollOutcome::Exhausted(_)));
    assert_eq!(locator.locate("youtube"), Some(window));
}
