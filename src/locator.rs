use std::time::Duration;

use crate::backend::{NativeWindowHandle, WindowingBackend};
use crate::error::LocateFailure;

/// Finds visible top-level windows by title.
///
/// When several titles match, the first window in the OS enumeration order
/// wins. On Windows that is the z-order, topmost first.
pub struct WindowLocator<'a> {
    backend: &'a dyn WindowingBackend,
}

impl<'a> WindowLocator<'a> {
    pub fn new(backend: &'a dyn WindowingBackend) -> Self {
        Self { backend }
    }

    /// Case-insensitive substring search over window titles. Windows whose
    /// title cannot be read are skipped; a failed enumeration finds nothing.
    pub fn locate(&self, title_substring: &str) -> Option<NativeWindowHandle> {
        self.locate_owned(title_substring, None)
    }

    /// Like [`locate`](Self::locate), but with `owner` set only windows of
    /// that process qualify.
    pub fn locate_owned(
        &self,
        title_substring: &str,
        owner: Option<u32>,
    ) -> Option<NativeWindowHandle> {
        let needle = title_substring.to_lowercase();
        let windows = match self.backend.enumerate_visible_windows() {
            Ok(windows) => windows,
            Err(err) => {
                tracing::warn!(?err, "window enumeration failed");
                return None;
            }
        };

        windows.into_iter().find(|window| {
            if owner.is_some() && self.backend.process_of(*window) != owner {
                return false;
            }
            match self.backend.window_title(*window) {
                Ok(title) => title.to_lowercase().contains(&needle),
                Err(err) => {
                    tracing::debug!(%window, ?err, "skipping window with unreadable title");
                    false
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Found(NativeWindowHandle),
    /// Not found yet; try again after the given delay.
    Retry(Duration),
    Exhausted(LocateFailure),
}

/// Bounded retry on top of [`WindowLocator`]. The caller schedules each
/// attempt, nothing here blocks.
#[derive(Debug, Clone)]
pub struct LocatePoll {
    title_substring: String,
    owner: Option<u32>,
    max_attempts: u32,
    attempts: u32,
    interval: Duration,
}

impl LocatePoll {
    pub fn new(title_substring: impl Into<String>, max_attempts: u32, interval: Duration) -> Self {
        Self {
            title_substring: title_substring.into(),
            owner: None,
            max_attempts: max_attempts.max(1),
            attempts: 0,
            interval,
        }
    }

    /// Only accept windows created by process `owner`.
    pub fn owned_by(mut self, owner: Option<u32>) -> Self {
        self.owner = owner;
        self
    }

    pub fn title_substring(&self) -> &str {
        &self.title_substring
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn poll(&mut self, locator: &WindowLocator<'_>) -> PollOutcome {
        if self.attempts >= self.max_attempts {
            return PollOutcome::Exhausted(self.failure());
        }
        self.attempts += 1;
        match locator.locate_owned(&self.title_substring, self.owner) {
            Some(window) => {
                tracing::info!(%window, attempts = self.attempts, "located content window");
                PollOutcome::Found(window)
            }
            None if self.attempts < self.max_attempts => {
                tracing::debug!(
                    attempt = self.attempts,
                    max = self.max_attempts,
                    title = %self.title_substring,
                    "content window not found yet"
                );
                PollOutcome::Retry(self.interval)
            }
            None => PollOutcome::Exhausted(self.failure()),
        }
    }

    fn failure(&self) -> LocateFailure {
        LocateFailure {
            substring: self.title_substring.clone(),
            attempts: self.attempts,
        }
    }
}
