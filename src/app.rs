//! Single-threaded runtime: waits on the backend, feeds events to the host,
//! runs scheduled work and presents the overlay.

use std::time::{Duration, Instant};

use anyhow::bail;

use crate::backend::{NativeWindowHandle, WindowingBackend};
use crate::error::OverlayError;
use crate::geometry::Point;
use crate::host::{HostSignal, HostWindow};
use crate::locator::{LocatePoll, PollOutcome, WindowLocator};
use crate::overlay::render::OverlayStyle;
use crate::platform::{Platform, PlatformProfile};
use crate::scheduler::Scheduler;
use crate::session::BrowserSession;
use crate::settings::Settings;

/// Longest time the loop blocks on the OS when no timer is pending.
const IDLE_WAIT: Duration = Duration::from_millis(250);

const HOST_TITLE: &str = "live_overlay";
const HOST_ORIGIN: Point = (0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    LocateAttempt,
    InjectScript,
}

enum Phase {
    Locating(LocatePoll),
    Running,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Locating,
    Running,
    Closed,
}

#[derive(Debug)]
pub enum AppStatus {
    Running,
    Finished(anyhow::Result<()>),
}

impl AppStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

pub struct LiveApp {
    backend: Box<dyn WindowingBackend>,
    session: Box<dyn BrowserSession>,
    profile: &'static PlatformProfile,
    host: HostWindow,
    scheduler: Scheduler<Task>,
    phase: Phase,
    style: OverlayStyle,
}

impl LiveApp {
    /// Create the hidden host window and schedule the first locate attempt.
    /// The session is quit if startup fails.
    pub fn start(
        backend: Box<dyn WindowingBackend>,
        mut session: Box<dyn BrowserSession>,
        settings: &Settings,
        platform: Platform,
        now: Instant,
    ) -> anyhow::Result<Self> {
        let profile = platform.profile();
        let (host, title) = match Self::create_host(backend.as_ref(), session.as_ref(), profile) {
            Ok(created) => created,
            Err(err) => {
                if let Err(quit_err) = session.quit() {
                    tracing::error!(%quit_err, "failed to quit browser session");
                }
                return Err(err);
            }
        };
        let owner = session.pid();
        tracing::info!(%platform, title = %title, ?owner, "waiting for content window");

        let poll = LocatePoll::new(
            title,
            settings.locate_attempts,
            settings.locate_interval(),
        )
        .owned_by(owner);
        let mut scheduler = Scheduler::default();
        scheduler.schedule(now, poll.interval(), Task::LocateAttempt);

        Ok(Self {
            backend,
            session,
            profile,
            host,
            scheduler,
            phase: Phase::Locating(poll),
            style: OverlayStyle::default(),
        })
    }

    fn create_host(
        backend: &dyn WindowingBackend,
        session: &dyn BrowserSession,
        profile: &PlatformProfile,
    ) -> anyhow::Result<(HostWindow, String)> {
        let title = session.title()?;
        if title.trim().is_empty() {
            bail!("title substring must not be empty");
        }
        let host = HostWindow::create(backend, HOST_TITLE, HOST_ORIGIN, profile.window_size)?;
        Ok((host, title))
    }

    pub fn phase(&self) -> AppPhase {
        match self.phase {
            Phase::Locating(_) => AppPhase::Locating,
            Phase::Running => AppPhase::Running,
            Phase::Closed => AppPhase::Closed,
        }
    }

    pub fn host(&self) -> &HostWindow {
        &self.host
    }

    pub fn profile(&self) -> &'static PlatformProfile {
        self.profile
    }

    /// One loop iteration.
    pub fn step(&mut self, now: Instant) -> AppStatus {
        if matches!(self.phase, Phase::Closed) {
            return AppStatus::Finished(Ok(()));
        }

        let timeout = self
            .scheduler
            .time_until_next(now)
            .map_or(IDLE_WAIT, |wait| wait.min(IDLE_WAIT));
        for event in self.backend.wait_events(timeout) {
            if self.host.dispatch(self.backend.as_ref(), event) == HostSignal::Close {
                self.shutdown();
                return AppStatus::Finished(Ok(()));
            }
        }

        for task in self.scheduler.take_due(now) {
            if let Err(err) = self.run_task(task, now) {
                tracing::error!(%err, "startup failed");
                self.shutdown();
                return AppStatus::Finished(Err(err));
            }
        }

        if let Err(err) = self.host.present_overlay(self.backend.as_ref()) {
            tracing::error!(%err, "overlay paint failed");
        }
        AppStatus::Running
    }

    /// Drive the loop until the host closes or startup fails.
    pub fn run(mut self) -> anyhow::Result<()> {
        loop {
            if let AppStatus::Finished(result) = self.step(Instant::now()) {
                return result;
            }
        }
    }

    fn run_task(&mut self, task: Task, now: Instant) -> anyhow::Result<()> {
        match task {
            Task::LocateAttempt => {
                let outcome = match &mut self.phase {
                    Phase::Locating(poll) => poll.poll(&WindowLocator::new(self.backend.as_ref())),
                    _ => return Ok(()),
                };
                match outcome {
                    PollOutcome::Found(window) => self.on_located(window, now),
                    PollOutcome::Retry(delay) => {
                        self.scheduler.schedule(now, delay, Task::LocateAttempt);
                        Ok(())
                    }
                    PollOutcome::Exhausted(failure) => Err(OverlayError::from(failure).into()),
                }
            }
            Task::InjectScript => {
                if matches!(self.phase, Phase::Running) {
                    match self.session.execute_script(self.profile.page_script) {
                        Ok(()) => tracing::info!("page script injected"),
                        Err(err) => tracing::warn!(%err, "page script not injected"),
                    }
                }
                Ok(())
            }
        }
    }

    fn on_located(&mut self, window: NativeWindowHandle, now: Instant) -> anyhow::Result<()> {
        let backend = self.backend.as_ref();
        self.host
            .embed(backend, window)
            .map_err(OverlayError::from)?;
        self.host
            .attach_overlay(backend, self.profile.hit_regions(), self.style)?;
        backend.show_window(self.host.window())?;
        self.host.present_overlay(backend)?;

        self.phase = Phase::Running;
        self.scheduler
            .schedule(now, self.profile.script_delay, Task::InjectScript);
        tracing::info!(%window, host = %self.host.window(), "content embedded");
        Ok(())
    }

    /// Quit the browser while its window still exists, then release the
    /// overlay and the host. Runs once.
    fn shutdown(&mut self) {
        if matches!(self.phase, Phase::Closed) {
            return;
        }
        self.phase = Phase::Closed;
        self.scheduler.clear();

        let mut faults = Vec::new();
        let content_alive = self
            .host
            .embedded()
            .map_or(true, |embedded| self.backend.is_window(embedded.window()));
        if content_alive {
            if let Err(err) = self.session.quit() {
                faults.push(OverlayError::shutdown(err));
            }
        } else {
            tracing::info!("content window already gone; browser left to exit on its own");
        }
        faults.extend(self.host.close(self.backend.as_ref()));
        for fault in &faults {
            tracing::error!(%fault, "shutdown fault");
        }
    }
}

impl Drop for LiveApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
