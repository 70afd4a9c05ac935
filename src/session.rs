//! The external browser process that renders the stream page, driven over the
//! Chrome DevTools protocol.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context};
use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::geometry::{Point, Size};
use crate::platform::SessionCookie;

/// The DevTools connection is dropped after this long without traffic. A
/// stream page can sit quiet for hours.
const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub trait BrowserSession {
    /// Title of the page this session opened.
    fn title(&self) -> anyhow::Result<String>;

    /// Process that owns the session's window, when known.
    fn pid(&self) -> Option<u32>;

    fn execute_script(&mut self, script: &str) -> anyhow::Result<()>;

    /// Terminate the browser. Calling it on an already finished session is
    /// not an error.
    fn quit(&mut self) -> anyhow::Result<()>;
}

/// Where and what the browser should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserLaunch {
    pub url: String,
    pub origin: Point,
    pub size: Size,
    pub cookie: Option<LoginCookie>,
}

impl BrowserLaunch {
    /// The first page shown: the cookie's origin when one has to be seeded.
    pub fn landing_url(&self) -> &str {
        match &self.cookie {
            Some(cookie) => &cookie.origin,
            None => &self.url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub origin: String,
}

impl LoginCookie {
    pub fn from_env(cookie: &SessionCookie) -> Option<Self> {
        let value = cookie.value_from_env()?;
        Some(Self {
            name: cookie.name.to_string(),
            value,
            domain: cookie.domain.to_string(),
            origin: cookie.origin.to_string(),
        })
    }

    /// Script that stores the cookie from a page on its domain.
    pub fn script(&self) -> String {
        let cookie = format!(
            "{}={}; domain={}; path=/",
            self.name, self.value, self.domain
        );
        format!("document.cookie = {};", serde_json::Value::from(cookie))
    }
}

/// The page-level DevTools calls a session makes.
pub trait PageChannel {
    /// Load `url` and wait for the navigation to finish.
    fn navigate(&self, url: &str) -> anyhow::Result<()>;

    fn evaluate(&self, script: &str) -> anyhow::Result<()>;

    fn title(&self) -> anyhow::Result<String>;
}

/// A browser tab reached over DevTools.
pub struct DevToolsPage(Arc<Tab>);

impl PageChannel for DevToolsPage {
    fn navigate(&self, url: &str) -> anyhow::Result<()> {
        self.0
            .navigate_to(url)?
            .wait_until_navigated()
            .with_context(|| format!("navigation to {url} did not finish"))?;
        Ok(())
    }

    fn evaluate(&self, script: &str) -> anyhow::Result<()> {
        self.0.evaluate(script, false)?;
        Ok(())
    }

    fn title(&self) -> anyhow::Result<String> {
        self.0.get_title()
    }
}

/// Chromium-family browser started in `--app` mode, which gives a window
/// without tabs or address bar.
pub struct DevToolsSession {
    /// Dropping the browser kills its process.
    browser: Option<Browser>,
    page: Box<dyn PageChannel>,
    pid: Option<u32>,
    title: String,
    quit: bool,
}

impl DevToolsSession {
    /// Arguments on top of the DevTools launcher's own.
    pub fn launch_args(launch: &BrowserLaunch) -> Vec<String> {
        vec![
            format!("--app={}", launch.landing_url()),
            format!("--window-position={},{}", launch.origin.0, launch.origin.1),
            "--no-default-browser-check".into(),
        ]
    }

    /// Start the browser, seed the login cookie if any and open the stream
    /// page. `fallback_title` is used when the page reports no title.
    pub fn launch(
        browser: &Path,
        profile_dir: &Path,
        launch: &BrowserLaunch,
        fallback_title: impl Into<String>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(profile_dir).with_context(|| {
            format!("failed to create browser profile dir {}", profile_dir.display())
        })?;
        let args = Self::launch_args(launch);
        let options = LaunchOptions::default_builder()
            .headless(false)
            .path(Some(browser.to_path_buf()))
            .user_data_dir(Some(profile_dir.to_path_buf()))
            .window_size(Some((
                launch.size.width.max(1) as u32,
                launch.size.height.max(1) as u32,
            )))
            .idle_browser_timeout(SESSION_IDLE_TIMEOUT)
            .args(args.iter().map(OsStr::new).collect())
            .build()
            .map_err(|err| anyhow!("invalid browser launch options: {err}"))?;

        let process = Browser::new(options)
            .with_context(|| format!("failed to start browser {}", browser.display()))?;
        let pid = process.get_process_id();
        let tab = process
            .wait_for_initial_tab()
            .context("browser opened no page")?;
        tracing::info!(?pid, url = %launch.url, "browser session started");

        Self::open(Some(process), Box::new(DevToolsPage(tab)), pid, launch, fallback_title)
    }

    /// Drive an already running page to the stream.
    pub fn open(
        browser: Option<Browser>,
        page: Box<dyn PageChannel>,
        pid: Option<u32>,
        launch: &BrowserLaunch,
        fallback_title: impl Into<String>,
    ) -> anyhow::Result<Self> {
        if let Some(cookie) = &launch.cookie {
            page.navigate(&cookie.origin)?;
            page.evaluate(&cookie.script())
                .with_context(|| format!("failed to set cookie {}", cookie.name))?;
            tracing::debug!(name = %cookie.name, domain = %cookie.domain, "login cookie set");
        }
        page.navigate(&launch.url)?;

        let title = match page.title() {
            Ok(title) if !title.trim().is_empty() => title,
            Ok(_) => fallback_title.into(),
            Err(err) => {
                tracing::warn!(%err, "page title unavailable");
                fallback_title.into()
            }
        };
        tracing::info!(%title, "stream page open");
        Ok(Self {
            browser,
            page,
            pid,
            title,
            quit: false,
        })
    }
}

impl BrowserSession for DevToolsSession {
    fn title(&self) -> anyhow::Result<String> {
        Ok(self.title.clone())
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn execute_script(&mut self, script: &str) -> anyhow::Result<()> {
        if self.quit {
            return Err(anyhow!("browser session already quit"));
        }
        self.page.evaluate(script).context("page script failed")
    }

    fn quit(&mut self) -> anyhow::Result<()> {
        self.quit = true;
        self.pid = None;
        match self.browser.take() {
            Some(browser) => {
                drop(browser);
                tracing::info!("browser session terminated");
            }
            None => tracing::debug!("browser already gone"),
        }
        Ok(())
    }
}

/// In-memory session used by tests; clones share their record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    inner: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    title: String,
    pid: Option<u32>,
    scripts: Vec<String>,
    quits: usize,
    fail_quit: bool,
    fail_scripts: bool,
}

impl RecordingSession {
    pub fn new(title: impl Into<String>) -> Self {
        let session = Self::default();
        session.lock().title = title.into();
        session
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    pub fn quits(&self) -> usize {
        self.lock().quits
    }

    pub fn set_pid(&self, pid: Option<u32>) {
        self.lock().pid = pid;
    }

    pub fn set_fail_quit(&self, fail: bool) {
        self.lock().fail_quit = fail;
    }

    pub fn set_fail_scripts(&self, fail: bool) {
        self.lock().fail_scripts = fail;
    }
}

impl BrowserSession for RecordingSession {
    fn title(&self) -> anyhow::Result<String> {
        Ok(self.lock().title.clone())
    }

    fn pid(&self) -> Option<u32> {
        self.lock().pid
    }

    fn execute_script(&mut self, script: &str) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.fail_scripts {
            return Err(anyhow!("script rejected"));
        }
        state.scripts.push(script.to_string());
        Ok(())
    }

    fn quit(&mut self) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.quits += 1;
        if state.fail_quit {
            return Err(anyhow!("browser did not exit"));
        }
        Ok(())
    }
}
