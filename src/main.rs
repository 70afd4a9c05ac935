#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::path::{Path, PathBuf};
use std::time::Instant;

use live_overlay::backend::native_backend;
use live_overlay::gui::run_start_dialog;
use live_overlay::logging;
use live_overlay::session::{BrowserLaunch, DevToolsSession, LoginCookie};
use live_overlay::settings::{Settings, CONFIG_FILE};
use live_overlay::LiveApp;

fn main() -> anyhow::Result<()> {
    let config_path = Path::new(CONFIG_FILE);
    let mut settings = Settings::load(config_path)?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));

    let Some(selection) = run_start_dialog(&mut settings, config_path)? else {
        tracing::info!("start dialog cancelled");
        return Ok(());
    };
    tracing::info!(platform = %selection.platform, url = %selection.url, "starting live overlay");

    let result = run(&settings, selection.platform, selection.url);
    if let Err(err) = &result {
        tracing::error!(?err, "live overlay stopped with an error");
    }
    result
}

fn run(
    settings: &Settings,
    platform: live_overlay::Platform,
    url: String,
) -> anyhow::Result<()> {
    let backend = native_backend()?;
    let profile = platform.profile();
    let cookie = profile.login_cookie.as_ref().and_then(LoginCookie::from_env);
    if profile.login_cookie.is_some() && cookie.is_none() {
        tracing::info!("no login cookie in the environment; opening the stream signed out");
    }
    let session = DevToolsSession::launch(
        &settings.browser_path(),
        &settings.browser_profile_dir(),
        &BrowserLaunch {
            url,
            origin: (0, 0),
            size: profile.window_size,
            cookie,
        },
        settings.title_substring_for(platform),
    )?;

    LiveApp::start(backend, Box::new(session), settings, platform, Instant::now())?.run()
}
