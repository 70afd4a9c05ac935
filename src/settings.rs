use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::Platform;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Saved Bilibili live room URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bili_live_url: Option<String>,
    /// Saved YouTube live URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yt_live_url: Option<String>,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// File that receives a copy of every log line. `None` disables it.
    #[serde(default = "default_log_file")]
    pub log_file: Option<String>,
    /// Browser executable launched in app mode.
    #[serde(default)]
    pub browser_path: Option<String>,
    /// Profile directory for the browser so it runs as its own process.
    #[serde(default)]
    pub browser_profile_dir: Option<String>,
    /// Overrides the platform's window title hint, which is only used when
    /// the page reports no title of its own.
    #[serde(default)]
    pub title_substring: Option<String>,
    #[serde(default = "default_locate_attempts")]
    pub locate_attempts: u32,
    #[serde(default = "default_locate_interval_ms")]
    pub locate_interval_ms: u64,
    /// Keys this program does not know about, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_log_file() -> Option<String> {
    Some("log.txt".into())
}

fn default_locate_attempts() -> u32 {
    50
}

fn default_locate_interval_ms() -> u64 {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bili_live_url: None,
            yt_live_url: None,
            debug_logging: false,
            log_file: default_log_file(),
            browser_path: None,
            browser_profile_dir: None,
            title_substring: None,
            locate_attempts: default_locate_attempts(),
            locate_interval_ms: default_locate_interval_ms(),
            extra: serde_json::Map::new(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn saved_url(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Bili => self.bili_live_url.as_deref(),
            Platform::Yt => self.yt_live_url.as_deref(),
        }
        .filter(|url| !url.is_empty())
    }

    pub fn set_saved_url(&mut self, platform: Platform, url: impl Into<String>) {
        let url = Some(url.into());
        match platform {
            Platform::Bili => self.bili_live_url = url,
            Platform::Yt => self.yt_live_url = url,
        }
    }

    pub fn locate_interval(&self) -> Duration {
        Duration::from_millis(self.locate_interval_ms)
    }

    /// Fallback title fragment for the browser window of `platform`.
    pub fn title_substring_for(&self, platform: Platform) -> String {
        match self.title_substring.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => custom.to_string(),
            _ => platform.profile().title_hint.to_string(),
        }
    }

    pub fn browser_path(&self) -> PathBuf {
        self.browser_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_browser_path)
    }

    pub fn browser_profile_dir(&self) -> PathBuf {
        self.browser_profile_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs_next::data_local_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("live_overlay")
                    .join("browser-profile")
            })
    }
}

#[cfg(windows)]
fn default_browser_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe")
}

#[cfg(not(windows))]
fn default_browser_path() -> PathBuf {
    PathBuf::from("google-chrome")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(dir.path().join("config.json")).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.locate_attempts, 50);
        assert_eq!(settings.locate_interval(), Duration::from_millis(200));
        assert_eq!(settings.log_file.as_deref(), Some("log.txt"));
    }

    #[test]
    fn saved_urls_are_per_platform() {
        let mut settings = Settings::default();
        settings.set_saved_url(Platform::Yt, "https://youtube.com/live/abc");
        assert_eq!(
            settings.saved_url(Platform::Yt),
            Some("https://youtube.com/live/abc")
        );
        assert_eq!(settings.saved_url(Platform::Bili), None);

        settings.set_saved_url(Platform::Bili, "");
        assert_eq!(settings.saved_url(Platform::Bili), None);
    }

    #[test]
    fn title_override_wins_unless_blank() {
        let mut settings = Settings::default();
        assert_eq!(settings.title_substring_for(Platform::Yt), "YouTube");
        settings.title_substring = Some("  ".into());
        assert_eq!(settings.title_substring_for(Platform::Bili), "哔哩哔哩");
        settings.title_substring = Some("My Stream".into());
        assert_eq!(settings.title_substring_for(Platform::Yt), "My Stream");
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "bili_live_url": "https://live.bilibili.com/1", "theme": "dark" }"#,
        )
        .unwrap();

        let mut settings = Settings::load(&path).expect("load");
        settings.set_saved_url(Platform::Yt, "https://youtube.com/live/x");
        settings.save(&path).expect("save");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["bili_live_url"], "https://live.bilibili.com/1");
        assert_eq!(raw["yt_live_url"], "https://youtube.com/live/x");
    }
}
