//! Static per-platform table: window size, close hit region, title hint and
//! the page script run after embedding.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};
use crate::overlay::input::HitRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Bili,
    Yt,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Bili, Platform::Yt];

    pub fn profile(self) -> &'static PlatformProfile {
        match self {
            Platform::Bili => &PLATFORM_PROFILES[0],
            Platform::Yt => &PLATFORM_PROFILES[1],
        }
    }

    /// Key of the saved URL in `config.json`.
    pub fn url_key(self) -> &'static str {
        match self {
            Platform::Bili => "bili_live_url",
            Platform::Yt => "yt_live_url",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub label: &'static str,
    /// Host client size; the overlay and the embedded page use it too.
    pub window_size: Size,
    /// Overlay-local rectangle covering the page's own close button.
    pub close_region: Rect,
    /// Case-insensitive fragment of the browser window title, used when the
    /// page reports no title.
    pub title_hint: &'static str,
    pub page_script: &'static str,
    pub script_delay: Duration,
    /// Login cookie seeded before the stream page opens.
    pub login_cookie: Option<SessionCookie>,
}

/// A cookie whose value comes from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub domain: &'static str,
    /// Page the cookie is written on; the browser opens here first.
    pub origin: &'static str,
    pub env_var: &'static str,
}

impl SessionCookie {
    /// Value from the environment, if set and non-blank.
    pub fn value_from_env(&self) -> Option<String> {
        std::env::var(self.env_var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl PlatformProfile {
    pub fn hit_regions(&self) -> Vec<HitRegion> {
        vec![HitRegion::close(self.close_region)]
    }
}

const BILI_PAGE_SCRIPT: &str = r#"
setTimeout(() => {
    window.scrollTo(940, 85);
    document.body.style.overflow = "hidden";

    const sidebar = document.getElementsByClassName("side-bar-cntr")[0];
    sidebar.style.display = "none";

    document.querySelector(".control-btn.pause.pointer").click();
}, 12000);
"#;

const YT_PAGE_SCRIPT: &str = r##"
setTimeout(() => {
    window.scrollTo(0, 370);
    document.body.style.overflow = "hidden";

    const playButton = document.getElementsByClassName("ytp-play-button ytp-button")[0];
    playButton.click();

    document.getElementById("masthead-container").style.display = "none";

    document.querySelector("#dismiss-button").click();
}, 12000);
"##;

pub const PLATFORM_PROFILES: [PlatformProfile; 2] = [
    PlatformProfile {
        platform: Platform::Bili,
        label: "Bilibili",
        window_size: Size::new(300, 605),
        close_region: Rect::new(249, 0, 45, 29),
        title_hint: "哔哩哔哩",
        page_script: BILI_PAGE_SCRIPT,
        script_delay: Duration::from_secs(12),
        login_cookie: Some(SessionCookie {
            name: "SESSDATA",
            domain: ".bilibili.com",
            origin: "https://www.bilibili.com",
            env_var: "SESSDATA",
        }),
    },
    PlatformProfile {
        platform: Platform::Yt,
        label: "YouTube",
        window_size: Size::new(410, 575),
        close_region: Rect::new(358, 0, 45, 29),
        title_hint: "YouTube",
        page_script: YT_PAGE_SCRIPT,
        script_delay: Duration::from_secs(12),
        login_cookie: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_their_platform() {
        for platform in Platform::ALL {
            assert_eq!(platform.profile().platform, platform);
        }
    }

    #[test]
    fn close_regions_sit_inside_the_window() {
        for profile in &PLATFORM_PROFILES {
            let region = profile.close_region;
            assert!(region.x >= 0 && region.y >= 0);
            assert!(region.right() <= profile.window_size.width);
            assert!(region.bottom() <= profile.window_size.height);
        }
    }

    #[test]
    fn serializes_as_lowercase_tags() {
        assert_eq!(serde_json::to_string(&Platform::Yt).unwrap(), "\"yt\"");
        let parsed: Platform = serde_json::from_str("\"bili\"").unwrap();
        assert_eq!(parsed, Platform::Bili);
    }

    #[test]
    fn page_scripts_are_complete() {
        let yt = Platform::Yt.profile().page_script;
        assert!(yt.contains("#dismiss-button"));
        assert!(yt.trim_end().ends_with("}, 12000);"));
        let bili = Platform::Bili.profile().page_script;
        assert!(bili.contains(".control-btn.pause.pointer"));
        assert!(bili.trim_end().ends_with("}, 12000);"));
    }

    #[test]
    fn only_bilibili_seeds_a_login_cookie() {
        let cookie = Platform::Bili.profile().login_cookie.unwrap();
        assert_eq!(cookie.name, "SESSDATA");
        assert!(cookie.origin.ends_with(cookie.domain.trim_start_matches('.')));
        assert!(Platform::Yt.profile().login_cookie.is_none());
    }

    #[test]
    fn url_keys_match_config_file() {
        assert_eq!(Platform::Bili.url_key(), "bili_live_url");
        assert_eq!(Platform::Yt.url_key(), "yt_live_url");
    }
}
