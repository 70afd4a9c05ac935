pub mod app;
pub mod backend;
pub mod embed;
pub mod error;
pub mod geometry;
pub mod gui;
pub mod host;
pub mod locator;
pub mod logging;
pub mod overlay;
pub mod platform;
pub mod scheduler;
pub mod session;
pub mod settings;

pub use app::{AppPhase, AppStatus, LiveApp};
pub use error::{EmbedFailure, LocateFailure, OverlayError};
pub use platform::{Platform, PlatformProfile, PLATFORM_PROFILES};
