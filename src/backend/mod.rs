//! Native windowing capability used by the locator, the embedder and the
//! host window.
//!
//! Everything that touches real OS windows goes through [`WindowingBackend`]
//! so the core can run against [`mock::MockBackend`] in tests. The only native
//! implementation is the Win32 one.

use std::fmt;
use std::time::Duration;

use crate::geometry::{Point, Size};
use crate::overlay::input::PointerInput;
use crate::overlay::render::RgbaBuffer;

pub mod mock;
#[cfg(windows)]
pub mod win32;

/// Opaque OS identifier of a window this crate does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeWindowHandle(pub isize);

impl fmt::Display for NativeWindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Events reported by the backend after waiting on the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Pointer input delivered to a window created by the backend.
    Pointer {
        window: NativeWindowHandle,
        input: PointerInput,
    },
    /// A window's top-left corner changed, for any reason. `origin` is the
    /// position when the event was queued and can be stale by delivery.
    Moved {
        window: NativeWindowHandle,
        origin: Point,
    },
    /// The user or the OS asked a window to close.
    CloseRequested { window: NativeWindowHandle },
    /// A window is gone.
    Destroyed { window: NativeWindowHandle },
}

impl WindowEvent {
    pub fn window(&self) -> NativeWindowHandle {
        match *self {
            Self::Pointer { window, .. }
            | Self::Moved { window, .. }
            | Self::CloseRequested { window }
            | Self::Destroyed { window } => window,
        }
    }
}

pub trait WindowingBackend {
    /// Visible top-level windows in the OS's enumeration order.
    fn enumerate_visible_windows(&self) -> anyhow::Result<Vec<NativeWindowHandle>>;

    fn window_title(&self, window: NativeWindowHandle) -> anyhow::Result<String>;

    fn is_window(&self, window: NativeWindowHandle) -> bool;

    /// Id of the process that created `window`.
    fn process_of(&self, window: NativeWindowHandle) -> Option<u32>;

    /// The current parent of `window`, `None` for top-level windows.
    fn parent_of(&self, window: NativeWindowHandle) -> Option<NativeWindowHandle>;

    /// Make `child` a child of `parent`, placed at the parent's client origin
    /// and sized to `size`.
    fn reparent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
        size: Size,
    ) -> anyhow::Result<()>;

    /// Allow `window` to take keyboard and mouse focus.
    fn enable_input(&self, window: NativeWindowHandle) -> anyhow::Result<()>;

    fn move_window(&self, window: NativeWindowHandle, origin: Point) -> anyhow::Result<()>;

    fn window_origin(&self, window: NativeWindowHandle) -> anyhow::Result<Point>;

    fn client_size(&self, window: NativeWindowHandle) -> anyhow::Result<Size>;

    /// Create the borderless, always-on-top host window.
    fn create_host_window(
        &self,
        title: &str,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<NativeWindowHandle>;

    /// Create the translucent overlay, owned by `owner` so it stays above it.
    fn create_overlay_window(
        &self,
        owner: NativeWindowHandle,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<NativeWindowHandle>;

    fn show_window(&self, window: NativeWindowHandle) -> anyhow::Result<()>;

    /// Push a fully rendered frame to an overlay window.
    fn present(&self, window: NativeWindowHandle, frame: &RgbaBuffer) -> anyhow::Result<()>;

    fn destroy_window(&self, window: NativeWindowHandle) -> anyhow::Result<()>;

    /// Wait up to `timeout` for OS activity and return the events it produced.
    fn wait_events(&self, timeout: Duration) -> Vec<WindowEvent>;
}

/// Construct the backend for the running OS.
pub fn native_backend() -> anyhow::Result<Box<dyn WindowingBackend>> {
    #[cfg(windows)]
    {
        Ok(Box::new(win32::Win32Backend::new()?))
    }

    #[cfg(not(windows))]
    {
        anyhow::bail!("window embedding needs the Win32 windowing backend")
    }
}
