use crate::backend::{NativeWindowHandle, WindowingBackend};
use crate::error::EmbedFailure;
use crate::geometry::Size;

/// A foreign window living inside the host's client area.
///
/// The handle is borrowed from the browser process. Dropping this value or
/// destroying the host does not end that process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedSurface {
    window: NativeWindowHandle,
    size: Size,
}

impl EmbeddedSurface {
    pub fn embed(
        backend: &dyn WindowingBackend,
        host: NativeWindowHandle,
        window: NativeWindowHandle,
    ) -> Result<Self, EmbedFailure> {
        if !backend.is_window(window) {
            return Err(EmbedFailure::InvalidHandle(window));
        }
        if let Some(parent) = backend.parent_of(window) {
            if parent != host {
                return Err(EmbedFailure::IncompatibleParent {
                    handle: window,
                    parent,
                });
            }
        }

        let rejected = |err: anyhow::Error| EmbedFailure::Rejected {
            handle: window,
            source: err.into(),
        };
        let size = backend.client_size(host).map_err(rejected)?;
        backend.reparent(window, host, size).map_err(rejected)?;
        backend.enable_input(window).map_err(rejected)?;

        tracing::info!(%window, %host, width = size.width, height = size.height, "embedded content window");
        Ok(Self { window, size })
    }

    pub fn window(&self) -> NativeWindowHandle {
        self.window
    }

    /// Size at embed time.
    pub fn size(&self) -> Size {
        self.size
    }
}
