//! The top-level window that owns the embedded page and the overlay, and
//! keeps the overlay glued to it.

use std::panic::{self, AssertUnwindSafe};

use crate::backend::{NativeWindowHandle, WindowEvent, WindowingBackend};
use crate::embed::EmbeddedSurface;
use crate::error::{EmbedFailure, OverlayError};
use crate::geometry::{Point, Size};
use crate::overlay::input::{HitRegion, PointerInput};
use crate::overlay::render::OverlayStyle;
use crate::overlay::OverlaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    Continue,
    Close,
}

#[derive(Debug)]
pub struct HostWindow {
    window: NativeWindowHandle,
    origin: Point,
    embedded: Option<EmbeddedSurface>,
    overlay: Option<OverlaySurface>,
    closed: bool,
}

impl HostWindow {
    pub fn create(
        backend: &dyn WindowingBackend,
        title: &str,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<Self> {
        let window = backend.create_host_window(title, origin, size)?;
        tracing::debug!(%window, ?origin, ?size, "host window created");
        Ok(Self {
            window,
            origin,
            embedded: None,
            overlay: None,
            closed: false,
        })
    }

    pub fn window(&self) -> NativeWindowHandle {
        self.window
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn embedded(&self) -> Option<&EmbeddedSurface> {
        self.embedded.as_ref()
    }

    pub fn overlay(&self) -> Option<&OverlaySurface> {
        self.overlay.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn embed(
        &mut self,
        backend: &dyn WindowingBackend,
        content: NativeWindowHandle,
    ) -> Result<(), EmbedFailure> {
        self.embedded = Some(EmbeddedSurface::embed(backend, self.window, content)?);
        Ok(())
    }

    /// Create the overlay at the host's origin with the host's current client
    /// size. Later host resizes are not applied to it.
    pub fn attach_overlay(
        &mut self,
        backend: &dyn WindowingBackend,
        regions: Vec<HitRegion>,
        style: OverlayStyle,
    ) -> anyhow::Result<()> {
        let size = backend.client_size(self.window)?;
        let window = backend.create_overlay_window(self.window, self.origin, size)?;
        tracing::debug!(%window, ?size, "overlay window created");
        self.overlay = Some(OverlaySurface::new(
            window,
            self.origin,
            size,
            regions,
            style,
        ));
        Ok(())
    }

    /// Handle one backend event. Failures and panics inside the handler are
    /// logged and swallowed so the event loop keeps running.
    pub fn dispatch(&mut self, backend: &dyn WindowingBackend, event: WindowEvent) -> HostSignal {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process(backend, event))) {
            Ok(Ok(signal)) => signal,
            Ok(Err(err)) => {
                tracing::error!(%err, ?event, "event handler failed");
                HostSignal::Continue
            }
            Err(payload) => {
                let panic_message = if let Some(message) = payload.downcast_ref::<&str>() {
                    (*message).to_string()
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    message.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                tracing::error!(%panic_message, ?event, "event handler panicked");
                HostSignal::Continue
            }
        }
    }

    fn process(
        &mut self,
        backend: &dyn WindowingBackend,
        event: WindowEvent,
    ) -> Result<HostSignal, OverlayError> {
        if self.closed {
            return Ok(HostSignal::Continue);
        }
        match event {
            WindowEvent::Moved { window, .. } if window == self.window => {
                // Echoes of our own earlier moves can arrive late; the carried
                // origin may already be stale.
                backend
                    .window_origin(self.window)
                    .and_then(|origin| self.on_moved(backend, origin))
                    .map_err(|err| OverlayError::handler("move", err))?;
                Ok(HostSignal::Continue)
            }
            WindowEvent::Pointer { window, input } if self.is_overlay(window) => {
                self.on_pointer(backend, input)
            }
            WindowEvent::CloseRequested { window } if window == self.window => {
                tracing::info!("host close requested");
                Ok(HostSignal::Close)
            }
            WindowEvent::Destroyed { window } if window == self.window => {
                tracing::warn!("host window destroyed externally");
                Ok(HostSignal::Close)
            }
            WindowEvent::Destroyed { window } if self.is_embedded(window) => {
                tracing::warn!(%window, "embedded content window went away");
                Ok(HostSignal::Close)
            }
            _ => Ok(HostSignal::Continue),
        }
    }

    fn on_pointer(
        &mut self,
        backend: &dyn WindowingBackend,
        input: PointerInput,
    ) -> Result<HostSignal, OverlayError> {
        let host_origin = self.origin;
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(HostSignal::Continue);
        };
        let outcome = overlay.handle_pointer(input, host_origin);
        if outcome.close {
            tracing::info!("close region pressed");
            return Ok(HostSignal::Close);
        }
        if let Some(target) = outcome.move_host_to {
            backend
                .move_window(self.window, target)
                .map_err(|err| OverlayError::handler("drag", err))?;
            self.on_moved(backend, target)
                .map_err(|err| OverlayError::handler("drag", err))?;
        }
        Ok(HostSignal::Continue)
    }

    /// Record the new host origin and move the overlay onto it.
    fn on_moved(&mut self, backend: &dyn WindowingBackend, origin: Point) -> anyhow::Result<()> {
        self.origin = origin;
        self.sync_overlay(backend)
    }

    fn sync_overlay(&mut self, backend: &dyn WindowingBackend) -> anyhow::Result<()> {
        let origin = self.origin;
        if let Some(overlay) = self.overlay.as_mut() {
            if overlay.origin() != origin {
                backend.move_window(overlay.window(), origin)?;
                overlay.set_origin(origin);
            }
        }
        Ok(())
    }

    /// Present the overlay frame if its hover state changed since the last one.
    pub fn present_overlay(&mut self, backend: &dyn WindowingBackend) -> Result<(), OverlayError> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(());
        };
        if self.closed || !overlay.take_dirty() {
            return Ok(());
        }
        backend
            .present(overlay.window(), &overlay.render())
            .map_err(|err| OverlayError::handler("paint", err))
    }

    /// Destroy the overlay and the host window. Runs once; later calls do
    /// nothing. The embedded window's process is left alone.
    pub fn close(&mut self, backend: &dyn WindowingBackend) -> Vec<OverlayError> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;

        let mut faults = Vec::new();
        if let Some(overlay) = self.overlay.take() {
            if let Err(err) = backend.destroy_window(overlay.window()) {
                faults.push(OverlayError::shutdown(err));
            }
        }
        self.embedded = None;
        if let Err(err) = backend.destroy_window(self.window) {
            faults.push(OverlayError::shutdown(err));
        }
        tracing::info!(faults = faults.len(), "host window closed");
        faults
    }

    fn is_overlay(&self, window: NativeWindowHandle) -> bool {
        self.overlay
            .as_ref()
            .is_some_and(|overlay| overlay.window() == window)
    }

    fn is_embedded(&self, window: NativeWindowHandle) -> bool {
        self.embedded
            .as_ref()
            .is_some_and(|embedded| embedded.window() == window)
    }
}
