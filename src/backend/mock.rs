//! Scriptable in-memory [`WindowingBackend`] for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, bail};

use super::{NativeWindowHandle, WindowEvent, WindowingBackend};
use crate::geometry::{Point, Size};
use crate::overlay::render::RgbaBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateHost { origin: Point, size: Size },
    CreateOverlay {
        owner: NativeWindowHandle,
        origin: Point,
        size: Size,
    },
    Reparent {
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
        size: Size,
    },
    EnableInput(NativeWindowHandle),
    Move {
        window: NativeWindowHandle,
        origin: Point,
    },
    Show(NativeWindowHandle),
    Present(NativeWindowHandle),
    Destroy(NativeWindowHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    pub handle: NativeWindowHandle,
    /// `None` makes title reads fail.
    pub title: Option<String>,
    pub visible: bool,
    pub parent: Option<NativeWindowHandle>,
    /// Owning process; `None` when unknown.
    pub process: Option<u32>,
    pub origin: Point,
    pub size: Size,
}

#[derive(Debug, Default)]
struct MockState {
    windows: Vec<MockWindow>,
    next_handle: isize,
    calls: Vec<BackendCall>,
    events: VecDeque<WindowEvent>,
    frames: Vec<(NativeWindowHandle, RgbaBuffer)>,
    waits: Vec<Duration>,
    fail_enumeration: bool,
    reject_reparent: bool,
    fail_present: bool,
    fail_moves_for: Option<NativeWindowHandle>,
}

/// Clones share the same windows, call log and event queue.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, title: Option<String>, origin: Point, size: Size) -> NativeWindowHandle {
        let mut state = self.lock();
        state.next_handle += 0x10;
        let handle = NativeWindowHandle(state.next_handle);
        state.windows.push(MockWindow {
            handle,
            title,
            visible: true,
            parent: None,
            process: None,
            origin,
            size,
        });
        handle
    }

    /// Add a visible top-level window at the end of the enumeration order.
    pub fn add_window(&self, title: &str) -> NativeWindowHandle {
        self.insert(Some(title.to_string()), (0, 0), Size::new(800, 600))
    }

    pub fn add_unreadable_window(&self) -> NativeWindowHandle {
        self.insert(None, (0, 0), Size::new(800, 600))
    }

    pub fn set_visible(&self, window: NativeWindowHandle, visible: bool) {
        if let Some(entry) = self.lock().windows.iter_mut().find(|w| w.handle == window) {
            entry.visible = visible;
        }
    }

    pub fn set_parent(&self, window: NativeWindowHandle, parent: Option<NativeWindowHandle>) {
        if let Some(entry) = self.lock().windows.iter_mut().find(|w| w.handle == window) {
            entry.parent = parent;
        }
    }

    pub fn set_process(&self, window: NativeWindowHandle, process: Option<u32>) {
        if let Some(entry) = self.lock().windows.iter_mut().find(|w| w.handle == window) {
            entry.process = process;
        }
    }

    /// Forget a window, as if its owning process closed it.
    pub fn remove_window(&self, window: NativeWindowHandle) {
        self.lock().windows.retain(|w| w.handle != window);
    }

    pub fn window(&self, window: NativeWindowHandle) -> Option<MockWindow> {
        self.lock().windows.iter().find(|w| w.handle == window).cloned()
    }

    pub fn push_event(&self, event: WindowEvent) {
        self.lock().events.push_back(event);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn frames(&self) -> Vec<(NativeWindowHandle, RgbaBuffer)> {
        self.lock().frames.clone()
    }

    pub fn last_frame(&self, window: NativeWindowHandle) -> Option<RgbaBuffer> {
        self.lock()
            .frames
            .iter()
            .rev()
            .find(|(handle, _)| *handle == window)
            .map(|(_, frame)| frame.clone())
    }

    /// Timeouts passed to `wait_events`, in call order.
    pub fn waits(&self) -> Vec<Duration> {
        self.lock().waits.clone()
    }

    pub fn set_fail_enumeration(&self, fail: bool) {
        self.lock().fail_enumeration = fail;
    }

    pub fn set_reject_reparent(&self, reject: bool) {
        self.lock().reject_reparent = reject;
    }

    pub fn set_fail_present(&self, fail: bool) {
        self.lock().fail_present = fail;
    }

    pub fn set_fail_moves_for(&self, window: Option<NativeWindowHandle>) {
        self.lock().fail_moves_for = window;
    }
}

impl WindowingBackend for MockBackend {
    fn enumerate_visible_windows(&self) -> anyhow::Result<Vec<NativeWindowHandle>> {
        let state = self.lock();
        if state.fail_enumeration {
            bail!("enumeration unavailable");
        }
        Ok(state
            .windows
            .iter()
            .filter(|w| w.visible && w.parent.is_none())
            .map(|w| w.handle)
            .collect())
    }

    fn window_title(&self, window: NativeWindowHandle) -> anyhow::Result<String> {
        self.lock()
            .windows
            .iter()
            .find(|w| w.handle == window)
            .and_then(|w| w.title.clone())
            .ok_or_else(|| anyhow!("cannot read title of {window}"))
    }

    fn is_window(&self, window: NativeWindowHandle) -> bool {
        self.lock().windows.iter().any(|w| w.handle == window)
    }

    fn process_of(&self, window: NativeWindowHandle) -> Option<u32> {
        self.window(window).and_then(|w| w.process)
    }

    fn parent_of(&self, window: NativeWindowHandle) -> Option<NativeWindowHandle> {
        self.lock()
            .windows
            .iter()
            .find(|w| w.handle == window)
            .and_then(|w| w.parent)
    }

    fn reparent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
        size: Size,
    ) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.reject_reparent {
            bail!("SetParent refused");
        }
        state.calls.push(BackendCall::Reparent {
            child,
            parent,
            size,
        });
        let entry = state
            .windows
            .iter_mut()
            .find(|w| w.handle == child)
            .ok_or_else(|| anyhow!("no window {child}"))?;
        entry.parent = Some(parent);
        entry.origin = (0, 0);
        entry.size = size;
        Ok(())
    }

    fn enable_input(&self, window: NativeWindowHandle) -> anyhow::Result<()> {
        self.lock().calls.push(BackendCall::EnableInput(window));
        Ok(())
    }

    fn move_window(&self, window: NativeWindowHandle, origin: Point) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.fail_moves_for == Some(window) {
            bail!("move of {window} failed");
        }
        state.calls.push(BackendCall::Move { window, origin });
        let entry = state
            .windows
            .iter_mut()
            .find(|w| w.handle == window)
            .ok_or_else(|| anyhow!("no window {window}"))?;
        entry.origin = origin;
        // Win32 reports every move back through the window procedure.
        state.events.push_back(WindowEvent::Moved { window, origin });
        Ok(())
    }

    fn window_origin(&self, window: NativeWindowHandle) -> anyhow::Result<Point> {
        self.window(window)
            .map(|w| w.origin)
            .ok_or_else(|| anyhow!("no window {window}"))
    }

    fn client_size(&self, window: NativeWindowHandle) -> anyhow::Result<Size> {
        self.window(window)
            .map(|w| w.size)
            .ok_or_else(|| anyhow!("no window {window}"))
    }

    fn create_host_window(
        &self,
        _title: &str,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<NativeWindowHandle> {
        let handle = self.insert(None, origin, size);
        self.set_visible(handle, false);
        self.lock()
            .calls
            .push(BackendCall::CreateHost { origin, size });
        Ok(handle)
    }

    fn create_overlay_window(
        &self,
        owner: NativeWindowHandle,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<NativeWindowHandle> {
        let handle = self.insert(None, origin, size);
        self.lock().calls.push(BackendCall::CreateOverlay {
            owner,
            origin,
            size,
        });
        Ok(handle)
    }

    fn show_window(&self, window: NativeWindowHandle) -> anyhow::Result<()> {
        self.set_visible(window, true);
        self.lock().calls.push(BackendCall::Show(window));
        Ok(())
    }

    fn present(&self, window: NativeWindowHandle, frame: &RgbaBuffer) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.fail_present {
            bail!("UpdateLayeredWindow failed");
        }
        state.calls.push(BackendCall::Present(window));
        state.frames.push((window, frame.clone()));
        Ok(())
    }

    fn destroy_window(&self, window: NativeWindowHandle) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Destroy(window));
        // Children go down with their parent.
        state
            .windows
            .retain(|w| w.handle != window && w.parent != Some(window));
        Ok(())
    }

    fn wait_events(&self, timeout: Duration) -> Vec<WindowEvent> {
        let mut state = self.lock();
        state.waits.push(timeout);
        state.events.drain(..).collect()
    }
}
