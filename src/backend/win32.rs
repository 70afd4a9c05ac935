//! Win32 implementation of [`WindowingBackend`].
//!
//! Window procedures push [`WindowEvent`]s into a process-wide queue that
//! [`Win32Backend::wait_events`] drains after pumping the thread's messages.
//! All calls must happen on the thread that created the backend.

use std::collections::VecDeque;
use std::mem;
use std::ptr;
use std::sync::{Mutex, Once};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use once_cell::sync::Lazy;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{
    BOOL, COLORREF, FALSE, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, SIZE, TRUE, WPARAM,
};
use windows::Win32::Graphics::Gdi::{
    ClientToScreen, CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GetDC,
    ReleaseDC, SelectObject, AC_SRC_ALPHA, AC_SRC_OVER, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    BLENDFUNCTION, DIB_RGB_COLORS, HDC,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{EnableWindow, ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, EnumWindows, GetAncestor,
    GetClientRect, GetDesktopWindow, GetWindowLongPtrW, GetWindowRect, GetWindowTextLengthW,
    GetWindowTextW, GetWindowThreadProcessId, IsWindow, IsWindowVisible, MsgWaitForMultipleObjects, PeekMessageW,
    RegisterClassW, SetParent, SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateMessage,
    UpdateLayeredWindow, GA_PARENT, GWL_STYLE, HMENU, HWND_TOPMOST, MA_NOACTIVATE, MSG,
    PM_REMOVE, QS_ALLINPUT, SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
    SWP_NOZORDER, SWP_SHOWWINDOW, SW_SHOWNOACTIVATE, ULW_ALPHA, WINDOWPOS, WINDOW_EX_STYLE,
    WINDOW_STYLE, WM_CAPTURECHANGED, WM_CLOSE, WM_DESTROY, WM_ERASEBKGND, WM_LBUTTONDOWN,
    WM_LBUTTONUP, WM_MOUSEACTIVATE, WM_MOUSEMOVE, WM_PARENTNOTIFY, WM_WINDOWPOSCHANGED,
    WNDCLASSW, WS_CAPTION, WS_CHILD, WS_CLIPCHILDREN, WS_EX_LAYERED, WS_EX_NOACTIVATE,
    WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_MAXIMIZEBOX, WS_MINIMIZEBOX, WS_POPUP, WS_SYSMENU,
    WS_THICKFRAME, WS_VISIBLE,
};

use super::{NativeWindowHandle, WindowEvent, WindowingBackend};
use crate::geometry::{Point, Size};
use crate::overlay::input::PointerInput;
use crate::overlay::render::RgbaBuffer;

const HOST_CLASS: &str = "LiveOverlayHost";
const OVERLAY_CLASS: &str = "LiveOverlaySurface";

/// `MK_LBUTTON` bit of the mouse message `wParam`.
const MK_LBUTTON_MASK: usize = 0x0001;

static EVENTS: Lazy<Mutex<VecDeque<WindowEvent>>> = Lazy::new(|| Mutex::new(VecDeque::new()));

fn push_event(event: WindowEvent) {
    if let Ok(mut events) = EVENTS.lock() {
        events.push_back(event);
    }
}

fn widestring(value: &str) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    std::ffi::OsStr::new(value)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

fn handle_of(hwnd: HWND) -> NativeWindowHandle {
    NativeWindowHandle(hwnd.0 as isize)
}

fn hwnd_of(window: NativeWindowHandle) -> HWND {
    HWND(window.0 as *mut _)
}

/// Host: borderless popup that clips its embedded child and never shows in
/// the taskbar.
pub fn compose_host_window_style() -> (WINDOW_STYLE, WINDOW_EX_STYLE) {
    (WS_POPUP | WS_CLIPCHILDREN, WS_EX_TOOLWINDOW | WS_EX_TOPMOST)
}

pub fn compose_overlay_window_ex_style() -> WINDOW_EX_STYLE {
    WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE
}

/// Style for a foreign top-level window once it lives inside the host.
pub fn embedded_child_style(style: WINDOW_STYLE) -> WINDOW_STYLE {
    let stripped = WS_POPUP | WS_CAPTION | WS_THICKFRAME | WS_MINIMIZEBOX | WS_MAXIMIZEBOX | WS_SYSMENU;
    WINDOW_STYLE((style.0 & !stripped.0) | WS_CHILD.0 | WS_VISIBLE.0)
}

/// Client coordinates packed into a mouse message `lParam`. They are signed
/// while the mouse is captured outside the window.
fn point_from_lparam(lparam: LPARAM) -> Point {
    let x = (lparam.0 & 0xffff) as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xffff) as i16 as i32;
    (x, y)
}

unsafe extern "system" fn host_wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let window = handle_of(hwnd);
    match msg {
        WM_WINDOWPOSCHANGED => {
            let pos = unsafe { &*(lparam.0 as *const WINDOWPOS) };
            if pos.flags.0 & SWP_NOMOVE.0 == 0 {
                push_event(WindowEvent::Moved {
                    window,
                    origin: (pos.x, pos.y),
                });
            }
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
        WM_PARENTNOTIFY => {
            if (wparam.0 & 0xffff) as u32 == WM_DESTROY {
                push_event(WindowEvent::Destroyed {
                    window: NativeWindowHandle(lparam.0),
                });
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            // The runtime decides; the window stays until it is destroyed.
            push_event(WindowEvent::CloseRequested { window });
            LRESULT(0)
        }
        WM_DESTROY => {
            push_event(WindowEvent::Destroyed { window });
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

unsafe extern "system" fn overlay_wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let window = handle_of(hwnd);
    match msg {
        WM_ERASEBKGND => LRESULT(1),
        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),
        WM_LBUTTONDOWN | WM_MOUSEMOVE | WM_LBUTTONUP => {
            let local = point_from_lparam(lparam);
            let mut screen = POINT {
                x: local.0,
                y: local.1,
            };
            let _ = unsafe { ClientToScreen(hwnd, &mut screen) };
            let global = (screen.x, screen.y);
            let input = match msg {
                WM_LBUTTONDOWN => {
                    let _ = unsafe { SetCapture(hwnd) };
                    PointerInput::LeftPressed { local, global }
                }
                WM_LBUTTONUP => PointerInput::LeftReleased { local, global },
                _ => PointerInput::Moved {
                    local,
                    global,
                    left_held: wparam.0 & MK_LBUTTON_MASK != 0,
                },
            };
            push_event(WindowEvent::Pointer { window, input });
            if msg == WM_LBUTTONUP {
                let _ = unsafe { ReleaseCapture() };
            }
            LRESULT(0)
        }
        WM_CAPTURECHANGED => {
            push_event(WindowEvent::Pointer {
                window,
                input: PointerInput::CaptureLost,
            });
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

unsafe extern "system" fn collect_visible(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = unsafe { &mut *(lparam.0 as *mut Vec<NativeWindowHandle>) };
    if unsafe { IsWindowVisible(hwnd) }.as_bool() {
        windows.push(handle_of(hwnd));
    }
    TRUE
}

fn pump_messages() {
    unsafe {
        let mut msg = MSG::default();
        while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

pub struct Win32Backend {
    hinstance: HINSTANCE,
    host_class: Vec<u16>,
    overlay_class: Vec<u16>,
}

impl Win32Backend {
    pub fn new() -> anyhow::Result<Self> {
        static REGISTER_CLASSES: Once = Once::new();
        let hinstance: HINSTANCE = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .context("GetModuleHandleW failed")?
            .into();
        let host_class = widestring(HOST_CLASS);
        let overlay_class = widestring(OVERLAY_CLASS);

        REGISTER_CLASSES.call_once(|| unsafe {
            let host = WNDCLASSW {
                hInstance: hinstance,
                lpszClassName: PCWSTR(host_class.as_ptr()),
                lpfnWndProc: Some(host_wndproc),
                ..Default::default()
            };
            let overlay = WNDCLASSW {
                hInstance: hinstance,
                lpszClassName: PCWSTR(overlay_class.as_ptr()),
                lpfnWndProc: Some(overlay_wndproc),
                ..Default::default()
            };
            if RegisterClassW(&host) == 0 || RegisterClassW(&overlay) == 0 {
                tracing::error!("window class registration failed");
            }
        });

        Ok(Self {
            hinstance,
            host_class,
            overlay_class,
        })
    }

    fn checked(&self, window: NativeWindowHandle) -> anyhow::Result<HWND> {
        let hwnd = hwnd_of(window);
        if !unsafe { IsWindow(hwnd) }.as_bool() {
            bail!("window {window} no longer exists");
        }
        Ok(hwnd)
    }
}

impl WindowingBackend for Win32Backend {
    fn enumerate_visible_windows(&self) -> anyhow::Result<Vec<NativeWindowHandle>> {
        let mut windows: Vec<NativeWindowHandle> = Vec::new();
        unsafe {
            EnumWindows(
                Some(collect_visible),
                LPARAM(&mut windows as *mut Vec<NativeWindowHandle> as isize),
            )
        }
        .context("EnumWindows failed")?;
        Ok(windows)
    }

    fn window_title(&self, window: NativeWindowHandle) -> anyhow::Result<String> {
        let hwnd = self.checked(window)?;
        let len = unsafe { GetWindowTextLengthW(hwnd) };
        if len <= 0 {
            return Ok(String::new());
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
        let copied = usize::try_from(copied).unwrap_or(0).min(buf.len());
        Ok(String::from_utf16_lossy(&buf[..copied]))
    }

    fn is_window(&self, window: NativeWindowHandle) -> bool {
        unsafe { IsWindow(hwnd_of(window)) }.as_bool()
    }

    fn process_of(&self, window: NativeWindowHandle) -> Option<u32> {
        let mut pid = 0u32;
        let thread =
            unsafe { GetWindowThreadProcessId(hwnd_of(window), Some(&mut pid as *mut u32)) };
        (thread != 0 && pid != 0).then_some(pid)
    }

    fn parent_of(&self, window: NativeWindowHandle) -> Option<NativeWindowHandle> {
        let parent = unsafe { GetAncestor(hwnd_of(window), GA_PARENT) };
        let desktop = unsafe { GetDesktopWindow() };
        (!parent.0.is_null() && parent != desktop).then(|| handle_of(parent))
    }

    fn reparent(
        &self,
        child: NativeWindowHandle,
        parent: NativeWindowHandle,
        size: Size,
    ) -> anyhow::Result<()> {
        let child_hwnd = self.checked(child)?;
        let parent_hwnd = self.checked(parent)?;
        let old_style = WINDOW_STYLE(unsafe { GetWindowLongPtrW(child_hwnd, GWL_STYLE) } as u32);
        unsafe {
            SetWindowLongPtrW(
                child_hwnd,
                GWL_STYLE,
                embedded_child_style(old_style).0 as isize,
            );
        }
        if let Err(err) = unsafe { SetParent(child_hwnd, parent_hwnd) } {
            unsafe {
                SetWindowLongPtrW(child_hwnd, GWL_STYLE, old_style.0 as isize);
            }
            return Err(anyhow!(err).context("SetParent failed"));
        }
        unsafe {
            SetWindowPos(
                child_hwnd,
                HWND::default(),
                0,
                0,
                size.width,
                size.height,
                SWP_NOZORDER | SWP_FRAMECHANGED | SWP_SHOWWINDOW,
            )
        }
        .context("positioning embedded window failed")?;
        Ok(())
    }

    fn enable_input(&self, window: NativeWindowHandle) -> anyhow::Result<()> {
        let hwnd = self.checked(window)?;
        // The return value is the previous disabled state, not an error.
        let _ = unsafe { EnableWindow(hwnd, TRUE) };
        Ok(())
    }

    fn move_window(&self, window: NativeWindowHandle, origin: Point) -> anyhow::Result<()> {
        let hwnd = self.checked(window)?;
        unsafe {
            SetWindowPos(
                hwnd,
                HWND::default(),
                origin.0,
                origin.1,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .with_context(|| format!("moving window {window} failed"))
    }

    fn window_origin(&self, window: NativeWindowHandle) -> anyhow::Result<Point> {
        let hwnd = self.checked(window)?;
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.context("GetWindowRect failed")?;
        Ok((rect.left, rect.top))
    }

    fn client_size(&self, window: NativeWindowHandle) -> anyhow::Result<Size> {
        let hwnd = self.checked(window)?;
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd, &mut rect) }.context("GetClientRect failed")?;
        Ok(Size::new(rect.right - rect.left, rect.bottom - rect.top))
    }

    fn create_host_window(
        &self,
        title: &str,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<NativeWindowHandle> {
        let (style, ex_style) = compose_host_window_style();
        let title = widestring(title);
        let hwnd = unsafe {
            CreateWindowExW(
                ex_style,
                PCWSTR(self.host_class.as_ptr()),
                PCWSTR(title.as_ptr()),
                style,
                origin.0,
                origin.1,
                size.width,
                size.height,
                HWND::default(),
                HMENU::default(),
                self.hinstance,
                None,
            )
        }
        .context("creating host window failed")?;
        Ok(handle_of(hwnd))
    }

    fn create_overlay_window(
        &self,
        owner: NativeWindowHandle,
        origin: Point,
        size: Size,
    ) -> anyhow::Result<NativeWindowHandle> {
        let owner = self.checked(owner)?;
        let hwnd = unsafe {
            CreateWindowExW(
                compose_overlay_window_ex_style(),
                PCWSTR(self.overlay_class.as_ptr()),
                PCWSTR::null(),
                WS_POPUP,
                origin.0,
                origin.1,
                size.width,
                size.height,
                owner,
                HMENU::default(),
                self.hinstance,
                None,
            )
        }
        .context("creating overlay window failed")?;
        unsafe {
            SetWindowPos(
                hwnd,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE | SWP_SHOWWINDOW,
            )
        }
        .context("showing overlay window failed")?;
        Ok(handle_of(hwnd))
    }

    fn show_window(&self, window: NativeWindowHandle) -> anyhow::Result<()> {
        let hwnd = self.checked(window)?;
        // Returns the previous visibility, not an error.
        let _ = unsafe { ShowWindow(hwnd, SW_SHOWNOACTIVATE) };
        Ok(())
    }

    fn present(&self, window: NativeWindowHandle, frame: &RgbaBuffer) -> anyhow::Result<()> {
        let hwnd = self.checked(window)?;
        let width = frame.width as i32;
        let height = frame.height as i32;
        let bgra = frame.to_premultiplied_bgra();

        unsafe {
            let screen_dc = GetDC(HWND::default());
            let mem_dc = CreateCompatibleDC(screen_dc);
            if mem_dc.0.is_null() {
                ReleaseDC(HWND::default(), screen_dc);
                bail!("CreateCompatibleDC failed");
            }
            let result = blit_layered(hwnd, screen_dc, mem_dc, width, height, &bgra);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);
            result
        }
    }

    fn destroy_window(&self, window: NativeWindowHandle) -> anyhow::Result<()> {
        let hwnd = hwnd_of(window);
        if unsafe { IsWindow(hwnd) }.as_bool() {
            unsafe { DestroyWindow(hwnd) }
                .with_context(|| format!("destroying window {window} failed"))?;
        }
        Ok(())
    }

    fn wait_events(&self, timeout: Duration) -> Vec<WindowEvent> {
        // u32::MAX is INFINITE.
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX - 1);
        unsafe {
            MsgWaitForMultipleObjects(None, FALSE, millis, QS_ALLINPUT);
        }
        pump_messages();
        match EVENTS.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Copy `bgra` into a DIB selected into `mem_dc` and hand it to the layered
/// window with per-pixel alpha.
unsafe fn blit_layered(
    hwnd: HWND,
    screen_dc: HDC,
    mem_dc: HDC,
    width: i32,
    height: i32,
    bgra: &[u8],
) -> anyhow::Result<()> {
    let mut bmi = BITMAPINFO::default();
    bmi.bmiHeader = BITMAPINFOHEADER {
        biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
        biWidth: width,
        biHeight: -height,
        biPlanes: 1,
        biBitCount: 32,
        biCompression: BI_RGB.0,
        ..Default::default()
    };

    let mut bits: *mut core::ffi::c_void = ptr::null_mut();
    let dib = unsafe {
        CreateDIBSection(
            mem_dc,
            &bmi,
            DIB_RGB_COLORS,
            &mut bits,
            windows::Win32::Foundation::HANDLE::default(),
            0,
        )
    }
    .context("CreateDIBSection failed")?;
    if bits.is_null() {
        let _ = unsafe { DeleteObject(dib) };
        bail!("CreateDIBSection returned no pixels");
    }
    unsafe { ptr::copy_nonoverlapping(bgra.as_ptr(), bits as *mut u8, bgra.len()) };

    let old_bitmap = unsafe { SelectObject(mem_dc, dib) };
    let size = SIZE {
        cx: width,
        cy: height,
    };
    let source = POINT::default();
    let blend = BLENDFUNCTION {
        BlendOp: AC_SRC_OVER as u8,
        BlendFlags: 0,
        SourceConstantAlpha: 255,
        AlphaFormat: AC_SRC_ALPHA as u8,
    };
    let result = unsafe {
        UpdateLayeredWindow(
            hwnd,
            screen_dc,
            None,
            Some(&size),
            mem_dc,
            Some(&source),
            COLORREF(0),
            Some(&blend),
            ULW_ALPHA,
        )
    };
    unsafe {
        SelectObject(mem_dc, old_bitmap);
        let _ = DeleteObject(dib);
    }
    result.context("UpdateLayeredWindow failed")
}

#[cfg(test)]
mod windows_tests {
    use super::*;
    use windows::Win32::UI::WindowsAndMessaging::WS_EX_TRANSPARENT;

    #[test]
    fn overlay_is_layered_topmost_and_clickable() {
        let style = compose_overlay_window_ex_style();
        assert_ne!(style.0 & WS_EX_LAYERED.0, 0);
        assert_ne!(style.0 & WS_EX_TOPMOST.0, 0);
        assert_ne!(style.0 & WS_EX_NOACTIVATE.0, 0);
        assert_eq!(style.0 & WS_EX_TRANSPARENT.0, 0);
    }

    #[test]
    fn host_is_borderless_and_topmost() {
        let (style, ex_style) = compose_host_window_style();
        assert_eq!(style.0 & WS_CAPTION.0, 0);
        assert_ne!(style.0 & WS_CLIPCHILDREN.0, 0);
        assert_ne!(ex_style.0 & WS_EX_TOPMOST.0, 0);
    }

    #[test]
    fn embedding_strips_frame_and_adds_child() {
        let style = embedded_child_style(WS_POPUP | WS_CAPTION | WS_THICKFRAME | WS_SYSMENU);
        assert_eq!(style.0 & (WS_POPUP.0 | WS_CAPTION.0 | WS_THICKFRAME.0 | WS_SYSMENU.0), 0);
        assert_ne!(style.0 & WS_CHILD.0, 0);
        assert_ne!(style.0 & WS_VISIBLE.0, 0);
    }

    #[test]
    fn lparam_coordinates_are_signed() {
        let packed = ((-5i16 as u16 as isize) << 16) | (-12i16 as u16 as isize);
        assert_eq!(point_from_lparam(LPARAM(packed)), (-12, -5));
        assert_eq!(point_from_lparam(LPARAM((30 << 16) | 40)), (40, 30));
    }

    #[test]
    fn dead_handles_are_reported() {
        let backend = Win32Backend::new().unwrap();
        assert!(!backend.is_window(NativeWindowHandle(0)));
        assert!(backend.window_title(NativeWindowHandle(0)).is_err());
        assert_eq!(backend.process_of(NativeWindowHandle(0)), None);
        assert!(backend.destroy_window(NativeWindowHandle(0)).is_ok());
    }
}
