//! Screen geometry of the target's main window

use super::TargetProcessHandle;
use crate::error::QueryError;
use serde::{Deserialize, Serialize};

/// Window rectangle in (x, y, width, height) form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    /// Build from platform left/top/right/bottom edges
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }

    /// Zero or negative area; callers get this when no window could be measured
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Rectangle of the target's main window, or a zero-area rectangle on any failure
pub fn window_rect(handle: &TargetProcessHandle) -> WindowRect {
    match try_window_rect(handle) {
        Ok(rect) => rect,
        Err(e) => {
            tracing::debug!(pid = handle.pid, error = %e, "Window query failed");
            WindowRect::default()
        }
    }
}

/// Rectangle of the target's main window
pub fn try_window_rect(handle: &TargetProcessHandle) -> Result<WindowRect, QueryError> {
    platform::main_window_rect(handle.pid)
}

#[cfg(windows)]
mod platform {
    use super::WindowRect;
    use crate::error::QueryError;
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindow, GetWindowRect, GetWindowThreadProcessId, IsWindowVisible,
        GW_OWNER,
    };

    struct MainWindowSearch {
        pid: u32,
        found: Option<HWND>,
    }

    /// Stops at the first visible, unowned top-level window of the process
    unsafe extern "system" fn enum_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
        // SAFETY: lparam carries the &mut MainWindowSearch passed to EnumWindows below,
        // which outlives the enumeration.
        let search = &mut *(lparam.0 as *mut MainWindowSearch);

        let mut owner_pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut owner_pid as *mut u32));

        if owner_pid == search.pid
            && IsWindowVisible(hwnd).as_bool()
            && GetWindow(hwnd, GW_OWNER).0 == 0
        {
            search.found = Some(hwnd);
            return BOOL(0);
        }
        BOOL(1)
    }

    pub(super) fn main_window_rect(pid: u32) -> Result<WindowRect, QueryError> {
        let mut search = MainWindowSearch { pid, found: None };

        // SAFETY: the callback only dereferences lparam as the search struct above.
        // EnumWindows reports an error when the callback stops early, so only a
        // missing window counts as failure.
        let _ = unsafe {
            EnumWindows(
                Some(enum_proc),
                LPARAM(&mut search as *mut MainWindowSearch as isize),
            )
        };

        let hwnd = search.found.ok_or_else(|| QueryError::Window {
            pid,
            reason: "process has no main window".to_string(),
        })?;

        let mut rect = RECT::default();
        // SAFETY: hwnd came from EnumWindows and rect is a valid out pointer.
        unsafe { GetWindowRect(hwnd, &mut rect) }.map_err(|e| QueryError::Window {
            pid,
            reason: e.to_string(),
        })?;

        Ok(WindowRect::from_edges(
            rect.left,
            rect.top,
            rect.right,
            rect.bottom,
        ))
    }
}

#[cfg(not(windows))]
mod platform {
    use super::WindowRect;
    use crate::error::QueryError;

    pub(super) fn main_window_rect(pid: u32) -> Result<WindowRect, QueryError> {
        Err(QueryError::Window {
            pid,
            reason: "window metrics are only available on Windows".to_string(),
        })
    }
}
