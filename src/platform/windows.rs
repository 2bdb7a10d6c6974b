// platform/windows.rs - Win32 backend: Toolhelp snapshots + ReadProcessMemory.
//
// The overlay runs outside the game. The target is opened read-only
// (PROCESS_VM_READ | PROCESS_QUERY_LIMITED_INFORMATION); nothing is ever
// written to it.

use super::{file_name_matches, MemoryReader, ModuleInfo, Platform};
use crate::error::{Error, Result};
use crate::projection::Viewport;
use std::ptr;
use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::shared::windef::{POINT, RECT};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::memoryapi::ReadProcessMemory;
use winapi::um::minwinbase::STILL_ACTIVE;
use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, Process32FirstW, Process32NextW,
    MODULEENTRY32W, PROCESSENTRY32W, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::{HANDLE, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ};
use winapi::um::winuser::{
    ClientToScreen, FindWindowW, GetClientRect, GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN,
};

/// An opened target process.
pub struct RemoteProcess {
    pid: DWORD,
    handle: HANDLE,
}

// SAFETY: a process HANDLE is a kernel object reference usable from any thread,
// and ReadProcessMemory does not mutate any state on our side.
unsafe impl Send for RemoteProcess {}
unsafe impl Sync for RemoteProcess {}

impl RemoteProcess {
    /// Find the process by executable name and open it for reading.
    pub fn open(name: &str) -> Result<Self> {
        let pid = unsafe { find_process_id(name) }
            .ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;

        let handle = unsafe {
            OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid)
        };
        if handle.is_null() {
            return Err(Error::AccessDenied(format!(
                "OpenProcess({}) failed: {}",
                pid,
                std::io::Error::last_os_error()
            )));
        }

        Ok(Self { pid, handle })
    }
}

impl Drop for RemoteProcess {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

impl std::fmt::Debug for RemoteProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteProcess").field("pid", &self.pid).finish()
    }
}

impl MemoryReader for RemoteProcess {
    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<()> {
        let mut read = 0usize;
        let ok = unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const _,
                buf.as_mut_ptr() as *mut _,
                buf.len(),
                &mut read,
            )
        };
        if ok == 0 || read != buf.len() {
            return Err(Error::ReadFault { address, size: buf.len() });
        }
        Ok(())
    }
}

impl Platform for RemoteProcess {
    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        unsafe {
            let snap = CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, self.pid);
            if snap == INVALID_HANDLE_VALUE {
                return Err(Error::AccessDenied(format!(
                    "module snapshot of pid {} failed: {}",
                    self.pid,
                    std::io::Error::last_os_error()
                )));
            }

            let mut entry: MODULEENTRY32W = std::mem::zeroed();
            entry.dwSize = std::mem::size_of::<MODULEENTRY32W>() as DWORD;

            let mut modules = Vec::new();
            if Module32FirstW(snap, &mut entry) != 0 {
                loop {
                    modules.push(ModuleInfo {
                        name: wide_to_string(&entry.szModule),
                        base_address: entry.modBaseAddr as usize,
                        size: entry.modBaseSize as usize,
                    });
                    if Module32NextW(snap, &mut entry) == 0 {
                        break;
                    }
                }
            }
            CloseHandle(snap);
            Ok(modules)
        }
    }

    fn is_alive(&self) -> bool {
        let mut code: DWORD = 0;
        let ok = unsafe { GetExitCodeProcess(self.handle, &mut code) };
        ok != 0 && code == STILL_ACTIVE
    }
}

/// Walk a process snapshot looking for `name` (case-insensitive).
unsafe fn find_process_id(name: &str) -> Option<DWORD> {
    let snap = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
    if snap == INVALID_HANDLE_VALUE {
        return None;
    }

    let mut entry: PROCESSENTRY32W = std::mem::zeroed();
    entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as DWORD;

    let mut found = None;
    if Process32FirstW(snap, &mut entry) != 0 {
        loop {
            if file_name_matches(&wide_to_string(&entry.szExeFile), name) {
                found = Some(entry.th32ProcessID);
                break;
            }
            if Process32NextW(snap, &mut entry) == 0 {
                break;
            }
        }
    }
    CloseHandle(snap);
    found
}

/// Null-terminated UTF-16 buffer to String.
fn wide_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

// ============================================================
// Window Geometry
// ============================================================

/// Client rectangle (in screen coordinates) of the first window whose title
/// matches one of `titles`.
pub fn window_viewport(titles: &[String]) -> Option<Viewport> {
    titles.iter().find_map(|title| unsafe {
        let wide = to_wide(title);
        let hwnd = FindWindowW(ptr::null(), wide.as_ptr());
        if hwnd.is_null() {
            return None;
        }

        let mut rc: RECT = std::mem::zeroed();
        if GetClientRect(hwnd, &mut rc) == 0 {
            return None;
        }

        // Client origin -> screen origin
        let mut origin = POINT { x: rc.left, y: rc.top };
        if ClientToScreen(hwnd, &mut origin) == 0 {
            return None;
        }

        Some(Viewport::new(origin.x, origin.y, rc.right - rc.left, rc.bottom - rc.top))
    })
}

/// Size of the primary screen in pixels.
pub fn screen_size() -> Option<(i32, i32)> {
    let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    (w > 0 && h > 0).then_some((w, h))
}
