// platform/mod.rs - Process binding and raw reads against the target.
//
// The rest of the crate only sees two traits:
//   MemoryReader -> typed, independently fallible reads at absolute addresses
//   Platform     -> module enumeration + liveness on top of that
//
// Addresses are plain usize values. Nothing here ever builds a Rust pointer
// into the target; every value is re-read through the reader when needed.

use crate::error::{Error, Result};
use crate::math::Vec3;
#[cfg(not(windows))]
use crate::projection::Viewport;
use tracing::info;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::{screen_size, window_viewport, RemoteProcess};

#[cfg(unix)]
mod linux;
#[cfg(unix)]
pub use self::linux::RemoteProcess;

#[cfg(test)]
pub mod mock;

// ============================================================
// Raw Memory Accessor
// ============================================================

/// Reads from the target's address space.
///
/// Implementors provide `read_into`; the typed helpers are built on top of it.
/// No caching or batching happens at this layer.
pub trait MemoryReader {
    /// Fill `buf` with the bytes at `address`. Short reads are faults.
    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<()>;

    /// Read any plain-old-data value.
    fn read<T: bytemuck::Pod>(&self, address: usize) -> Result<T> {
        let mut value = T::zeroed();
        self.read_into(address, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    fn read_u8(&self, address: usize) -> Result<u8> {
        self.read(address)
    }

    fn read_u32(&self, address: usize) -> Result<u32> {
        self.read(address)
    }

    fn read_i32(&self, address: usize) -> Result<i32> {
        self.read(address)
    }

    fn read_u64(&self, address: usize) -> Result<u64> {
        self.read(address)
    }

    fn read_f32(&self, address: usize) -> Result<f32> {
        self.read(address)
    }

    /// Read an 8-byte pointer field as an address.
    fn read_ptr(&self, address: usize) -> Result<usize> {
        let raw = self.read_u64(address)?;
        usize::try_from(raw).map_err(|_| Error::ReadFault { address, size: 8 })
    }

    /// Three consecutive f32 values.
    fn read_vec3(&self, address: usize) -> Result<Vec3> {
        self.read(address)
    }
}

/// A loaded module of the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub base_address: usize,
    pub size: usize,
}

/// Module enumeration and liveness on top of raw reads.
pub trait Platform: MemoryReader {
    /// All modules currently mapped in the target.
    fn modules(&self) -> Result<Vec<ModuleInfo>>;

    /// Find a module by name (case-insensitive).
    fn module(&self, name: &str) -> Result<ModuleInfo> {
        self.modules()?
            .into_iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }

    /// False once the target has exited. Never becomes true again.
    fn is_alive(&self) -> bool;
}

// ============================================================
// Process Binder
// ============================================================

/// A bound target: the platform handle plus the resolved module base.
#[derive(Debug)]
pub struct ProcessHandle<P> {
    platform: P,
    module_base: usize,
    module_name: String,
}

impl<P: Platform> ProcessHandle<P> {
    /// Resolve `module_name` inside an already opened process.
    pub fn attach(platform: P, module_name: &str) -> Result<Self> {
        let module = platform.module(module_name)?;
        Ok(Self {
            platform,
            module_base: module.base_address,
            module_name: module.name,
        })
    }

    /// Base address of the layout module.
    pub fn module_base(&self) -> usize {
        self.module_base
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Absolute address of a module-relative offset.
    pub fn address(&self, offset: usize) -> usize {
        self.module_base.wrapping_add(offset)
    }

    pub fn reader(&self) -> &P {
        &self.platform
    }

    pub fn is_alive(&self) -> bool {
        self.platform.is_alive()
    }
}

/// Open the process named `process_name` and resolve `module_name` in it.
/// Fails with `ProcessNotFound` / `ModuleNotFound`; there is no retry here.
pub fn bind(process_name: &str, module_name: &str) -> Result<ProcessHandle<RemoteProcess>> {
    let process = RemoteProcess::open(process_name)?;
    let handle = ProcessHandle::attach(process, module_name)?;
    info!(
        process = process_name,
        module = handle.module_name(),
        base = format_args!("0x{:X}", handle.module_base()),
        "bound to target"
    );
    Ok(handle)
}

// ============================================================
// Window Geometry (no window system off Windows)
// ============================================================

/// Client rectangle of the first window matching one of `titles`.
#[cfg(not(windows))]
pub fn window_viewport(_titles: &[String]) -> Option<Viewport> {
    None
}

/// Size of the primary screen in pixels.
#[cfg(not(windows))]
pub fn screen_size() -> Option<(i32, i32)> {
    None
}

/// Case-insensitive file-name match that accepts either path separator.
pub(crate) fn file_name_matches(path: &str, name: &str) -> bool {
    path.rsplit(['/', '\\'])
        .next()
        .is_some_and(|file| file.eq_ignore_ascii_case(name))
}
