//! In-memory stand-in for a target process.
//!
//! Memory is a sparse set of byte regions. Every read is counted so tests can
//! assert how often a code path touches the target, and the process can be
//! made to "exit" the moment a chosen address is read.

use super::{MemoryReader, ModuleInfo, Platform};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockMemory {
    /// Region start -> bytes.
    regions: BTreeMap<usize, Vec<u8>>,
}

impl MockMemory {
    /// Region containing `[address, address + len)`, as (start, bytes).
    fn region_for(&self, address: usize, len: usize) -> Option<(usize, &Vec<u8>)> {
        let (&start, data) = self.regions.range(..=address).next_back()?;
        let end = start + data.len();
        (address + len <= end).then_some((start, data))
    }

    fn write(&mut self, address: usize, bytes: &[u8]) {
        let existing = self.region_for(address, bytes.len()).map(|(start, _)| start);
        let Some(start) = existing else {
            self.regions.insert(address, bytes.to_vec());
            return;
        };
        let region = self.regions.get_mut(&start).expect("region exists");
        let offset = address - start;
        region[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

/// Mock process for tests. Clones share the same memory and counters.
#[derive(Clone, Debug, Default)]
pub struct MockProcess {
    memory: Arc<RwLock<MockMemory>>,
    modules: Arc<RwLock<Vec<ModuleInfo>>>,
    reads: Arc<AtomicUsize>,
    reads_after_exit: Arc<AtomicUsize>,
    exited: Arc<AtomicBool>,
    exit_on_read: Arc<RwLock<Option<usize>>>,
}

impl MockProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&self, name: &str, base_address: usize, size: usize) {
        self.modules.write().push(ModuleInfo {
            name: name.to_string(),
            base_address,
            size,
        });
    }

    /// Map a zero-filled region.
    pub fn alloc(&self, address: usize, size: usize) {
        self.memory.write().regions.insert(address, vec![0; size]);
    }

    /// Write bytes, extending an existing region in place when it covers them.
    pub fn write_memory(&self, address: usize, bytes: &[u8]) {
        self.memory.write().write(address, bytes);
    }

    pub fn write_value<T: bytemuck::Pod>(&self, address: usize, value: &T) {
        self.write_memory(address, bytemuck::bytes_of(value));
    }

    /// Total number of `read_into` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Reads attempted after the process exited.
    pub fn reads_after_exit(&self) -> usize {
        self.reads_after_exit.load(Ordering::SeqCst)
    }

    /// The process exits as soon as `address` is read (that read still succeeds).
    pub fn exit_on_read(&self, address: usize) {
        *self.exit_on_read.write() = Some(address);
    }

    pub fn exit(&self) {
        self.exited.store(true, Ordering::SeqCst);
    }
}

impl MemoryReader for MockProcess {
    fn read_into(&self, address: usize, buf: &mut [u8]) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.exited.load(Ordering::SeqCst) {
            self.reads_after_exit.fetch_add(1, Ordering::SeqCst);
            return Err(Error::ReadFault { address, size: buf.len() });
        }

        let memory = self.memory.read();
        let (start, data) = memory
            .region_for(address, buf.len())
            .ok_or(Error::ReadFault { address, size: buf.len() })?;
        let offset = address - start;
        buf.copy_from_slice(&data[offset..offset + buf.len()]);

        if *self.exit_on_read.read() == Some(address) {
            self.exit();
        }
        Ok(())
    }
}

impl Platform for MockProcess {
    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        Ok(self.modules.read().clone())
    }

    fn is_alive(&self) -> bool {
        !self.exited.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_land_inside_allocated_region() {
        let mock = MockProcess::new();
        mock.alloc(0x1000, 0x100);
        mock.write_value(0x1010, &0xAABBCCDDu32);

        assert_eq!(mock.read_u32(0x1010).unwrap(), 0xAABBCCDD);
        assert_eq!(mock.read_u32(0x1000).unwrap(), 0);
        assert_eq!(mock.read_u8(0x10FF).unwrap(), 0);
        assert!(mock.read_u8(0x1100).is_err());
    }

    #[test]
    fn counts_reads_including_faults() {
        let mock = MockProcess::new();
        mock.alloc(0x1000, 8);
        let _ = mock.read_u32(0x1000);
        let _ = mock.read_u32(0x9000);
        assert_eq!(mock.reads(), 2);
    }

    #[test]
    fn exit_trigger_fails_later_reads() {
        let mock = MockProcess::new();
        mock.alloc(0x1000, 16);
        mock.exit_on_read(0x1008);

        assert!(mock.read_u32(0x1000).is_ok());
        assert!(mock.is_alive());
        assert!(mock.read_u32(0x1008).is_ok());
        assert!(!mock.is_alive());
        assert!(mock.read_u32(0x1000).is_err());
        assert_eq!(mock.reads_after_exit(), 1);
    }
}
