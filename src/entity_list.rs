// entity_list.rs - Walks the game's chunked entity table.
//
// The table is two levels deep:
//
//   list base -> [chunk ptr; N]         (8 bytes each)
//   chunk ptr -> [slot; 512]            (slot_stride bytes each, entity ptr first)
//
// A 32-bit handle picks a chunk with bits 9..15 and a slot with bits 0..8.
// There is no list of live entries, so enumeration scans every index and is
// O(table size) per pass, not O(live entities).

use crate::config::Layout;
use crate::platform::{MemoryReader, Platform, ProcessHandle};

/// Slots per chunk.
pub const CHUNK_SLOTS: u32 = 512;

/// Highest index a handle can encode (15 bits).
pub const MAX_HANDLE_INDEX: u32 = 0x7FFF;

// ============================================================
// Entity Handle
// ============================================================

/// Opaque 32-bit entity handle. Not an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u32);

impl EntityHandle {
    /// Which chunk pointer to follow.
    #[inline]
    pub fn chunk_index(self) -> usize {
        ((self.0 & MAX_HANDLE_INDEX) >> 9) as usize
    }

    /// Which slot inside the chunk.
    #[inline]
    pub fn slot_index(self) -> usize {
        (self.0 & 0x1FF) as usize
    }

    /// 0 and 0xFFFFFFFF mean "no entity".
    pub fn is_assigned(self) -> bool {
        self.0 != 0 && self.0 != u32::MAX
    }
}

// ============================================================
// Entity List
// ============================================================

/// A located entity table. Holds no data from the target, only its base.
pub struct EntityList<'a, R> {
    reader: &'a R,
    base: usize,
    stride: usize,
}

impl<R> Clone for EntityList<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for EntityList<'_, R> {}

impl<'a, P: Platform> EntityList<'a, P> {
    /// Follow `module + entity_list` to the chunk-pointer table.
    /// `None` if the pointer is unreadable or null.
    pub fn locate(target: &'a ProcessHandle<P>, layout: &Layout) -> Option<Self> {
        let base = target.reader().read_ptr(target.address(layout.entity_list)).ok()?;
        (base != 0).then(|| Self::new(target.reader(), base, layout.slot_stride))
    }
}

impl<'a, R: MemoryReader> EntityList<'a, R> {
    pub fn new(reader: &'a R, base: usize, stride: usize) -> Self {
        Self { reader, base, stride }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    fn chunk_pointer(&self, chunk: usize) -> Option<usize> {
        let ptr = self.reader.read_ptr(self.base.wrapping_add(chunk * 8)).ok()?;
        (ptr != 0).then_some(ptr)
    }

    fn slot_entity(&self, chunk_ptr: usize, slot: usize) -> Option<usize> {
        let address = chunk_ptr.wrapping_add(slot.wrapping_mul(self.stride));
        let entity = self.reader.read_ptr(address).ok()?;
        (entity != 0).then_some(entity)
    }

    /// Resolve a handle to an entity base address.
    /// Unpopulated chunks, empty slots and failed reads all give `None`.
    pub fn resolve(&self, handle: EntityHandle) -> Option<usize> {
        let chunk_ptr = self.chunk_pointer(handle.chunk_index())?;
        self.slot_entity(chunk_ptr, handle.slot_index())
    }

    /// Chunk-by-chunk scan of indices `1..=max_index`.
    /// Each chunk pointer is read once per pass.
    pub fn chunks(&self, max_index: u32) -> Chunks<'a, R> {
        Chunks {
            list: *self,
            next_chunk: 0,
            last_index: max_index.min(MAX_HANDLE_INDEX),
        }
    }

    /// Every populated slot in `1..=max_index`, in slot order.
    /// Restartable: each call starts a fresh pass over the table.
    pub fn iter(&self, max_index: u32) -> impl Iterator<Item = (EntityHandle, usize)> + 'a {
        self.chunks(max_index).flatten()
    }
}

/// Iterator over the chunks covering an index range.
pub struct Chunks<'a, R> {
    list: EntityList<'a, R>,
    next_chunk: u32,
    last_index: u32,
}

impl<'a, R: MemoryReader> Iterator for Chunks<'a, R> {
    type Item = Chunk<'a, R>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_chunk;
        // Index 0 is reserved, so the first chunk starts at 1
        let first = (index * CHUNK_SLOTS).max(1);
        if first > self.last_index {
            return None;
        }
        self.next_chunk += 1;

        Some(Chunk {
            list: self.list,
            pointer: self.list.chunk_pointer(index as usize),
            next: first,
            end: (index * CHUNK_SLOTS + CHUNK_SLOTS - 1).min(self.last_index),
        })
    }
}

/// The populated slots of one chunk.
pub struct Chunk<'a, R> {
    list: EntityList<'a, R>,
    pointer: Option<usize>,
    next: u32,
    end: u32,
}

impl<R> Chunk<'_, R> {
    /// False when the chunk pointer was null or unreadable.
    pub fn is_populated(&self) -> bool {
        self.pointer.is_some()
    }
}

impl<R: MemoryReader> Iterator for Chunk<'_, R> {
    type Item = (EntityHandle, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let chunk_ptr = self.pointer?;
        while self.next <= self.end {
            let handle = EntityHandle(self.next);
            self.next += 1;
            if let Some(entity) = self.list.slot_entity(chunk_ptr, handle.slot_index()) {
                return Some((handle, entity));
            }
        }
        None
    }
}
