//! Bounds-checked access to a guest's linear memory.
//!
//! The host never indexes raw guest memory directly. Every read and write goes
//! through [`GuestMemory`], which validates the full range against the memory's
//! current size and fails with [`OutOfBounds`] instead of panicking.

use std::ops::Range;

use wasmtime::Memory;
use wasmtime::Store;

/// A guest memory access fell outside the memory's current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub offset: u64,
    pub len: u64,
    pub size: u64,
}

impl std::fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "access [{}, {}) outside guest memory of {} bytes",
            self.offset,
            self.offset + self.len,
            self.size
        )
    }
}

impl std::error::Error for OutOfBounds {}

/// Checked view over an exported guest memory.
#[derive(Clone, Copy, Debug)]
pub struct GuestMemory {
    memory: Memory,
}

impl GuestMemory {
    pub fn new(memory: Memory) -> Self {
        Self { memory }
    }

    /// Current size of the memory in bytes.
    pub fn size<T: 'static>(&self, store: &Store<T>) -> usize {
        self.memory.data_size(store)
    }

    fn range(offset: u32, len: usize, size: usize) -> Result<Range<usize>, OutOfBounds> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= size => Ok(start..end),
            _ => Err(OutOfBounds { offset: offset as u64, len: len as u64, size: size as u64 }),
        }
    }

    /// Copies `len` bytes starting at `offset` out of the guest.
    pub fn read<T: 'static>(&self, store: &Store<T>, offset: u32, len: u32) -> Result<Vec<u8>, OutOfBounds> {
        let data = self.memory.data(store);
        let range = Self::range(offset, len as usize, data.len())?;
        Ok(data[range].to_vec())
    }

    /// Copies `bytes` into the guest starting at `offset`.
    pub fn write<T: 'static>(&self, store: &mut Store<T>, offset: u32, bytes: &[u8]) -> Result<(), OutOfBounds> {
        let data = self.memory.data_mut(store);
        let range = Self::range(offset, bytes.len(), data.len())?;
        data[range].copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::Engine;
    use wasmtime::MemoryType;

    fn one_page() -> (Store<()>, GuestMemory) {
        let engine = Engine::default();
        let mut store = Store::new(&engine, ());
        let memory = Memory::new(&mut store, MemoryType::new(1, None)).unwrap();
        (store, GuestMemory::new(memory))
    }

    #[test]
    fn test_write_then_read() {
        let (mut store, mem) = one_page();
        mem.write(&mut store, 100, b"Hello World!").unwrap();
        assert_eq!(mem.read(&store, 100, 12).unwrap(), b"Hello World!");
        assert_eq!(mem.read(&store, 106, 5).unwrap(), b"World");
    }

    #[test]
    fn test_access_at_the_edge() {
        let (mut store, mem) = one_page();
        let size = mem.size(&store) as u32;
        assert_eq!(size, 65536);

        mem.write(&mut store, size - 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(mem.read(&store, size - 4, 4).unwrap(), vec![1, 2, 3, 4]);
        assert!(mem.read(&store, size, 0).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_bounds() {
        let (mut store, mem) = one_page();
        assert_eq!(
            mem.write(&mut store, 65535, &[0, 0]),
            Err(OutOfBounds { offset: 65535, len: 2, size: 65536 })
        );
        assert_eq!(
            mem.read(&store, u32::MAX, 1),
            Err(OutOfBounds { offset: u32::MAX as u64, len: 1, size: 65536 })
        );
    }
}
