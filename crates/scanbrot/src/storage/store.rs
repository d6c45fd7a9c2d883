//! Byte-addressed backing store behind the storage channel.

use crate::error::{StorageError, StorageResult};

/// External memory, one byte per address.
///
/// Only the [`super::StorageChannel`] touches a store while the pipeline
/// runs; direct access is for setup and inspection.
pub trait BackingStore {
    /// Number of addressable bytes.
    fn capacity(&self) -> usize;

    /// Reads the byte at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfRange`] past the capacity.
    fn read(&self, addr: usize) -> StorageResult<u8>;

    /// Writes the byte at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfRange`] past the capacity.
    fn write(&mut self, addr: usize, value: u8) -> StorageResult<()>;
}

/// Fixed in-memory store, sized once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryStore {
    bytes: Box<[u8]>,
}

impl MemoryStore {
    /// Creates a zeroed store of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Creates a store holding exactly one `width x height` frame.
    #[must_use]
    pub fn for_frame(width: usize, height: usize) -> Self {
        Self::new(width * height)
    }

    /// All stored bytes, address order.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// One row of a frame laid out with `width` bytes per row.
    #[must_use]
    pub fn row(&self, row: usize, width: usize) -> Option<&[u8]> {
        let start = row.checked_mul(width)?;
        self.bytes.get(start..start + width)
    }
}

impl BackingStore for MemoryStore {
    #[inline]
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    fn read(&self, addr: usize) -> StorageResult<u8> {
        self.bytes.get(addr).copied().ok_or(StorageError::OutOfRange {
            addr,
            capacity: self.bytes.len(),
        })
    }

    #[inline]
    fn write(&mut self, addr: usize, value: u8) -> StorageResult<()> {
        let capacity = self.bytes.len();
        let slot = self
            .bytes
            .get_mut(addr)
            .ok_or(StorageError::OutOfRange { addr, capacity })?;
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut store = MemoryStore::for_frame(4, 2);
        assert_eq!(store.capacity(), 8);
        store.write(5, 42).unwrap();
        assert_eq!(store.read(5), Ok(42));
        assert_eq!(store.row(1, 4), Some(&[0, 42, 0, 0][..]));
        assert_eq!(store.row(2, 4), None);
    }

    #[test]
    fn test_out_of_range() {
        let mut store = MemoryStore::new(3);
        assert_eq!(store.read(3), Err(StorageError::OutOfRange { addr: 3, capacity: 3 }));
        assert!(store.write(100, 1).is_err());
    }
}
