//! Typed block arena for short-lived site records.
//!
//! One `generate` call can allocate a huge number of small records that all
//! die together at the next call. The arena hands them out from fixed-size
//! blocks and reclaims everything with a single [`Arena::reset`]; records are
//! addressed by [`ArenaId`] handles, never by raw pointers. A reset keeps the
//! blocks but invalidates every previously issued handle.

use derive_more::From;

use crate::config::MIN_BLOCK_SIZE;
use crate::errors::{Result, TreemutError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From)]
pub struct ArenaId(usize);

impl ArenaId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct Arena<T> {
    blocks: Vec<Vec<T>>,
    block_size: usize,
    len: usize,
}

impl<T> Arena<T> {
    pub fn new(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(TreemutError::InvalidConfiguration(
                "arena block size must be nonzero".to_string(),
            ));
        }
        Ok(Self {
            blocks: Vec::new(),
            block_size: block_size.max(MIN_BLOCK_SIZE),
            len: 0,
        })
    }

    pub fn alloc(&mut self, value: T) -> Result<ArenaId> {
        let id = self.len;
        let block = id / self.block_size;
        if block == self.blocks.len() {
            let mut storage = Vec::new();
            storage.try_reserve_exact(self.block_size).map_err(|_| {
                TreemutError::ResourceExhausted(format!(
                    "cannot grow arena beyond {} records",
                    self.len
                ))
            })?;
            self.blocks.push(storage);
        }
        self.blocks[block].push(value);
        self.len += 1;
        Ok(ArenaId(id))
    }

    pub fn get(&self, id: ArenaId) -> Option<&T> {
        if id.0 >= self.len {
            return None;
        }
        Some(&self.blocks[id.0 / self.block_size][id.0 % self.block_size])
    }

    pub fn get_mut(&mut self, id: ArenaId) -> Option<&mut T> {
        if id.0 >= self.len {
            return None;
        }
        Some(&mut self.blocks[id.0 / self.block_size][id.0 % self.block_size])
    }

    /// Drops all records and invalidates every issued handle. Block storage
    /// is retained for the next run.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_get() {
        let mut arena: Arena<u32> = Arena::new(MIN_BLOCK_SIZE).unwrap();
        let ids: Vec<ArenaId> = (0..100).map(|v| arena.alloc(v).unwrap()).collect();
        assert_eq!(arena.len(), 100);
        for (v, id) in ids.iter().enumerate() {
            assert_eq!(arena.get(*id), Some(&(v as u32)));
        }
    }

    #[test]
    fn spans_multiple_blocks() {
        let mut arena: Arena<usize> = Arena::new(MIN_BLOCK_SIZE).unwrap();
        for v in 0..(3 * MIN_BLOCK_SIZE + 1) {
            arena.alloc(v).unwrap();
        }
        assert_eq!(arena.len(), 3 * MIN_BLOCK_SIZE + 1);
        let last = ArenaId::from(3 * MIN_BLOCK_SIZE);
        assert_eq!(arena.get(last), Some(&(3 * MIN_BLOCK_SIZE)));
    }

    #[test]
    fn reset_invalidates_handles() {
        let mut arena: Arena<u8> = Arena::new(64).unwrap();
        let id = arena.alloc(7).unwrap();
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.get(id), None);
        // a fresh handle after reset starts from the beginning again
        let id = arena.alloc(9).unwrap();
        assert_eq!(id.index(), 0);
        assert_eq!(arena.get(id), Some(&9));
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(matches!(
            Arena::<u8>::new(0),
            Err(TreemutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn small_block_size_is_floored() {
        let mut arena: Arena<u8> = Arena::new(1).unwrap();
        for _ in 0..MIN_BLOCK_SIZE {
            arena.alloc(0).unwrap();
        }
        assert_eq!(arena.blocks.len(), 1);
    }
}
