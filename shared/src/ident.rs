//! Small-integer identity pool for entity ids
//!
//! Ids are handed out lowest-first from a fixed range `[0, capacity)` and can
//! be returned for reuse. Every id is always in exactly one of the `used` or
//! `free` sets.

use std::collections::BTreeSet;
use thiserror::Error;

/// Largest pool that still fits the one-byte entity id on the wire
pub const MAX_IDENTS: usize = 256;

/// Returned by [`IdentAlloc::fetch`] when every id in the pool is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no free identities left in pool of {capacity}")]
pub struct IdentityExhausted {
    pub capacity: usize,
}

/// Issues and reclaims unique entity ids
#[derive(Debug, Clone)]
pub struct IdentAlloc {
    capacity: usize,
    used: BTreeSet<u8>,
    free: BTreeSet<u8>,
}

impl IdentAlloc {
    /// Creates a pool covering `[0, capacity)`
    ///
    /// Capacity is clamped to [`MAX_IDENTS`] since ids travel as a single byte.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_IDENTS);
        Self {
            capacity,
            used: BTreeSet::new(),
            free: (0..capacity).map(|id| id as u8).collect(),
        }
    }

    /// Takes the lowest free id and marks it used
    pub fn fetch(&mut self) -> Result<u8, IdentityExhausted> {
        let id = self.free.pop_first().ok_or(IdentityExhausted {
            capacity: self.capacity,
        })?;
        self.used.insert(id);
        Ok(id)
    }

    /// Returns an id to the pool
    ///
    /// Freeing an id that is not in use does nothing, so late or duplicated
    /// quit packets are harmless. Returns whether the id was actually released.
    pub fn free(&mut self, id: u8) -> bool {
        if self.used.remove(&id) {
            self.free.insert(id);
            true
        } else {
            false
        }
    }

    pub fn is_used(&self, id: u8) -> bool {
        self.used.contains(&id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

impl Default for IdentAlloc {
    fn default() -> Self {
        Self::new(MAX_IDENTS)
    }
}
