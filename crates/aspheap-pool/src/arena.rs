//! Bump arena backing one pool slot.
//!
//! Wraps bumpalo so the pool owns a concrete type: the arena is created
//! lazily on checkout and freed by dropping it, which releases every chunk
//! at once and invalidates everything allocated from it.

use bumpalo::Bump;

/// Bump arena for parse-tree and interpreter objects.
#[derive(Debug)]
pub struct Arena {
    bump: Bump,
}

impl Arena {
    /// Create an arena without pre-allocating a chunk.
    #[must_use]
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Create an arena whose first chunk holds at least `bytes` bytes.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        if bytes == 0 {
            return Self::new();
        }
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Get a reference to the underlying bumpalo allocator.
    #[must_use]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Get the number of bytes in chunks owned by this arena.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
