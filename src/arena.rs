//! Bump allocator backing every node of a [`Stack`](crate::stack::Stack).
//!
//! Nodes are never freed one by one. The whole arena is rewound by
//! [`Arena::recover`] between evaluations and handed back to the system
//! allocator by [`Arena::release`]. Values placed here never have their
//! destructors run, so only plain data (numbers, raw pointers into the same
//! arena) may be stored.

use std::alloc::Layout;
use std::mem;
use std::ptr::NonNull;

use bumpalo::Bump;

/// Chunked bump allocator.
pub struct Arena {
    bump: Bump,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Creates an arena that allocates its first chunk lazily.
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Creates an arena whose first chunk holds at least `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Returns `n_bytes` of uninitialised storage aligned for `f64`.
    ///
    /// A fresh, larger chunk is requested when the current one is exhausted.
    /// Allocation failure aborts through the global allocator's error hook.
    pub fn allocate(&self, n_bytes: usize) -> NonNull<u8> {
        let layout = Layout::from_size_align(n_bytes, mem::align_of::<f64>())
            .unwrap_or_else(|_| panic!("arena request of {n_bytes} bytes overflows isize"));
        self.bump.alloc_layout(layout)
    }

    #[inline]
    pub(crate) fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    #[inline]
    pub(crate) fn alloc_slice_fill_copy<T: Copy>(&self, len: usize, value: T) -> &mut [T] {
        self.bump.alloc_slice_fill_copy(len, value)
    }

    /// Rewinds the bump cursor without giving up capacity.
    ///
    /// A single chunk is rewound in place. Several chunks are replaced by one
    /// chunk holding at least their combined size, so the next epoch of the
    /// same shape allocates nothing. Every address previously handed out is
    /// dead afterwards.
    pub fn recover(&mut self) {
        if self.chunk_count() > 1 {
            let held = self.bump.allocated_bytes();
            self.bump = Bump::with_capacity(held);
        } else {
            self.bump.reset();
        }
    }

    /// Returns all chunks to the system allocator.
    pub fn release(&mut self) {
        self.bump = Bump::new();
    }

    /// Total bytes of chunk storage currently owned by the arena.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Number of chunks currently owned by the arena.
    pub fn chunk_count(&mut self) -> usize {
        self.bump.iter_allocated_chunks().count()
    }
}
