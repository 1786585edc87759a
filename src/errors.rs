use core::{alloc::Layout, fmt};

/// The error type for the `try_*` methods of [`HybridVec`](crate::HybridVec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionAllocErr {
    /// The requested number of elements exceeds [`max_size`](crate::HybridVec::max_size).
    ///
    /// Reported before the allocator is asked for anything.
    CapacityOverflow {
        /// Number of element slots that were asked for.
        requested: usize,
        /// The largest number of element slots the container can describe.
        max: usize,
    },
    /// The allocator could not satisfy the request.
    AllocErr {
        /// The layout that was passed to the allocator.
        layout: Layout,
    },
}

impl CollectionAllocErr {
    #[inline]
    pub(crate) const fn overflow(requested: usize, max: usize) -> Self {
        Self::CapacityOverflow { requested, max }
    }

    #[inline]
    pub(crate) const fn alloc(layout: Layout) -> Self {
        Self::AllocErr { layout }
    }
}

impl fmt::Display for CollectionAllocErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { requested, max } => write!(
                f,
                "capacity overflow: {requested} elements requested, max_size is {max}"
            ),
            Self::AllocErr { layout } => write!(
                f,
                "allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
        }
    }
}

impl core::error::Error for CollectionAllocErr {}

/// Returned by [`HybridVec::at`](crate::HybridVec::at) when the index is not below the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index {} out of range for length {}", self.index, self.len)
    }
}

impl core::error::Error for OutOfRange {}

/// Unwraps the result of a growing operation for the infallible API.
#[inline]
pub(crate) fn infallible<T>(result: Result<T, CollectionAllocErr>) -> T {
    match result {
        Ok(x) => x,
        Err(CollectionAllocErr::CapacityOverflow { .. }) => capacity_overflow(),
        Err(CollectionAllocErr::AllocErr { layout }) => alloc::alloc::handle_alloc_error(layout),
    }
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}
