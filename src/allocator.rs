//! The allocation policy a [`HybridVec`](crate::HybridVec) draws its heap blocks from.
//!
//! A container never talks to the global heap directly. Every heap block is obtained from, and
//! returned to, the [`Allocator`] value embedded in the container. The allocator also decides
//! whether a heap block may change hands between two containers:
//!
//! - two containers may exchange or take over each other's blocks only when their allocators
//!   compare [`equals`](Allocator::equals), or when the operation's propagation flag says the
//!   allocator travels with the block;
//! - otherwise the elements are relocated into storage owned by the receiving allocator.

use core::{
    alloc::Layout,
    fmt,
    marker::PhantomData,
    mem,
    ptr::NonNull,
};

use crate::{errors::CollectionAllocErr, utils::IsZST};

/// The allocator reported that it could not satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl core::error::Error for AllocError {}

/// A pluggable source of heap memory.
///
/// # Safety
///
/// - A block returned by [`allocate`](Allocator::allocate) must stay valid until it is passed to
///   [`deallocate`](Allocator::deallocate) of this allocator, a clone of it, or any allocator
///   that [`equals`](Allocator::equals) it.
/// - The returned slice must be at least `layout.size()` bytes long and aligned to
///   `layout.align()`. Any surplus is handed back to the caller as usable space.
/// - `deallocate` must accept any layout whose size lies between the requested size and the
///   returned length, with the requested alignment.
/// - A clone must compare equal to its source.
pub unsafe trait Allocator: Clone {
    /// Whether [`HybridVec::clone_from`](crate::HybridVec::clone_from) replaces the destination's
    /// allocator with the source's.
    const PROPAGATE_ON_CLONE_FROM: bool = false;
    /// Whether [`HybridVec::take_from`](crate::HybridVec::take_from) replaces the destination's
    /// allocator with the source's.
    const PROPAGATE_ON_MOVE: bool = false;
    /// Whether [`HybridVec::swap`](crate::HybridVec::swap) exchanges the allocators too.
    const PROPAGATE_ON_SWAP: bool = false;

    /// Allocates a block described by `layout`; the block may be larger than requested.
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

    /// Releases a block obtained from [`allocate`](Allocator::allocate).
    ///
    /// # Safety
    /// - `ptr` was returned by an allocator equal to `self`.
    /// - `layout` fits the block as described in the trait docs.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns `true` if blocks allocated by `self` can be released by `other` and vice versa.
    fn equals(&self, other: &Self) -> bool;

    /// The allocator a cloned container starts with.
    #[inline]
    fn select_on_clone(&self) -> Self {
        self.clone()
    }
}

/// The global heap, as exposed by [`alloc::alloc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            // SAFETY: alignments are non-zero powers of two.
            let dangling = unsafe { NonNull::new_unchecked(layout.align() as *mut u8) };
            return Ok(NonNull::slice_from_raw_parts(dangling, 0));
        }
        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { alloc::alloc::alloc(layout) };
        NonNull::new(ptr)
            .map(|ptr| NonNull::slice_from_raw_parts(ptr, layout.size()))
            .ok_or(AllocError)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            // SAFETY: see trait docs.
            unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
        }
    }

    #[inline(always)]
    fn equals(&self, _other: &Self) -> bool {
        true
    }
}

/// Obtains room for at least `n` elements of `T` from `alloc`.
///
/// Returns the block and the number of element slots it actually provides, which may exceed `n`
/// but never `max`. Requests above `max` fail before the allocator is consulted.
///
/// Zero-sized types never reach the allocator.
pub(crate) fn allocate_array<T, A: Allocator>(
    alloc: &A,
    n: usize,
    max: usize,
) -> Result<(NonNull<T>, usize), CollectionAllocErr> {
    if n > max {
        return Err(CollectionAllocErr::overflow(n, max));
    }
    if T::IS_ZST {
        return Ok((NonNull::dangling(), n));
    }
    let layout = Layout::array::<T>(n).map_err(|_| CollectionAllocErr::overflow(n, max))?;
    let block = alloc
        .allocate(layout)
        .map_err(|_| CollectionAllocErr::alloc(layout))?;

    let granted = (block.len() / mem::size_of::<T>()).min(max);
    debug_assert!(granted >= n, "allocator returned a block that is too small");
    Ok((block.cast(), granted))
}

/// Returns a block obtained from [`allocate_array`] to `alloc`.
///
/// # Safety
/// - `ptr` and `cap` were produced by `allocate_array` on an allocator equal to `alloc`.
/// - No live element remains in the block.
#[inline]
pub(crate) unsafe fn deallocate_array<T, A: Allocator>(alloc: &A, ptr: NonNull<T>, cap: usize) {
    if T::IS_ZST {
        return;
    }
    // SAFETY: this layout was valid when the block was allocated.
    unsafe {
        let layout = Layout::from_size_align_unchecked(
            mem::size_of::<T>() * cap,
            mem::align_of::<T>(),
        );
        alloc.deallocate(ptr.cast(), layout);
    }
}

/// A freshly allocated block that is released again unless [`into_raw`](OwnedBlock::into_raw)
/// is called.
///
/// Mutating operations hold the new block in this guard while they populate it, so a panic in
/// between gives the block back to the allocator.
pub(crate) struct OwnedBlock<'a, T, A: Allocator> {
    alloc: &'a A,
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

impl<'a, T, A: Allocator> OwnedBlock<'a, T, A> {
    #[inline]
    pub(crate) fn allocate(
        alloc: &'a A,
        n: usize,
        max: usize,
    ) -> Result<Self, CollectionAllocErr> {
        let (ptr, cap) = allocate_array::<T, A>(alloc, n, max)?;
        Ok(Self {
            alloc,
            ptr,
            cap,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    /// Disarms the guard and hands out the block.
    #[inline]
    pub(crate) fn into_raw(self) -> (NonNull<T>, usize) {
        let parts = (self.ptr, self.cap);
        mem::forget(self);
        parts
    }
}

impl<T, A: Allocator> Drop for OwnedBlock<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: the block came from `allocate_array` on this allocator and holds nothing live.
        unsafe { deallocate_array(self.alloc, self.ptr, self.cap) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingAlloc, reset, stats};

    #[test]
    fn global_round_trip() {
        let (ptr, cap) = allocate_array::<u64, _>(&Global, 10, usize::MAX).unwrap();
        assert_eq!(cap, 10);
        unsafe {
            ptr.as_ptr().write(7);
            assert_eq!(*ptr.as_ptr(), 7);
            deallocate_array(&Global, ptr, cap);
        }
    }

    #[test]
    fn over_max_fails_before_allocating() {
        reset();
        let alloc = CountingAlloc::new();
        let err = allocate_array::<u32, _>(&alloc, 9, 8).unwrap_err();
        assert_eq!(err, CollectionAllocErr::overflow(9, 8));
        assert_eq!(stats().allocations, 0);
    }

    #[test]
    fn surplus_becomes_capacity() {
        reset();
        let alloc = CountingAlloc::generous(3);
        let (ptr, cap) = allocate_array::<u16, _>(&alloc, 3, usize::MAX).unwrap();
        assert_eq!(cap, 9);
        unsafe { deallocate_array(&alloc, ptr, cap) };

        let (ptr, cap) = allocate_array::<u16, _>(&alloc, 3, 5).unwrap();
        assert_eq!(cap, 5);
        unsafe { deallocate_array(&alloc, ptr, cap) };
    }

    #[test]
    fn zst_skips_allocator() {
        reset();
        let alloc = CountingAlloc::new();
        let (_, cap) = allocate_array::<(), _>(&alloc, 1000, usize::MAX).unwrap();
        assert_eq!(cap, 1000);
        assert_eq!(stats().allocations, 0);
    }

    #[test]
    fn owned_block_releases_on_drop() {
        reset();
        let alloc = CountingAlloc::new();
        {
            let block = OwnedBlock::<u32, _>::allocate(&alloc, 4, usize::MAX).unwrap();
            assert_eq!(block.capacity(), 4);
        }
        let s = stats();
        assert_eq!(s.allocations, 1);
        assert_eq!(s.deallocations, 1);
        assert_eq!(s.outstanding, 0);

        let block = OwnedBlock::<u32, _>::allocate(&alloc, 4, usize::MAX).unwrap();
        let (ptr, cap) = block.into_raw();
        assert_eq!(stats().outstanding, 1);
        unsafe { deallocate_array(&alloc, ptr, cap) };
        assert_eq!(stats().outstanding, 0);
    }
}
