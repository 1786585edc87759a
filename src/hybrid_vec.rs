use alloc::{boxed::Box, vec::Vec};
use core::{
    fmt,
    iter::FusedIterator,
    mem::{self, MaybeUninit},
    ops::RangeBounds,
    ptr::{self, NonNull},
    slice,
};

use crate::{
    allocator::{Allocator, Global, OwnedBlock, deallocate_array},
    errors::{CollectionAllocErr, OutOfRange, infallible},
    raw::{CloseGap, InsertGap, Writer, destroy_range},
    utils::{cold_path, impl_slice_traits, split_range_bound},
};

/// Where the elements currently live.
///
/// The variant is the mode tag: there is no separate flag and no pointer into the container
/// itself, so moving a [`HybridVec`] by value never invalidates anything.
enum Buffer<T, const N: usize> {
    Inline([MaybeUninit<T>; N]),
    Heap { ptr: NonNull<T>, cap: usize },
}

impl<T, const N: usize> Buffer<T, N> {
    #[inline(always)]
    const fn inline() -> Self {
        const { assert!(N > 0, "the inline capacity of a HybridVec must be non-zero") };
        Self::Inline([const { MaybeUninit::uninit() }; N])
    }

    #[inline(always)]
    const fn as_ptr(&self) -> *const T {
        match self {
            Self::Inline(slots) => slots.as_ptr().cast(),
            Self::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    #[inline(always)]
    const fn as_mut_ptr(&mut self) -> *mut T {
        match self {
            Self::Inline(slots) => slots.as_mut_ptr().cast(),
            Self::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    #[inline(always)]
    const fn capacity(&self) -> usize {
        match self {
            Self::Inline(_) => N,
            Self::Heap { cap, .. } => *cap,
        }
    }
}

/// A vector that keeps up to `N` elements inline and moves them to a heap block obtained from
/// `A` once more room is needed.
///
/// - In inline mode the capacity is exactly `N` and no allocator call is ever made.
/// - The first time a size above the current capacity is requested, the elements move into a
///   heap block. Removing elements never moves them back; only [`shrink_to_fit`] and
///   [`shrink_to`] do.
/// - A heap block's capacity is whatever the allocator returned, clamped to [`max_size`].
///
/// Every operation that can grow the storage has a `try_` form returning
/// [`CollectionAllocErr`]. The plain form panics on capacity overflow and calls
/// [`handle_alloc_error`](alloc::alloc::handle_alloc_error) on allocation failure. Either way a
/// failed growth leaves the container exactly as it was.
///
/// # Examples
///
/// ```
/// # use hybridvec::{HybridVec, hybridvec};
/// let mut vec: HybridVec<i32, 4> = hybridvec![1, 2, 3];
/// assert!(vec.is_inline());
///
/// vec.push(4);
/// assert_eq!(vec.capacity(), 4);
///
/// vec.push(5);
/// assert!(!vec.is_inline());
/// assert_eq!(vec.capacity(), 7);
/// assert_eq!(vec, [1, 2, 3, 4, 5]);
/// ```
///
/// [`shrink_to_fit`]: HybridVec::shrink_to_fit
/// [`shrink_to`]: HybridVec::shrink_to
/// [`max_size`]: HybridVec::max_size
pub struct HybridVec<T, const N: usize, A: Allocator = Global> {
    buf: Buffer<T, N>,
    len: usize,
    alloc: A,
}

unsafe impl<T: Send, const N: usize, A: Allocator + Send> Send for HybridVec<T, N, A> {}
unsafe impl<T: Sync, const N: usize, A: Allocator + Sync> Sync for HybridVec<T, N, A> {}

impl<T, const N: usize, A: Allocator> Drop for HybridVec<T, N, A> {
    fn drop(&mut self) {
        // SAFETY: `[0, len)` is live; the block came from `self.alloc`.
        unsafe {
            destroy_range(self.buf.as_mut_ptr(), self.len);
            if let Buffer::Heap { ptr, cap } = self.buf {
                deallocate_array(&self.alloc, ptr, cap);
            }
        }
    }
}

impl<T, const N: usize> HybridVec<T, N> {
    /// Creates an empty inline vector backed by the global heap.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec = HybridVec::<u8, 16>::new();
    /// assert!(vec.is_empty());
    /// assert_eq!(vec.capacity(), 16);
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            buf: Buffer::inline(),
            len: 0,
            alloc: Global,
        }
    }

    /// Creates an empty vector with room for at least `capacity` elements.
    ///
    /// Stays inline when `capacity <= N`.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds [`max_size`](HybridVec::max_size).
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// Creates a vector of `len` default values.
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec = HybridVec::<u32, 2>::with_len(3);
    /// assert_eq!(vec, [0, 0, 0]);
    /// ```
    #[inline]
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_in(len, Global)
    }

    /// Creates a vector holding `n` clones of `value`.
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec = HybridVec::<char, 4>::from_elem('x', 6);
    /// assert_eq!(vec, ['x'; 6]);
    /// assert!(!vec.is_inline());
    /// ```
    #[inline]
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(value, n, Global)
    }
}

impl<T, const N: usize, A: Allocator> HybridVec<T, N, A> {
    /// The number of elements that fit inline.
    pub const STATIC_CAPACITY: usize = N;

    /// Creates an empty inline vector that draws heap blocks from `alloc`.
    #[inline]
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buf: Buffer::inline(),
            len: 0,
            alloc,
        }
    }

    /// Creates an empty vector with room for at least `capacity` elements.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds [`max_size`](HybridVec::max_size).
    #[inline]
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        infallible(Self::try_with_capacity_in(capacity, alloc))
    }

    /// Fallible form of [`with_capacity_in`](HybridVec::with_capacity_in).
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, CollectionAllocErr> {
        let mut vec = Self::new_in(alloc);
        vec.try_reserve(capacity)?;
        Ok(vec)
    }

    /// Creates a vector of `len` default values, allocating from `alloc`.
    ///
    /// Requests exactly `len` slots if they do not fit inline.
    pub fn with_len_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut vec = Self::new_in(alloc);
        vec.resize_with(len, T::default);
        vec
    }

    /// Creates a vector holding `n` clones of `value`, allocating from `alloc`.
    pub fn from_elem_in(value: T, n: usize, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut vec = Self::new_in(alloc);
        vec.assign_elem(n, value);
        vec
    }

    /// Creates a vector holding clones of `src`, allocating exactly once if `src` does not fit
    /// inline.
    pub fn from_slice_in(src: &[T], alloc: A) -> Self
    where
        T: Clone,
    {
        let mut vec = Self::new_in(alloc);
        vec.assign_from_slice(src);
        vec
    }

    /// Collects `iter` into a vector allocating from `alloc`.
    ///
    /// An iterator that reports an exact length gets a block of exactly that size; anything
    /// else grows as it is pushed.
    ///
    /// ```
    /// # use hybridvec::{HybridVec, Global};
    /// let vec = HybridVec::<u8, 4, Global>::from_iter_in(0..6, Global);
    /// assert_eq!(vec.capacity(), 6);
    /// ```
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Self {
        let mut vec = Self::new_in(alloc);
        vec.assign(iter);
        vec
    }

    /// The inline capacity `N`.
    #[inline(always)]
    pub const fn static_capacity() -> usize {
        N
    }

    /// The largest number of elements any vector of `T` can hold.
    ///
    /// Element counts are bounded by a 32-bit counter, so this is `u32::MAX / size_of::<T>()`
    /// (`u32::MAX` for zero-sized types).
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// assert_eq!(HybridVec::<u32, 4>::max_size(), u32::MAX as usize / 4);
    /// ```
    #[inline(always)]
    pub const fn max_size() -> usize {
        crate::utils::max_size::<T>()
    }

    /// Number of live elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector holds no elements.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the vector can hold without reallocating.
    ///
    /// Always `N` while inline.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns `true` if the elements live in the inline buffer.
    #[inline(always)]
    pub const fn is_inline(&self) -> bool {
        matches!(self.buf, Buffer::Inline(_))
    }

    /// The allocator heap blocks are drawn from.
    #[inline(always)]
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a raw pointer to the first element.
    ///
    /// The pointer is invalidated by any operation that changes the capacity or the mode, and
    /// by moving the vector while it is inline.
    #[inline(always)]
    pub const fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    /// Returns a mutable raw pointer to the first element.
    ///
    /// Invalidated under the same conditions as [`as_ptr`](HybridVec::as_ptr).
    #[inline(always)]
    pub const fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr()
    }

    /// Extracts a slice containing the entire vector.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let vec: HybridVec<i32, 2> = hybridvec![1, 2, 3];
    /// assert_eq!(vec.as_slice(), &[1, 2, 3]);
    /// ```
    #[inline(always)]
    pub const fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is live.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    /// Extracts a mutable slice of the entire vector.
    #[inline(always)]
    pub const fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: `[0, len)` is live.
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
    }

    /// Forces the length of the vector to `new_len`.
    ///
    /// # Safety
    /// - `new_len <= self.capacity()`.
    /// - The elements at `[old_len, new_len)` are initialized.
    #[inline(always)]
    pub const unsafe fn set_len(&mut self, new_len: usize) {
        self.len = new_len;
    }

    /// Bounds-checked access.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec, OutOfRange};
    /// let vec: HybridVec<i32, 2> = hybridvec![7, 8];
    /// assert_eq!(vec.at(1), Ok(&8));
    /// assert_eq!(vec.at(2), Err(OutOfRange { index: 2, len: 2 }));
    /// ```
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T, OutOfRange> {
        let len = self.len;
        self.as_slice().get(index).ok_or(OutOfRange { index, len })
    }

    /// Bounds-checked mutable access.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRange> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(OutOfRange { index, len })
    }

    // ------------------------------------------------------------------------
    // Storage transitions

    /// `len + additional`, checked against [`max_size`](HybridVec::max_size).
    #[inline]
    fn required(&self, additional: usize) -> Result<usize, CollectionAllocErr> {
        let max = Self::max_size();
        match self.len.checked_add(additional) {
            Some(required) if required <= max => Ok(required),
            _ => Err(CollectionAllocErr::overflow(
                self.len.saturating_add(additional),
                max,
            )),
        }
    }

    /// Capacity to request when `required` slots are needed: exactly `required`, or the
    /// amortized `cap + cap / 2 + 1` if that is larger.
    #[inline]
    fn growth_target(&self, required: usize, exact: bool) -> usize {
        if exact {
            return required;
        }
        let cap = self.capacity();
        cap.saturating_add(cap / 2)
            .saturating_add(1)
            .max(required)
            .min(Self::max_size())
    }

    /// Moves the vector onto a fresh heap block of at least `request` slots.
    ///
    /// `fill` receives the current element pointer and the new block. It must return the number
    /// of live elements it left at the start of the block, and every element of the old storage
    /// must have been moved into the block or otherwise disposed of by then. If it panics, it
    /// must not have taken anything out of the old storage. Nothing changes until `fill` returns.
    ///
    /// # Safety
    /// `fill` upholds the contract above.
    unsafe fn relocate(
        &mut self,
        request: usize,
        fill: impl FnOnce(*mut T, *mut T) -> usize,
    ) -> Result<(), CollectionAllocErr> {
        let block = OwnedBlock::<T, A>::allocate(&self.alloc, request, Self::max_size())?;
        let len = fill(self.buf.as_mut_ptr(), block.as_mut_ptr());
        let (ptr, cap) = block.into_raw();

        let old = mem::replace(&mut self.buf, Buffer::Heap { ptr, cap });
        self.len = len;
        match old {
            Buffer::Inline(_) => log::trace!("promoted {len} elements to a heap block of {cap}"),
            Buffer::Heap { ptr, cap: old_cap } => {
                log::trace!("reallocated heap block: {old_cap} -> {cap} slots");
                // SAFETY: the old block came from `self.alloc` and was emptied by `fill`.
                unsafe { deallocate_array(&self.alloc, ptr, old_cap) };
            }
        }
        Ok(())
    }

    /// Ensures room for `additional` more elements.
    fn try_grow(&mut self, additional: usize, exact: bool) -> Result<(), CollectionAllocErr> {
        let required = self.required(additional)?;
        if required <= self.capacity() {
            return Ok(());
        }
        cold_path();
        let request = self.growth_target(required, exact);
        let len = self.len;
        // SAFETY: every element is moved into the block.
        unsafe {
            self.relocate(request, |src, dst| {
                ptr::copy_nonoverlapping(src, dst, len);
                len
            })
        }
    }

    /// Moves the elements from the heap block back into the inline buffer.
    ///
    /// # Safety
    /// `self.len <= N`.
    unsafe fn demote(&mut self) {
        debug_assert!(self.len <= N);
        if let Buffer::Heap { ptr, cap } = mem::replace(&mut self.buf, Buffer::inline()) {
            // SAFETY: `len <= N` elements are live in the block.
            unsafe {
                ptr::copy_nonoverlapping(ptr.as_ptr(), self.buf.as_mut_ptr(), self.len);
                deallocate_array(&self.alloc, ptr, cap);
            }
            log::trace!("demoted {} elements to inline storage", self.len);
        }
    }

    /// Drops every element and gives the heap block, if any, back to the allocator.
    fn release(&mut self) {
        self.clear();
        if let Buffer::Heap { ptr, cap } = mem::replace(&mut self.buf, Buffer::inline()) {
            // SAFETY: the block came from `self.alloc` and is empty.
            unsafe { deallocate_array(&self.alloc, ptr, cap) };
        }
    }

    /// Appends up to `count` elements produced by `fill`.
    ///
    /// Elements `fill` constructed before panicking are dropped again; the vector keeps its
    /// previous contents and storage.
    #[inline]
    fn try_append_with(
        &mut self,
        count: usize,
        exact: bool,
        fill: impl FnOnce(&mut Writer<T>),
    ) -> Result<(), CollectionAllocErr> {
        self.try_insert_with(self.len, count, exact, fill)?;
        Ok(())
    }

    /// Inserts up to `count` elements produced by `fill` at `index`.
    ///
    /// With room to spare the tail is shifted up in place, and shifted back if `fill` panics or
    /// produces fewer elements. Otherwise the new elements are constructed straight into a new
    /// block and the old ones are moved around them afterwards, so a panic leaves the old
    /// storage untouched.
    fn try_insert_with(
        &mut self,
        index: usize,
        count: usize,
        exact: bool,
        fill: impl FnOnce(&mut Writer<T>),
    ) -> Result<usize, CollectionAllocErr> {
        let len = self.len;
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );

        let required = self.required(count)?;
        if required <= self.capacity() {
            let base = self.buf.as_mut_ptr();
            // SAFETY: `count` free slots follow the live elements and `index <= len`.
            unsafe {
                let gap = InsertGap::open(base, &mut self.len, index, count);
                let mut writer = Writer::new(gap.slot(), gap.gap());
                fill(&mut writer);
                gap.close(writer.finish());
            }
        } else {
            cold_path();
            let request = self.growth_target(required, exact);
            // SAFETY: the new elements are built first; the old ones are then all moved.
            unsafe {
                self.relocate(request, |src, dst| {
                    let mut writer = Writer::new(dst.add(index), count);
                    fill(&mut writer);
                    let filled = writer.finish();
                    ptr::copy_nonoverlapping(src, dst, index);
                    ptr::copy_nonoverlapping(src.add(index), dst.add(index + filled), len - index);
                    len + filled
                })?;
            }
        }
        Ok(index)
    }

    /// Replaces the contents with up to `count` elements produced by `fill`.
    ///
    /// When `count` exceeds the capacity the new elements are built in a fresh block before the
    /// old ones are dropped, so a panic leaves the vector unchanged. Otherwise the old elements
    /// are dropped first and a panic leaves the vector empty.
    fn try_assign_with(
        &mut self,
        count: usize,
        fill: impl FnOnce(&mut Writer<T>),
    ) -> Result<(), CollectionAllocErr> {
        let max = Self::max_size();
        if count > max {
            return Err(CollectionAllocErr::overflow(count, max));
        }

        if count <= self.capacity() {
            self.clear();
            // SAFETY: the vector is empty and has room for `count` elements.
            let mut writer = unsafe { Writer::new(self.buf.as_mut_ptr(), count) };
            fill(&mut writer);
            self.len = writer.finish();
            return Ok(());
        }

        cold_path();
        let block = OwnedBlock::<T, A>::allocate(&self.alloc, count, max)?;
        // SAFETY: the block is fresh.
        let mut writer = unsafe { Writer::new(block.as_mut_ptr(), count) };
        fill(&mut writer);
        let len = writer.finish();
        let (ptr, cap) = block.into_raw();

        let old_len = mem::replace(&mut self.len, len);
        let old = mem::replace(&mut self.buf, Buffer::Heap { ptr, cap });
        // SAFETY: the old storage holds `old_len` live elements nobody else can reach.
        unsafe {
            match old {
                Buffer::Inline(mut slots) => {
                    destroy_range(slots.as_mut_ptr().cast::<T>(), old_len);
                    log::trace!("promoted to a heap block of {cap} on assignment");
                }
                Buffer::Heap { ptr, cap: old_cap } => {
                    destroy_range(ptr.as_ptr(), old_len);
                    deallocate_array(&self.alloc, ptr, old_cap);
                    log::trace!("replaced heap block on assignment: {old_cap} -> {cap} slots");
                }
            }
        }
        Ok(())
    }

    /// Moves every element of `other` to the end of `self`, leaving `other` empty.
    ///
    /// Room is taken from `self`'s allocator; `other` keeps its own storage.
    fn try_adopt(&mut self, other: &mut Self) -> Result<(), CollectionAllocErr> {
        let count = other.len;
        self.try_grow(count, true)?;
        // SAFETY: room was reserved; `other` gives up ownership by resetting its length.
        unsafe {
            ptr::copy_nonoverlapping(other.as_ptr(), self.as_mut_ptr().add(self.len), count);
            other.len = 0;
        }
        self.len += count;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Growth

    /// Reserves room for at least `additional` more elements.
    ///
    /// Requests exactly `len + additional` slots when the current capacity is too small, and
    /// does nothing otherwise. Never shrinks.
    ///
    /// # Panics
    /// Panics if the new capacity exceeds [`max_size`](HybridVec::max_size).
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 4> = hybridvec![1];
    /// vec.reserve(2);
    /// assert!(vec.is_inline());
    ///
    /// vec.reserve(9);
    /// assert_eq!(vec.capacity(), 10);
    /// ```
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional));
    }

    /// Fallible form of [`reserve`](HybridVec::reserve). On error nothing changes.
    ///
    /// ```
    /// # use hybridvec::{HybridVec, CollectionAllocErr};
    /// let mut vec = HybridVec::<u64, 4>::new();
    /// let err = vec.try_reserve(usize::MAX).unwrap_err();
    /// assert!(matches!(err, CollectionAllocErr::CapacityOverflow { .. }));
    /// assert!(vec.is_inline());
    /// ```
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CollectionAllocErr> {
        self.try_grow(additional, true)
    }

    /// Shrinks the capacity as close to the length as possible.
    ///
    /// Moves back into the inline buffer when `len <= N`. Otherwise asks for a block of exactly
    /// `len` slots; if that fails, the vector silently keeps its current block.
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec: HybridVec<i32, 4> = (0..10).collect();
    /// vec.truncate(3);
    /// assert!(!vec.is_inline());
    ///
    /// vec.shrink_to_fit();
    /// assert!(vec.is_inline());
    /// assert_eq!(vec, [0, 1, 2]);
    /// ```
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.shrink_to(0);
    }

    /// Shrinks the capacity to no less than `max(len, min_capacity)`, best effort.
    pub fn shrink_to(&mut self, min_capacity: usize) {
        let Buffer::Heap { cap, .. } = self.buf else {
            return;
        };
        let target = self.len.max(min_capacity);
        if target >= cap {
            return;
        }
        if target <= N {
            // SAFETY: `len <= target <= N`.
            unsafe { self.demote() };
            return;
        }

        let len = self.len;
        match OwnedBlock::<T, A>::allocate(&self.alloc, target, Self::max_size()) {
            Ok(block) if block.capacity() < cap => {
                // SAFETY: all elements move into the new block; the old one came from `alloc`.
                unsafe {
                    ptr::copy_nonoverlapping(self.buf.as_ptr(), block.as_mut_ptr(), len);
                    let (ptr, new_cap) = block.into_raw();
                    if let Buffer::Heap { ptr, cap } =
                        mem::replace(&mut self.buf, Buffer::Heap { ptr, cap: new_cap })
                    {
                        deallocate_array(&self.alloc, ptr, cap);
                    }
                    log::trace!("shrunk heap block: {cap} -> {new_cap} slots");
                }
            }
            Ok(_) => log::trace!("shrink_to({target}) would not release anything, keeping {cap}"),
            Err(err) => log::trace!("shrink_to({target}) kept {cap} slots: {err}"),
        }
    }

    // ------------------------------------------------------------------------
    // Appending

    /// Appends an element.
    ///
    /// Grows to `cap + cap / 2 + 1` slots when full.
    ///
    /// # Panics
    /// Panics if the new capacity exceeds [`max_size`](HybridVec::max_size).
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 2> = hybridvec![1, 2];
    /// vec.push(vec[0]);
    /// assert_eq!(vec, [1, 2, 1]);
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        infallible(self.try_push(value));
    }

    /// Appends an element and returns a reference to it.
    ///
    /// On error `value` is dropped and the vector is unchanged.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<&mut T, CollectionAllocErr> {
        if self.len == self.capacity() {
            self.try_grow(1, false)?;
        }
        // SAFETY: there is a free slot at `len`.
        unsafe {
            let slot = self.buf.as_mut_ptr().add(self.len);
            slot.write(value);
            self.len += 1;
            Ok(&mut *slot)
        }
    }

    /// Appends the element built by `f` and returns a reference to it.
    ///
    /// `f` runs before any growth, so if it panics the vector is unchanged.
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut vec = HybridVec::<String, 2>::new();
    /// vec.emplace_back(|| "abc".repeat(2)).push('!');
    /// assert_eq!(vec, ["abcabc!"]);
    /// ```
    #[inline]
    pub fn emplace_back(&mut self, f: impl FnOnce() -> T) -> &mut T {
        let value = f();
        infallible(self.try_push(value))
    }

    /// Removes the last element and returns it, or `None` if empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the element at the old `len - 1` is live and is no longer tracked.
        unsafe { Some(ptr::read(self.buf.as_ptr().add(self.len))) }
    }

    /// Clones and appends every element of `other`.
    ///
    /// Grows with the amortized rule. If a clone panics, the clones made so far are dropped
    /// and the vector is unchanged.
    #[inline]
    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        infallible(self.try_extend_from_slice(other));
    }

    /// Fallible form of [`extend_from_slice`](HybridVec::extend_from_slice).
    pub fn try_extend_from_slice(&mut self, other: &[T]) -> Result<(), CollectionAllocErr>
    where
        T: Clone,
    {
        self.try_append_with(other.len(), false, |w| w.extend_cloned(other))
    }

    /// Resizes to `new_len`, cloning `value` into new slots or dropping trailing elements.
    ///
    /// Grows to exactly `new_len` slots when needed.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<&str, 2> = hybridvec!["a"];
    /// vec.resize(3, "b");
    /// assert_eq!(vec, ["a", "b", "b"]);
    /// assert_eq!(vec.capacity(), 3);
    ///
    /// vec.resize(1, "c");
    /// assert_eq!(vec, ["a"]);
    /// ```
    #[inline]
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        infallible(self.try_resize(new_len, value));
    }

    /// Fallible form of [`resize`](HybridVec::resize). On error nothing changes.
    pub fn try_resize(&mut self, new_len: usize, value: T) -> Result<(), CollectionAllocErr>
    where
        T: Clone,
    {
        match new_len.checked_sub(self.len) {
            None | Some(0) => {
                self.truncate(new_len);
                Ok(())
            }
            Some(extra) => self.try_append_with(extra, true, |w| w.fill(extra, value)),
        }
    }

    /// Resizes to `new_len`, filling new slots with values returned by `f`.
    pub fn resize_with(&mut self, new_len: usize, f: impl FnMut() -> T) {
        match new_len.checked_sub(self.len) {
            None | Some(0) => self.truncate(new_len),
            Some(extra) => infallible(self.try_append_with(extra, true, |w| w.extend_with(extra, f))),
        }
    }

    // ------------------------------------------------------------------------
    // Insertion

    /// Inserts `value` at `index`, shifting the tail right, and returns `index`.
    ///
    /// Grows with the amortized rule.
    ///
    /// # Panics
    /// - Panics if `index > len`.
    /// - Panics if the new capacity exceeds [`max_size`](HybridVec::max_size).
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<char, 4> = hybridvec!['a', 'b', 'c'];
    /// assert_eq!(vec.insert(1, 'd'), 1);
    /// assert_eq!(vec, ['a', 'd', 'b', 'c']);
    /// ```
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        infallible(self.try_insert(index, value))
    }

    /// Fallible form of [`insert`](HybridVec::insert). On error `value` is dropped and nothing
    /// else changes.
    ///
    /// # Panics
    /// Panics if `index > len`.
    #[inline]
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<usize, CollectionAllocErr> {
        self.try_insert_with(index, 1, false, |w| w.push(value))
    }

    /// Inserts the element built by `f` at `index` and returns `index`.
    ///
    /// `f` runs first; if it panics the vector is unchanged.
    #[inline]
    pub fn emplace(&mut self, index: usize, f: impl FnOnce() -> T) -> usize {
        let value = f();
        self.insert(index, value)
    }

    /// Inserts clones of `src` at `index` and returns `index`.
    ///
    /// Grows to exactly the required size. If a clone panics, the vector ends up with its
    /// previous elements in their previous order.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<String, 2> = hybridvec!["a".to_string(), "d".to_string()];
    /// vec.insert_from_slice(1, &["b".to_string(), "c".to_string()]);
    /// assert_eq!(vec, ["a", "b", "c", "d"]);
    /// assert_eq!(vec.capacity(), 4);
    /// ```
    #[inline]
    pub fn insert_from_slice(&mut self, index: usize, src: &[T]) -> usize
    where
        T: Clone,
    {
        infallible(self.try_insert_from_slice(index, src))
    }

    /// Fallible form of [`insert_from_slice`](HybridVec::insert_from_slice).
    pub fn try_insert_from_slice(
        &mut self,
        index: usize,
        src: &[T],
    ) -> Result<usize, CollectionAllocErr>
    where
        T: Clone,
    {
        self.try_insert_with(index, src.len(), true, |w| w.extend_cloned(src))
    }

    /// Same as [`insert_from_slice`](HybridVec::insert_from_slice), copying `src` in bulk.
    #[inline]
    pub fn insert_copy_slice(&mut self, index: usize, src: &[T]) -> usize
    where
        T: Copy,
    {
        infallible(self.try_insert_copy_slice(index, src))
    }

    /// Fallible form of [`insert_copy_slice`](HybridVec::insert_copy_slice).
    pub fn try_insert_copy_slice(
        &mut self,
        index: usize,
        src: &[T],
    ) -> Result<usize, CollectionAllocErr>
    where
        T: Copy,
    {
        self.try_insert_with(index, src.len(), true, |w| w.extend_copied(src))
    }

    /// Inserts the items of `iter` at `index` and returns `index`.
    ///
    /// Room for [`len`](ExactSizeIterator::len) items is made up front with an exact-fit
    /// request. Items beyond the reported length are ignored; if the iterator ends early the
    /// tail is closed up behind the items it did yield.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<u8, 4> = hybridvec![0, 9];
    /// vec.insert_many(1, 1..4);
    /// assert_eq!(vec, [0, 1, 2, 3, 9]);
    /// ```
    #[inline]
    pub fn insert_many<I>(&mut self, index: usize, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        infallible(self.try_insert_many(index, iter))
    }

    /// Fallible form of [`insert_many`](HybridVec::insert_many).
    pub fn try_insert_many<I>(&mut self, index: usize, iter: I) -> Result<usize, CollectionAllocErr>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = iter.into_iter();
        self.try_insert_with(index, iter.len(), true, |w| w.extend_iter(iter))
    }

    // ------------------------------------------------------------------------
    // Removal

    /// Drops the elements in `range`, closes the gap, and returns the start of the range.
    ///
    /// The capacity is unchanged.
    ///
    /// # Panics
    /// Panics if the range is decreasing or out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 8> = hybridvec![10, 20, 30, 40, 50];
    /// assert_eq!(vec.erase(1..3), 1);
    /// assert_eq!(vec, [10, 40, 50]);
    /// assert_eq!(vec.capacity(), 8);
    /// ```
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let (start, end) = split_range_bound(&range, self.len);
        if start == end {
            return start;
        }
        let base = self.buf.as_mut_ptr();
        // SAFETY: `start < end <= len`; the guard closes the gap even if a drop panics.
        unsafe {
            let _gap = CloseGap::new(base, &mut self.len, start, end);
            destroy_range(base.add(start), end - start);
        }
        start
    }

    /// Removes and returns the element at `index`, shifting the tail left.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(index < len, "removal index (is {index}) should be < len (is {len})");
        // SAFETY: `index < len`.
        unsafe {
            let base = self.buf.as_mut_ptr();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(index + 1), base.add(index), len - index - 1);
            self.len = len - 1;
            value
        }
    }

    /// Removes and returns the element at `index`, replacing it with the last element.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let len = self.len;
        assert!(index < len, "swap_remove index (is {index}) should be < len (is {len})");
        // SAFETY: `index < len`.
        unsafe {
            let base = self.buf.as_mut_ptr();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(len - 1), base.add(index), 1);
            self.len = len - 1;
            value
        }
    }

    /// Drops the elements past `len`. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let old_len = mem::replace(&mut self.len, len);
        // SAFETY: `[len, old_len)` is live and no longer tracked.
        unsafe { destroy_range(self.buf.as_mut_ptr().add(len), old_len - len) };
    }

    /// Drops every element, keeping the capacity and the mode.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Keeps only the elements for which `f` returns `true`, in order.
    #[inline]
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        self.retain_mut(|v| f(v));
    }

    /// Like [`retain`](HybridVec::retain), with mutable access to each element.
    ///
    /// If `f` or a drop panics, the elements not yet visited are kept.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 4> = hybridvec![1, 2, 3, 4, 5];
    /// vec.retain_mut(|v| {
    ///     *v *= 10;
    ///     *v != 30
    /// });
    /// assert_eq!(vec, [10, 20, 40, 50]);
    /// ```
    pub fn retain_mut<F: FnMut(&mut T) -> bool>(&mut self, mut f: F) {
        struct Compact<'a, T> {
            base: *mut T,
            len: &'a mut usize,
            original: usize,
            processed: usize,
            kept: usize,
        }

        impl<T> Drop for Compact<'_, T> {
            fn drop(&mut self) {
                let rest = self.original - self.processed;
                // SAFETY: `[processed, original)` is live and `kept <= processed`.
                unsafe {
                    ptr::copy(self.base.add(self.processed), self.base.add(self.kept), rest);
                }
                *self.len = self.kept + rest;
            }
        }

        let original = self.len;
        let base = self.buf.as_mut_ptr();
        let mut g = Compact {
            base,
            len: &mut self.len,
            original,
            processed: 0,
            kept: 0,
        };

        while g.processed < original {
            // SAFETY: `processed < original`, and the element has not been moved or dropped.
            unsafe {
                let cur = base.add(g.processed);
                if f(&mut *cur) {
                    if g.kept != g.processed {
                        ptr::copy_nonoverlapping(cur, base.add(g.kept), 1);
                    }
                    g.kept += 1;
                    g.processed += 1;
                } else {
                    g.processed += 1;
                    ptr::drop_in_place(cur);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Assignment

    /// Replaces the contents with clones of `src`.
    ///
    /// Reuses the current storage when it is large enough; a clone panic then leaves the vector
    /// empty. Otherwise builds the new contents in a block of exactly `src.len()` slots first,
    /// and a panic leaves the vector unchanged.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 2> = hybridvec![1, 2, 3, 4, 5, 6];
    /// let cap = vec.capacity();
    /// vec.assign_from_slice(&[7, 8, 9]);
    /// assert_eq!(vec, [7, 8, 9]);
    /// assert_eq!(vec.capacity(), cap);
    /// ```
    #[inline]
    pub fn assign_from_slice(&mut self, src: &[T])
    where
        T: Clone,
    {
        infallible(self.try_assign_from_slice(src));
    }

    /// Fallible form of [`assign_from_slice`](HybridVec::assign_from_slice).
    pub fn try_assign_from_slice(&mut self, src: &[T]) -> Result<(), CollectionAllocErr>
    where
        T: Clone,
    {
        self.try_assign_with(src.len(), |w| w.extend_cloned(src))
    }

    /// Same as [`assign_from_slice`](HybridVec::assign_from_slice), copying `src` in bulk.
    #[inline]
    pub fn assign_copy_slice(&mut self, src: &[T])
    where
        T: Copy,
    {
        infallible(self.try_assign_copy_slice(src));
    }

    /// Fallible form of [`assign_copy_slice`](HybridVec::assign_copy_slice).
    pub fn try_assign_copy_slice(&mut self, src: &[T]) -> Result<(), CollectionAllocErr>
    where
        T: Copy,
    {
        self.try_assign_with(src.len(), |w| w.extend_copied(src))
    }

    /// Replaces the contents with `n` clones of `value`.
    #[inline]
    pub fn assign_elem(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        infallible(self.try_assign_elem(n, value));
    }

    /// Fallible form of [`assign_elem`](HybridVec::assign_elem).
    pub fn try_assign_elem(&mut self, n: usize, value: T) -> Result<(), CollectionAllocErr>
    where
        T: Clone,
    {
        self.try_assign_with(n, |w| w.fill(n, value))
    }

    /// Replaces the contents with the items of `iter`.
    ///
    /// An iterator that reports an exact length is written in one pass with the same
    /// guarantees as [`assign_from_slice`](HybridVec::assign_from_slice). Anything else clears
    /// the vector and appends item by item.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut vec: HybridVec<i32, 4> = hybridvec![1, 2];
    /// vec.assign((0..10).filter(|v| v % 3 == 0));
    /// assert_eq!(vec, [0, 3, 6, 9]);
    /// ```
    #[inline]
    pub fn assign<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        infallible(self.try_assign(iter));
    }

    /// Fallible form of [`assign`](HybridVec::assign).
    pub fn try_assign<I: IntoIterator<Item = T>>(
        &mut self,
        iter: I,
    ) -> Result<(), CollectionAllocErr> {
        let mut iter = iter.into_iter();
        match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                self.try_assign_with(lower, |w| w.extend_iter(&mut iter))?;
            }
            _ => self.clear(),
        }
        for item in iter {
            self.try_push(item)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Ownership transfer

    /// Takes the contents out, leaving `self` empty and inline.
    ///
    /// The returned vector keeps the heap block, if any, and a clone of the allocator.
    ///
    /// ```
    /// # use hybridvec::HybridVec;
    /// let mut a: HybridVec<i32, 2> = (0..5).collect();
    /// let b = a.take();
    /// assert_eq!(b, [0, 1, 2, 3, 4]);
    /// assert!(a.is_empty() && a.is_inline());
    /// assert_eq!(a.capacity(), 2);
    /// ```
    #[inline]
    pub fn take(&mut self) -> Self {
        let alloc = self.alloc.clone();
        mem::replace(self, Self::new_in(alloc))
    }

    /// Replaces the contents of `self` with the contents of `other`, leaving `other` empty and
    /// inline.
    ///
    /// - With [`PROPAGATE_ON_MOVE`](Allocator::PROPAGATE_ON_MOVE), `self` first releases its
    ///   storage and adopts a clone of `other`'s allocator.
    /// - If the allocators are then equal and `other` is on the heap, its block is taken over
    ///   without touching the elements.
    /// - Otherwise the elements are moved into storage owned by `self`'s allocator, and
    ///   `other`'s block goes back to `other`'s allocator.
    ///
    /// # Panics
    /// Panics if relocating the elements needs memory the allocator cannot provide.
    pub fn take_from(&mut self, other: &mut Self) {
        if A::PROPAGATE_ON_MOVE {
            self.release();
            self.alloc = other.alloc.clone();
        } else {
            self.clear();
        }

        if !other.is_inline() && self.alloc.equals(&other.alloc) {
            self.release();
            let block = mem::replace(&mut other.buf, Buffer::inline());
            self.buf = block;
            self.len = mem::replace(&mut other.len, 0);
            log::trace!("took over a heap block of {}", self.capacity());
        } else {
            infallible(self.try_adopt(other));
            other.release();
        }
    }

    /// Exchanges the contents of two vectors.
    ///
    /// - Both inline: the elements are swapped pairwise, then the longer tail is moved over.
    /// - One on the heap: the block changes hands and the inline elements are moved the other
    ///   way.
    /// - Both on the heap: the blocks are exchanged.
    ///
    /// The allocators are exchanged too when
    /// [`PROPAGATE_ON_SWAP`](Allocator::PROPAGATE_ON_SWAP) is set. When it is not and the
    /// allocators differ, no block changes hands: the elements are relocated instead.
    ///
    /// ```
    /// # use hybridvec::{hybridvec, HybridVec};
    /// let mut a: HybridVec<i32, 2> = hybridvec![1, 2, 3];
    /// let mut b: HybridVec<i32, 2> = hybridvec![4];
    /// a.swap(&mut b);
    /// assert_eq!(a, [4]);
    /// assert_eq!(b, [1, 2, 3]);
    /// assert!(a.is_inline() && !b.is_inline());
    /// ```
    pub fn swap(&mut self, other: &mut Self) {
        let both_inline = self.is_inline() && other.is_inline();
        if !both_inline && !A::PROPAGATE_ON_SWAP && !self.alloc.equals(&other.alloc) {
            cold_path();
            let mut mine = self.take();
            self.take_from(other);
            other.take_from(&mut mine);
            return;
        }

        match (self.is_inline(), other.is_inline()) {
            (true, true) => {
                if self.len <= other.len {
                    Self::swap_inline(self, other);
                } else {
                    Self::swap_inline(other, self);
                }
            }
            (false, true) => Self::swap_heap_inline(self, other),
            (true, false) => Self::swap_heap_inline(other, self),
            (false, false) => {
                mem::swap(&mut self.buf, &mut other.buf);
                mem::swap(&mut self.len, &mut other.len);
            }
        }

        if A::PROPAGATE_ON_SWAP {
            mem::swap(&mut self.alloc, &mut other.alloc);
        }
    }

    /// `short.len <= long.len`, both inline.
    fn swap_inline(short: &mut Self, long: &mut Self) {
        let (s, l) = (short.len, long.len);
        // SAFETY: both buffers are distinct and hold `s` and `l` live elements in `N` slots.
        unsafe {
            let sp = short.buf.as_mut_ptr();
            let lp = long.buf.as_mut_ptr();
            ptr::swap_nonoverlapping(sp, lp, s);
            ptr::copy_nonoverlapping(lp.add(s), sp.add(s), l - s);
        }
        short.len = l;
        long.len = s;
    }

    /// `heap` is on the heap, `inline` is inline.
    fn swap_heap_inline(heap: &mut Self, inline: &mut Self) {
        let block = mem::replace(&mut heap.buf, Buffer::inline());
        // SAFETY: `inline.len <= N` elements move into the fresh inline buffer.
        unsafe {
            ptr::copy_nonoverlapping(inline.buf.as_ptr(), heap.buf.as_mut_ptr(), inline.len);
        }
        inline.buf = block;
        mem::swap(&mut heap.len, &mut inline.len);
        log::trace!("moved a heap block of {} across a swap", inline.capacity());
    }

    // ------------------------------------------------------------------------
    // Conversion

    /// Moves the elements into a [`Vec`].
    pub fn into_vec(mut self) -> Vec<T> {
        let len = self.len;
        let mut vec = Vec::with_capacity(len);
        // SAFETY: the elements change owner; `self` forgets them before anything can panic.
        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr(), vec.as_mut_ptr(), len);
            self.len = 0;
            vec.set_len(len);
        }
        vec
    }

    /// Moves the elements into a boxed slice.
    #[inline]
    pub fn into_boxed_slice(self) -> Box<[T]> {
        self.into_vec().into_boxed_slice()
    }
}

impl_slice_traits!(HybridVec);

impl<T, U, const N: usize, const M: usize, A, B> PartialEq<HybridVec<U, M, B>>
    for HybridVec<T, N, A>
where
    T: PartialEq<U>,
    A: Allocator,
    B: Allocator,
{
    #[inline]
    fn eq(&self, other: &HybridVec<U, M, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, const N: usize, A: Allocator + Default> Default for HybridVec<T, N, A> {
    #[inline]
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, const N: usize, A: Allocator> Clone for HybridVec<T, N, A> {
    /// Clones the elements into a vector whose allocator is chosen by
    /// [`Allocator::select_on_clone`].
    fn clone(&self) -> Self {
        Self::from_slice_in(self.as_slice(), self.alloc.select_on_clone())
    }

    /// Copy-assigns from `source`, reusing the current storage when it is large enough.
    ///
    /// With [`PROPAGATE_ON_CLONE_FROM`](Allocator::PROPAGATE_ON_CLONE_FROM), `self` adopts a
    /// clone of `source`'s allocator, releasing its storage first if the two allocators differ.
    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_CLONE_FROM {
            if !self.alloc.equals(&source.alloc) {
                self.release();
            }
            self.alloc = source.alloc.clone();
        }
        self.assign_from_slice(source.as_slice());
    }
}

impl<T, const N: usize, A: Allocator> Extend<T> for HybridVec<T, N, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.try_grow(iter.size_hint().0, false));
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: Copy + 'a, const N: usize, A: Allocator> Extend<&'a T> for HybridVec<T, N, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, const N: usize, A: Allocator + Default> FromIterator<T> for HybridVec<T, N, A> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, A::default())
    }
}

impl<T, const N: usize, const P: usize> From<[T; P]> for HybridVec<T, N> {
    /// ```
    /// # use hybridvec::HybridVec;
    /// let vec = HybridVec::<i32, 2>::from([1, 2, 3]);
    /// assert_eq!(vec, [1, 2, 3]);
    /// ```
    fn from(array: [T; P]) -> Self {
        Self::from_iter_in(array, Global)
    }
}

impl<T: Clone, const N: usize> From<&[T]> for HybridVec<T, N> {
    #[inline]
    fn from(src: &[T]) -> Self {
        Self::from_slice_in(src, Global)
    }
}

impl<T, const N: usize> From<Vec<T>> for HybridVec<T, N> {
    #[inline]
    fn from(vec: Vec<T>) -> Self {
        Self::from_iter_in(vec, Global)
    }
}

impl<T, const N: usize, A: Allocator> From<HybridVec<T, N, A>> for Vec<T> {
    #[inline]
    fn from(vec: HybridVec<T, N, A>) -> Self {
        vec.into_vec()
    }
}

/// An iterator that moves the elements out of a [`HybridVec`].
///
/// The storage, and the heap block if any, is released when the iterator is dropped.
pub struct IntoIter<T, const N: usize, A: Allocator = Global> {
    vec: HybridVec<T, N, A>,
    index: usize,
}

impl<T, const N: usize, A: Allocator> IntoIterator for HybridVec<T, N, A> {
    type Item = T;
    type IntoIter = IntoIter<T, N, A>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            vec: self,
            index: 0,
        }
    }
}

impl<T, const N: usize, A: Allocator> IntoIter<T, N, A> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        &self.vec.as_slice()[self.index..]
    }

    /// The elements not yet yielded, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let index = self.index;
        &mut self.vec.as_mut_slice()[index..]
    }
}

impl<T, const N: usize, A: Allocator> Iterator for IntoIter<T, N, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.index == self.vec.len {
            return None;
        }
        self.index += 1;
        // SAFETY: the element is live and is read exactly once.
        unsafe { Some(ptr::read(self.vec.as_ptr().add(self.index - 1))) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.vec.len - self.index;
        (len, Some(len))
    }
}

impl<T, const N: usize, A: Allocator> DoubleEndedIterator for IntoIter<T, N, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.index == self.vec.len {
            return None;
        }
        self.vec.len -= 1;
        // SAFETY: the element is live and no longer tracked.
        unsafe { Some(ptr::read(self.vec.as_ptr().add(self.vec.len))) }
    }
}

impl<T, const N: usize, A: Allocator> ExactSizeIterator for IntoIter<T, N, A> {}

impl<T, const N: usize, A: Allocator> FusedIterator for IntoIter<T, N, A> {}

impl<T, const N: usize, A: Allocator> Drop for IntoIter<T, N, A> {
    fn drop(&mut self) {
        let remaining = self.vec.len - self.index;
        let base = self.vec.as_mut_ptr();
        self.vec.len = 0;
        // SAFETY: `[index, len)` was never yielded; the vector no longer tracks it.
        unsafe { destroy_range(base.add(self.index), remaining) };
    }
}

impl<T, const N: usize, A: Allocator + Default> Default for IntoIter<T, N, A> {
    fn default() -> Self {
        HybridVec::default().into_iter()
    }
}

impl<T: fmt::Debug, const N: usize, A: Allocator> fmt::Debug for IntoIter<T, N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
