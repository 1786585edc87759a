//! Element lifecycle primitives over raw element ranges.
//!
//! Moving an element in Rust is a bitwise copy that cannot fail, so every relocation here is a
//! `ptr::copy` (overlap-safe in both directions) or `ptr::copy_nonoverlapping`. The fallible
//! steps are cloning and running user code; those go through a [`Writer`], which destroys the
//! elements it has constructed so far if it is dropped while unwinding.

use core::{mem, ptr};

/// Drops `len` live elements starting at `ptr`.
///
/// # Safety
/// `[ptr, ptr + len)` holds live elements that are not used afterwards.
#[inline]
pub(crate) unsafe fn destroy_range<T>(ptr: *mut T, len: usize) {
    if mem::needs_drop::<T>() {
        // SAFETY: see function doc.
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, len)) }
    }
}

/// Constructs elements one by one into uninitialized slots.
///
/// Until [`finish`](Writer::finish) is called, the writer owns what it has written: dropping it
/// destroys that prefix again. This is what keeps a panicking `clone` or user closure from
/// leaking or double-dropping anything.
pub(crate) struct Writer<T> {
    dst: *mut T,
    len: usize,
    limit: usize,
}

impl<T> Writer<T> {
    /// # Safety
    /// `[dst, dst + limit)` is valid for writes and holds no live element.
    #[inline]
    pub(crate) unsafe fn new(dst: *mut T, limit: usize) -> Self {
        Self { dst, len: 0, limit }
    }

    #[inline(always)]
    pub(crate) fn remaining(&self) -> usize {
        self.limit - self.len
    }

    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        assert!(self.len < self.limit, "writer is full");
        // SAFETY: the slot is inside the range handed to `new` and not yet written.
        unsafe { self.dst.add(self.len).write(value) };
        self.len += 1;
    }

    pub(crate) fn extend_cloned(&mut self, src: &[T])
    where
        T: Clone,
    {
        for item in src.iter().take(self.remaining()) {
            self.push(item.clone());
        }
    }

    pub(crate) fn extend_copied(&mut self, src: &[T])
    where
        T: Copy,
    {
        let count = src.len().min(self.remaining());
        // SAFETY: `count` slots remain; `src` cannot alias uninitialized slots.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), self.dst.add(self.len), count) };
        self.len += count;
    }

    pub(crate) fn extend_with(&mut self, n: usize, mut f: impl FnMut() -> T) {
        for _ in 0..n.min(self.remaining()) {
            self.push(f());
        }
    }

    /// Writes `n` copies of `value`: `n - 1` clones, then the value itself.
    pub(crate) fn fill(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        let n = n.min(self.remaining());
        if n == 0 {
            return;
        }
        for _ in 1..n {
            self.push(value.clone());
        }
        self.push(value);
    }

    /// Writes items until the iterator runs dry or the writer is full.
    pub(crate) fn extend_iter(&mut self, iter: impl IntoIterator<Item = T>) {
        let remaining = self.remaining();
        for item in iter.into_iter().take(remaining) {
            self.push(item);
        }
    }

    /// Hands the written elements over to the caller and returns their count.
    #[inline]
    pub(crate) fn finish(self) -> usize {
        let len = self.len;
        mem::forget(self);
        len
    }
}

impl<T> Drop for Writer<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `len` elements were written and never handed out.
        unsafe { destroy_range(self.dst, self.len) }
    }
}

/// A gap of uninitialized slots opened in the middle of a live range.
///
/// [`open`](InsertGap::open) shifts the tail up to make room. [`close`](InsertGap::close) shifts
/// it back down against however many slots were actually filled and publishes the new length.
/// Dropping the guard without closing it (a panic while filling) closes it with nothing filled,
/// which restores the original contents.
pub(crate) struct InsertGap<'a, T> {
    base: *mut T,
    len: &'a mut usize,
    index: usize,
    gap: usize,
    tail: usize,
}

impl<'a, T> InsertGap<'a, T> {
    /// # Safety
    /// - `base` points to `*len` live elements followed by at least `gap` free slots.
    /// - `index <= *len`.
    pub(crate) unsafe fn open(base: *mut T, len: &'a mut usize, index: usize, gap: usize) -> Self {
        let tail = *len - index;
        // SAFETY: see function doc; `ptr::copy` handles the overlap.
        unsafe { ptr::copy(base.add(index), base.add(index + gap), tail) };
        *len = index;
        Self {
            base,
            len,
            index,
            gap,
            tail,
        }
    }

    /// First slot of the gap.
    #[inline(always)]
    pub(crate) fn slot(&self) -> *mut T {
        // SAFETY: `index` is inside the allocation.
        unsafe { self.base.add(self.index) }
    }

    #[inline(always)]
    pub(crate) fn gap(&self) -> usize {
        self.gap
    }

    /// Closes the gap behind the first `filled` slots, which must now be live.
    #[inline]
    pub(crate) fn close(mut self, filled: usize) {
        self.shift_back(filled);
        mem::forget(self);
    }

    #[inline]
    fn shift_back(&mut self, filled: usize) {
        debug_assert!(filled <= self.gap);
        let start = self.index + filled;
        if filled != self.gap {
            // SAFETY: both ranges lie inside the allocation.
            unsafe { ptr::copy(self.base.add(self.index + self.gap), self.base.add(start), self.tail) };
        }
        *self.len = start + self.tail;
    }
}

impl<T> Drop for InsertGap<'_, T> {
    fn drop(&mut self) {
        self.shift_back(0);
    }
}

/// Moves the tail `[end, old_len)` down to `start` and fixes the length once the elements in
/// `[start, end)` are gone, even if dropping one of them panicked.
pub(crate) struct CloseGap<'a, T> {
    base: *mut T,
    len: &'a mut usize,
    start: usize,
    end: usize,
}

impl<'a, T> CloseGap<'a, T> {
    /// # Safety
    /// `base` points to `*len` live elements and `start <= end <= *len`.
    #[inline]
    pub(crate) unsafe fn new(base: *mut T, len: &'a mut usize, start: usize, end: usize) -> Self {
        Self {
            base,
            len,
            start,
            end,
        }
    }
}

impl<T> Drop for CloseGap<'_, T> {
    fn drop(&mut self) {
        let tail = *self.len - self.end;
        // SAFETY: the range was checked in `new`.
        unsafe { ptr::copy(self.base.add(self.end), self.base.add(self.start), tail) };
        *self.len = self.start + tail;
    }
}
