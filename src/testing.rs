//! Instrumented allocators and element types shared by the unit tests.
//!
//! All bookkeeping is thread-local, so every test starts with [`reset`] and sees only its own
//! allocations.

extern crate std;

use core::{alloc::Layout, cell::Cell, cell::RefCell, ptr::NonNull};
use std::collections::BTreeMap;

use crate::{Allocator, Global, allocator::AllocError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stats {
    pub allocations: usize,
    pub deallocations: usize,
    pub bytes_allocated: usize,
    pub bytes_deallocated: usize,
    pub outstanding: usize,
}

std::thread_local! {
    static STATS: Cell<Stats> = Cell::new(Stats::default());
    /// Live blocks: address -> (actual size, alignment).
    static BLOCKS: RefCell<BTreeMap<usize, (usize, usize)>> = RefCell::new(BTreeMap::new());
    static ALLOC_BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
    static NEXT_ID: Cell<usize> = const { Cell::new(1) };
    static DROPS: Cell<usize> = const { Cell::new(0) };
    static CLONE_BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Clears every counter and disarms every failure injection on this thread.
pub(crate) fn reset() {
    STATS.with(|s| s.set(Stats::default()));
    BLOCKS.with(|b| b.borrow_mut().clear());
    ALLOC_BUDGET.with(|b| b.set(None));
    DROPS.with(|d| d.set(0));
    CLONE_BUDGET.with(|b| b.set(None));
}

pub(crate) fn stats() -> Stats {
    let mut stats = STATS.with(Cell::get);
    stats.outstanding = BLOCKS.with(|b| b.borrow().len());
    stats
}

/// Lets the next `n` allocations through and fails every one after that.
pub(crate) fn fail_allocations_after(n: usize) {
    ALLOC_BUDGET.with(|b| b.set(Some(n)));
}

/// An allocator that records every request on the current thread.
///
/// - Allocators compare equal when their ids match. [`CountingAlloc::new`] hands out the shared
///   id `0`; [`CountingAlloc::unique`] a fresh one.
/// - `P` turns on all three propagation flags.
/// - `factor` multiplies every request, modelling allocators that return more than asked.
#[derive(Debug, Clone)]
pub(crate) struct CountingAlloc<const P: bool = false> {
    id: usize,
    factor: usize,
}

fn next_id() -> usize {
    NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

impl CountingAlloc {
    pub(crate) fn new() -> Self {
        Self { id: 0, factor: 1 }
    }

    pub(crate) fn unique() -> Self {
        Self {
            id: next_id(),
            factor: 1,
        }
    }

    pub(crate) fn generous(factor: usize) -> Self {
        Self { id: 0, factor }
    }
}

impl CountingAlloc<true> {
    /// A fresh identity that travels with its blocks on clone-assign, move-assign and swap.
    pub(crate) fn propagating() -> Self {
        Self {
            id: next_id(),
            factor: 1,
        }
    }
}

impl<const P: bool> CountingAlloc<P> {
    pub(crate) fn id(&self) -> usize {
        self.id
    }
}

unsafe impl<const P: bool> Allocator for CountingAlloc<P> {
    const PROPAGATE_ON_CLONE_FROM: bool = P;
    const PROPAGATE_ON_MOVE: bool = P;
    const PROPAGATE_ON_SWAP: bool = P;

    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let allowed = ALLOC_BUDGET.with(|b| match b.get() {
            Some(0) => false,
            Some(n) => {
                b.set(Some(n - 1));
                true
            }
            None => true,
        });
        if !allowed {
            return Err(AllocError);
        }

        let actual = Layout::from_size_align(layout.size() * self.factor, layout.align())
            .map_err(|_| AllocError)?;
        let block = Global.allocate(actual)?;

        STATS.with(|s| {
            let mut stats = s.get();
            stats.allocations += 1;
            stats.bytes_allocated += layout.size();
            s.set(stats);
        });
        BLOCKS.with(|b| {
            b.borrow_mut()
                .insert(block.cast::<u8>().as_ptr() as usize, (actual.size(), actual.align()))
        });
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let (size, align) = BLOCKS
            .with(|b| b.borrow_mut().remove(&(ptr.as_ptr() as usize)))
            .expect("deallocating a block that is not live");
        assert!(layout.size() <= size, "deallocation layout larger than the block");
        assert_eq!(layout.align(), align);

        STATS.with(|s| {
            let mut stats = s.get();
            stats.deallocations += 1;
            stats.bytes_deallocated += layout.size();
            s.set(stats);
        });
        unsafe { Global.deallocate(ptr, Layout::from_size_align_unchecked(size, align)) }
    }

    fn equals(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// An element that counts its drops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Droppy(pub i32);

impl Drop for Droppy {
    fn drop(&mut self) {
        DROPS.with(|d| d.set(d.get() + 1));
    }
}

pub(crate) fn drops() -> usize {
    DROPS.with(Cell::get)
}

/// An element whose `clone` panics once the armed budget runs out.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Bomb(pub i32);

impl Clone for Bomb {
    fn clone(&self) -> Self {
        CLONE_BUDGET.with(|b| match b.get() {
            Some(0) => panic!("clone of Bomb({}) exploded", self.0),
            Some(n) => b.set(Some(n - 1)),
            None => {}
        });
        Bomb(self.0)
    }
}

impl Drop for Bomb {
    fn drop(&mut self) {
        DROPS.with(|d| d.set(d.get() + 1));
    }
}

/// Lets the next `n` clones of [`Bomb`] succeed and makes the one after that panic.
pub(crate) fn arm_clones(n: usize) {
    CLONE_BUDGET.with(|b| b.set(Some(n)));
}

pub(crate) fn disarm_clones() {
    CLONE_BUDGET.with(|b| b.set(None));
}
