//! ## Intro
//!
//! A vector that stores a small number of elements inline, inside the container value itself,
//! and moves them to a heap block obtained from a pluggable [`Allocator`] once it outgrows that
//! buffer.
//!
//! Many workloads keep collections that nearly always fit in a handful of slots but occasionally
//! need to grow. [`HybridVec`] serves the common case without touching the allocator at all, and
//! behaves like an ordinary growable vector past that point.
//!
//! ```
//! # use hybridvec::{HybridVec, hybridvec};
//! let mut vec: HybridVec<i32, 4> = hybridvec![1, 2, 3];
//! assert!(vec.is_inline()); // No allocation yet
//!
//! vec.extend([4, 5, 6, 7, 8]);
//! assert!(!vec.is_inline()); // Now on the heap
//! assert_eq!(vec, [1, 2, 3, 4, 5, 6, 7, 8]);
//!
//! vec.truncate(2);
//! vec.shrink_to_fit();
//! assert!(vec.is_inline()); // Back inline
//! ```
//!
//! ## Growth
//!
//! - Appending one element to a full vector grows the capacity to `cap + cap / 2 + 1`.
//! - [`reserve`](HybridVec::reserve), [`resize`](HybridVec::resize) and the range insertions
//!   request exactly the size they need. So do [`hybridvec!`], `From` conversions and
//!   collecting an iterator of known length.
//! - Whatever the allocator actually returns becomes the capacity, so an allocator that rounds
//!   requests up is never wasted.
//! - No vector ever describes more than [`max_size`](HybridVec::max_size) elements, which is
//!   bounded by a 32-bit element counter.
//!
//! Each growing operation has a `try_` variant that reports [`CollectionAllocErr`] instead of
//! panicking, and leaves the vector exactly as it was:
//!
//! ```
//! # use hybridvec::{HybridVec, CollectionAllocErr};
//! let mut vec = HybridVec::<u64, 8>::new();
//! assert!(matches!(
//!     vec.try_reserve(usize::MAX),
//!     Err(CollectionAllocErr::CapacityOverflow { .. })
//! ));
//! assert!(vec.is_inline());
//! ```
//!
//! ## Allocators
//!
//! The third type parameter selects where heap blocks come from and defaults to [`Global`].
//! An allocator decides, through [`Allocator::equals`] and its propagation flags, whether two
//! vectors may hand heap blocks to each other in [`take_from`](HybridVec::take_from),
//! [`swap`](HybridVec::swap) and [`clone_from`](Clone::clone_from), or must relocate elements
//! instead.
//!
//! ## `no_std` support
//!
//! This crate requires only `core` and `alloc`. The default `std` feature adds an
//! [`std::io::Write`] implementation for byte vectors.
//!
//! ## Optional features
//!
//! ### `serde`
//!
//! [`HybridVec`] implements `Serialize` and `Deserialize` as a plain sequence.
#![no_std]

extern crate alloc;

mod errors;
mod raw;
mod utils;

pub mod allocator;
pub mod hybrid_vec;

#[cfg(feature = "serde")]
mod serde;

#[cfg(feature = "std")]
mod std_io;

#[cfg(test)]
mod testing;

#[doc(inline)]
pub use allocator::{AllocError, Allocator, Global};
#[doc(inline)]
pub use errors::{CollectionAllocErr, OutOfRange};
#[doc(inline)]
pub use hybrid_vec::{HybridVec, IntoIter};

/// Creates a [`HybridVec`] backed by the global heap.
///
/// - `hybridvec![]` creates an empty vector.
/// - `hybridvec![elem; n]` creates `n` clones of `elem`.
/// - `hybridvec![a, b, c]` creates a vector holding the listed elements.
///
/// ```
/// # use hybridvec::{HybridVec, hybridvec};
/// let a: HybridVec<u8, 4> = hybridvec![];
/// let b: HybridVec<u8, 4> = hybridvec![7; 3];
/// let c: HybridVec<u8, 4> = hybridvec![7, 7, 7];
/// assert!(a.is_empty());
/// assert_eq!(b, c);
/// ```
#[macro_export]
macro_rules! hybridvec {
    () => {
        $crate::HybridVec::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::HybridVec::from_elem($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::HybridVec::from([$($x),+])
    };
}
