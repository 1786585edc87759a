/// The numeric type bounding element counts.
///
/// Lengths and capacities are stored as `usize`, but no container may describe more elements
/// than this type can count.
pub(crate) type SizeType = u32;

pub(crate) trait IsZST {
    const IS_ZST: bool;
}

impl<T> IsZST for T {
    const IS_ZST: bool = core::mem::size_of::<T>() == 0;
}

/// Largest element count a container of `T` will ever request.
#[inline(always)]
pub(crate) const fn max_size<T>() -> usize {
    let max = SizeType::MAX as usize;
    if T::IS_ZST {
        max
    } else {
        max / core::mem::size_of::<T>()
    }
}

#[cold]
#[inline(always)]
pub(crate) fn cold_path() {}

#[inline(always)]
pub(crate) fn split_range_bound(
    src: &impl core::ops::RangeBounds<usize>,
    len: usize,
) -> (usize, usize) {
    let start = match src.start_bound() {
        core::ops::Bound::Included(&i) => i,
        core::ops::Bound::Excluded(&i) => i + 1,
        core::ops::Bound::Unbounded => 0,
    };

    let end = match src.end_bound() {
        core::ops::Bound::Included(&i) => i + 1,
        core::ops::Bound::Excluded(&i) => i,
        core::ops::Bound::Unbounded => len,
    };

    assert!(start <= end, "range start {start} is greater than end {end}");
    assert!(end <= len, "range end {end} is out of bounds for length {len}");
    (start, end)
}

/// Forwards the slice-like trait surface of a container to its `as_slice`/`as_mut_slice`.
macro_rules! impl_slice_traits {
    ($name:ident) => {
        impl<T, const N: usize, A: $crate::Allocator> core::ops::Deref for $name<T, N, A> {
            type Target = [T];
            #[inline]
            fn deref(&self) -> &Self::Target {
                self.as_slice()
            }
        }

        impl<T, const N: usize, A: $crate::Allocator> core::ops::DerefMut for $name<T, N, A> {
            #[inline]
            fn deref_mut(&mut self) -> &mut Self::Target {
                self.as_mut_slice()
            }
        }

        impl<T: core::fmt::Debug, const N: usize, A: $crate::Allocator> core::fmt::Debug
            for $name<T, N, A>
        {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Debug::fmt(self.as_slice(), f)
            }
        }

        impl<T, const N: usize, A: $crate::Allocator> core::convert::AsRef<[T]> for $name<T, N, A> {
            #[inline]
            fn as_ref(&self) -> &[T] {
                self.as_slice()
            }
        }

        impl<T, const N: usize, A: $crate::Allocator> core::convert::AsMut<[T]> for $name<T, N, A> {
            #[inline]
            fn as_mut(&mut self) -> &mut [T] {
                self.as_mut_slice()
            }
        }

        impl<T, const N: usize, A: $crate::Allocator> core::borrow::Borrow<[T]> for $name<T, N, A> {
            #[inline]
            fn borrow(&self) -> &[T] {
                self.as_slice()
            }
        }

        impl<T, const N: usize, A: $crate::Allocator> core::borrow::BorrowMut<[T]>
            for $name<T, N, A>
        {
            #[inline]
            fn borrow_mut(&mut self) -> &mut [T] {
                self.as_mut_slice()
            }
        }

        impl<T: core::hash::Hash, const N: usize, A: $crate::Allocator> core::hash::Hash
            for $name<T, N, A>
        {
            #[inline]
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                core::hash::Hash::hash(self.as_slice(), state);
            }
        }

        impl<T, I: core::slice::SliceIndex<[T]>, const N: usize, A: $crate::Allocator>
            core::ops::Index<I> for $name<T, N, A>
        {
            type Output = <I as core::slice::SliceIndex<[T]>>::Output;
            #[inline]
            fn index(&self, index: I) -> &Self::Output {
                core::ops::Index::index(self.as_slice(), index)
            }
        }

        impl<T, I: core::slice::SliceIndex<[T]>, const N: usize, A: $crate::Allocator>
            core::ops::IndexMut<I> for $name<T, N, A>
        {
            #[inline]
            fn index_mut(&mut self, index: I) -> &mut Self::Output {
                core::ops::IndexMut::index_mut(self.as_mut_slice(), index)
            }
        }

        impl<'a, T, const N: usize, A: $crate::Allocator> IntoIterator for &'a $name<T, N, A> {
            type Item = &'a T;
            type IntoIter = core::slice::Iter<'a, T>;
            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.as_slice().iter()
            }
        }

        impl<'a, T, const N: usize, A: $crate::Allocator> IntoIterator for &'a mut $name<T, N, A> {
            type Item = &'a mut T;
            type IntoIter = core::slice::IterMut<'a, T>;
            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.as_mut_slice().iter_mut()
            }
        }

        impl<T: core::cmp::Ord, const N: usize, A: $crate::Allocator> core::cmp::Ord
            for $name<T, N, A>
        {
            #[inline]
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                core::cmp::Ord::cmp(self.as_slice(), other.as_slice())
            }
        }

        impl<T: core::cmp::PartialOrd, const N: usize, A: $crate::Allocator> core::cmp::PartialOrd
            for $name<T, N, A>
        {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
                core::cmp::PartialOrd::partial_cmp(self.as_slice(), other.as_slice())
            }
        }

        impl<T: Eq, const N: usize, A: $crate::Allocator> Eq for $name<T, N, A> {}

        impl<T, U, const N: usize, A: $crate::Allocator> core::cmp::PartialEq<&[U]>
            for $name<T, N, A>
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &&[U]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), *other)
            }
        }

        impl<T, U, const N: usize, A: $crate::Allocator> core::cmp::PartialEq<[U]> for $name<T, N, A>
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &[U]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other)
            }
        }

        impl<T, U, const N: usize, const P: usize, A: $crate::Allocator>
            core::cmp::PartialEq<&[U; P]> for $name<T, N, A>
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &&[U; P]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other.as_slice())
            }
        }

        impl<T, U, const N: usize, const P: usize, A: $crate::Allocator>
            core::cmp::PartialEq<[U; P]> for $name<T, N, A>
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &[U; P]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other.as_slice())
            }
        }

        impl<T, U, const N: usize, A: $crate::Allocator> core::cmp::PartialEq<alloc::vec::Vec<U>>
            for $name<T, N, A>
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &alloc::vec::Vec<U>) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other.as_slice())
            }
        }
    };
}

pub(crate) use impl_slice_traits;
