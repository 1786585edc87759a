use alloc::format;
use core::marker::PhantomData;
use serde_core::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
};

use crate::{Allocator, HybridVec};

/// Upper bound on the capacity reserved from an untrusted length hint.
const MAX_PREALLOC: usize = 4096;

impl<T: Serialize, const N: usize, A: Allocator> Serialize for HybridVec<T, N, A> {
    /// Serialize a `HybridVec` as a sequence.
    ///
    /// The format is the same whether the elements are inline or on the heap.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

impl<'de, T, const N: usize, A> Deserialize<'de> for HybridVec<T, N, A>
where
    T: Deserialize<'de>,
    A: Allocator + Default,
{
    /// Deserialize a `HybridVec` from a sequence.
    ///
    /// Sequences longer than `N` end up on the heap. Running out of memory or exceeding
    /// [`max_size`](HybridVec::max_size) is reported as a deserialization error.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HybridVecVisitor<T, const N: usize, A> {
            _marker: PhantomData<(T, A)>,
        }

        impl<'de, T, const N: usize, A> Visitor<'de> for HybridVecVisitor<T, N, A>
        where
            T: Deserialize<'de>,
            A: Allocator + Default,
        {
            type Value = HybridVec<T, N, A>;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a sequence")
            }

            fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
            where
                S: SeqAccess<'de>,
            {
                let mut vec = HybridVec::new_in(A::default());
                if let Some(hint) = seq.size_hint() {
                    vec.try_reserve(hint.min(MAX_PREALLOC))
                        .map_err(|e| <S::Error as de::Error>::custom(format!("HybridVec: {e}")))?;
                }

                while let Some(element) = seq.next_element()? {
                    vec.try_push(element)
                        .map_err(|e| <S::Error as de::Error>::custom(format!("HybridVec: {e}")))?;
                }

                Ok(vec)
            }
        }

        deserializer.deserialize_seq(HybridVecVisitor {
            _marker: PhantomData,
        })
    }
}
