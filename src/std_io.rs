extern crate std;

use std::io::{self, IoSlice, Write};

use crate::{Allocator, CollectionAllocErr, HybridVec};

fn out_of_memory(err: CollectionAllocErr) -> io::Error {
    io::Error::new(io::ErrorKind::OutOfMemory, err)
}

/// Write is implemented for `HybridVec<u8, N, A>` by appending to the vector.
/// The vector will grow as needed.
///
/// Growth failures are reported as [`io::ErrorKind::OutOfMemory`] with nothing written.
impl<const N: usize, A: Allocator> Write for HybridVec<u8, N, A> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = self.len();
        self.try_insert_copy_slice(len, buf).map_err(out_of_memory)?;
        Ok(buf.len())
    }

    #[inline(always)]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[inline]
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let num = bufs.iter().map(|b| b.len()).sum::<usize>();
        self.try_reserve(num).map_err(out_of_memory)?;
        for buf in bufs {
            let len = self.len();
            self.insert_copy_slice(len, buf);
        }
        Ok(num)
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write(self, buf)?;
        Ok(())
    }
}
