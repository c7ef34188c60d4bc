// I/O Traits
//   ReadRange is stateless positional I/O: self is immutable, which maps
//   directly onto HTTP byte-range requests as well as local files.

use std::io::{Error, ErrorKind, Read, Result, Seek};
use std::sync::Mutex;

mod block;
#[cfg(feature = "http")]
pub mod http;

pub use block::BlockReader;

pub trait ReadRange {
    /// Read bytes from a specific offset
    ///
    /// Returns the number of bytes read, which is 0 at or past the end of the source.
    fn read_range(&self, start: u64, buf: &mut [u8]) -> Result<usize>;

    /// Keep reading until `buf` is full or the source is exhausted.
    fn read_range_full(&self, start: u64, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_range(start + filled as u64, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + Seek> ReadRange for Mutex<R> {
    fn read_range(&self, start: u64, buf: &mut [u8]) -> Result<usize> {
        let mut locked_self = self
            .lock()
            .map_err(|e| Error::other(format!("{e:?}")))?;
        locked_self.seek(std::io::SeekFrom::Start(start))?;
        locked_self.read(buf)
    }
}

#[cfg(unix)]
impl ReadRange for std::fs::File {
    fn read_range(&self, start: u64, buf: &mut [u8]) -> Result<usize> {
        use std::os::unix::fs::FileExt;
        self.read_at(buf, start)
    }
}

#[cfg(windows)]
impl ReadRange for std::fs::File {
    fn read_range(&self, start: u64, buf: &mut [u8]) -> Result<usize> {
        use std::os::windows::fs::FileExt;
        self.seek_read(buf, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn full_read_stops_at_end() {
        let source = Mutex::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        let mut buf = [0u8; 8];
        assert_eq!(source.read_range_full(2, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[3, 4, 5]);
    }
}
