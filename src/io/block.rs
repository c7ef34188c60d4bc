use super::ReadRange;
use std::collections::HashMap;
use std::io::{Error, ErrorKind, Read, Result, Seek, SeekFrom};

/// `Read + Seek` view of a [`ReadRange`] source.
///
/// Bytes are fetched in aligned blocks and kept, so seeking back and forth
/// through a header costs one range request per distinct block. At most
/// `max_fetches` blocks are ever requested; past that, reads fail and
/// [`BlockReader::limit_hit`] reports it.
pub struct BlockReader<'a, R: ReadRange + ?Sized> {
    source: &'a R,
    block_size: u64,
    max_fetches: usize,
    blocks: HashMap<u64, Vec<u8>>,
    position: u64,
    limit_hit: bool,
}

impl<'a, R: ReadRange + ?Sized> BlockReader<'a, R> {
    pub fn new(source: &'a R, block_size: usize, max_fetches: usize) -> Self {
        Self {
            source,
            block_size: block_size.max(1) as u64,
            max_fetches,
            blocks: HashMap::new(),
            position: 0,
            limit_hit: false,
        }
    }

    /// Number of range requests issued so far.
    pub fn fetches(&self) -> usize {
        self.blocks.len()
    }

    pub fn limit_hit(&self) -> bool {
        self.limit_hit
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    fn block(&mut self, index: u64) -> Result<&[u8]> {
        if !self.blocks.contains_key(&index) {
            if self.blocks.len() >= self.max_fetches {
                self.limit_hit = true;
                return Err(Error::other(format!(
                    "fetch limit of {} reached",
                    self.max_fetches
                )));
            }
            let mut bytes = vec![0; self.block_size as usize];
            let n = self
                .source
                .read_range_full(index * self.block_size, &mut bytes)?;
            bytes.truncate(n);
            self.blocks.insert(index, bytes);
        }
        Ok(self.blocks.get(&index).map(Vec::as_slice).unwrap_or(&[]))
    }
}

impl<R: ReadRange + ?Sized> Read for BlockReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let index = self.position / self.block_size;
        let within = (self.position % self.block_size) as usize;
        let block = self.block(index)?;

        let available = block.get(within..).unwrap_or(&[]);
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: ReadRange + ?Sized> Seek for BlockReader<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match pos {
            SeekFrom::Start(offset) => {
                self.position = offset;
                Ok(self.position)
            }
            SeekFrom::Current(offset) => {
                self.position = self
                    .position
                    .checked_add_signed(offset)
                    .ok_or(Error::new(ErrorKind::InvalidInput, "Seek overflow"))?;
                Ok(self.position)
            }
            SeekFrom::End(_offset) => Err(Error::new(
                ErrorKind::Unsupported,
                "Seek from end not supported",
            )),
        }
    }
}
