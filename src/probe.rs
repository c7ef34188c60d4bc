//! Raster source probing.
//!
//! Opening a raster source means indexing its TIFF structure: the header and
//! every IFD. Tag payloads stored out of line (tile offset tables and the
//! like) are never read. Local files are parsed straight off disk; remote
//! sources go through a [`BlockReader`] so only the blocks holding headers are
//! fetched.

use crate::io::{BlockReader, ReadRange};
use crate::tiff::{Endian, Tiff, TiffError, Variant};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_FETCH_BLOCK: usize = 16 * 1024;
pub const DEFAULT_MAX_FETCHES: usize = 64;

const VSICURL_PREFIX: &str = "/vsicurl/";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("source is empty")]
    Empty,

    #[error("not a TIFF raster")]
    NotTiff,

    #[error("raster headers extend past the end of the source")]
    Truncated,

    #[error("raster headers not found within {fetches} range request(s)")]
    FetchLimit { fetches: usize },

    #[error("malformed TIFF: {0}")]
    Malformed(TiffError),

    #[error("unsupported source: {0}")]
    Unsupported(String),
}

impl From<TiffError> for ProbeError {
    fn from(e: TiffError) -> Self {
        match e {
            TiffError::BadMagicBytes => ProbeError::NotTiff,
            e if e.is_eof() => ProbeError::Truncated,
            TiffError::ReadError(e) => ProbeError::Io(e),
            other => ProbeError::Malformed(other),
        }
    }
}

/// Where a source identifier points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(String),
    Local(PathBuf),
}

impl SourceLocation {
    pub fn parse(uri: &str) -> Self {
        let uri = uri.trim();
        if let Some(url) = uri.strip_prefix(VSICURL_PREFIX) {
            return SourceLocation::Remote(url.to_string());
        }
        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return SourceLocation::Remote(uri.to_string());
        }
        match uri.strip_prefix("file://") {
            Some(path) => SourceLocation::Local(PathBuf::from(path)),
            None => SourceLocation::Local(PathBuf::from(uri)),
        }
    }
}

/// What indexing a valid raster source revealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterInfo {
    pub endian: Endian,
    pub big_tiff: bool,
    pub width: u64,
    pub height: u64,
    pub levels: usize,
    pub tiled: bool,
    pub georeferenced: bool,
}

impl RasterInfo {
    pub fn from_tiff(tiff: &Tiff) -> Result<Self, ProbeError> {
        let ifd0 = tiff.ifd0()?;
        let (width, height) = ifd0.dimensions()?;
        Ok(Self {
            endian: tiff.endian,
            big_tiff: tiff.variant == Variant::Big,
            width,
            height,
            levels: tiff.ifds.len(),
            tiled: ifd0.is_tiled(),
            georeferenced: ifd0.is_georeferenced(),
        })
    }
}

impl fmt::Display for RasterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {}, {} level(s)",
            self.width,
            self.height,
            if self.tiled { "tiled" } else { "stripped" },
            self.levels
        )?;
        if self.big_tiff {
            write!(f, ", BigTIFF")?;
        }
        if !self.georeferenced {
            write!(f, ", no georeference")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Prober {
    fetch_block: usize,
    max_fetches: usize,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_BLOCK, DEFAULT_MAX_FETCHES)
    }
}

impl Prober {
    pub fn new(fetch_block: usize, max_fetches: usize) -> Self {
        Self {
            fetch_block: fetch_block.max(16),
            max_fetches: max_fetches.max(1),
        }
    }

    /// Probe a positional source, fetching `fetch_block`-sized blocks on
    /// demand, at most `max_fetches` of them.
    pub fn probe<R: ReadRange + ?Sized>(&self, source: &R) -> Result<RasterInfo, ProbeError> {
        let mut reader = BlockReader::new(source, self.fetch_block, self.max_fetches);
        let result = self.probe_stream(&mut reader);
        trace!("probe used {} range request(s)", reader.fetches());
        match result {
            Err(_) if reader.limit_hit() => Err(ProbeError::FetchLimit {
                fetches: reader.fetches(),
            }),
            other => other,
        }
    }

    /// Probe a seekable stream with no limit on how much of it is read.
    pub fn probe_stream<R: Read + Seek>(&self, stream: &mut R) -> Result<RasterInfo, ProbeError> {
        let mut first = [0u8; 1];
        if stream.read(&mut first)? == 0 {
            return Err(ProbeError::Empty);
        }
        stream.seek(SeekFrom::Start(0))?;

        let tiff = Tiff::open(stream)?;
        debug!("indexed {} IFD(s)", tiff.ifds.len());
        trace!("{tiff}");
        RasterInfo::from_tiff(&tiff)
    }
}
