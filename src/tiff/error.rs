use super::TagId;
use std::fmt;
use std::io::{self, ErrorKind};

#[derive(Debug)]
pub enum TiffError {
    BadMagicBytes,
    ReadError(io::Error),
    MissingTag(TagId),
    BadTag(TagId),
    IfdLoop(u64),
    NoImages,
}

impl TiffError {
    /// True when parsing ran off the end of the source.
    pub fn is_eof(&self) -> bool {
        matches!(self, TiffError::ReadError(e) if e.kind() == ErrorKind::UnexpectedEof)
    }
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::BadMagicBytes => write!(f, "not a TIFF (bad magic bytes)"),
            TiffError::ReadError(e) => write!(f, "read error: {e}"),
            TiffError::MissingTag(id) => write!(f, "missing required tag {id:?}"),
            TiffError::BadTag(id) => write!(f, "unreadable tag {id:?}"),
            TiffError::IfdLoop(offset) => write!(f, "IFD chain loops back to offset {offset}"),
            TiffError::NoImages => write!(f, "TIFF contains no images"),
        }
    }
}

impl std::error::Error for TiffError {}

impl From<io::Error> for TiffError {
    fn from(e: io::Error) -> Self {
        TiffError::ReadError(e)
    }
}
