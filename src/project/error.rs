use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("project file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed project XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unreadable project archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("project archive contains no .qgs document")]
    NoDocumentInArchive,

    #[error("expected <qgis> root element, found <{0}>")]
    WrongRoot(String),

    #[error("project XML is empty")]
    EmptyDocument,

    #[error("project XML ends with {0} unclosed element(s)")]
    Unclosed(usize),

    #[error("project document is not valid UTF-8")]
    Encoding,
}
