//! The GIS host capability the updater drives.
//!
//! A host opens project documents, opens raster sources and reports whether
//! they are valid, adds layers to documents, and saves them. Its lifetime is
//! bracketed by a [`HostSession`]: the session is created around an
//! initialized host and shuts it down when dropped, on every exit path.

use crate::error::Result;
use crate::probe::RasterInfo;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::info;

mod native;

pub use native::NativeHost;

/// A raster source as opened by the host, valid or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterSource {
    pub uri: String,
    pub name: String,
    status: std::result::Result<RasterInfo, String>,
}

impl RasterSource {
    pub fn valid(uri: &str, name: &str, info: RasterInfo) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            status: Ok(info),
        }
    }

    pub fn invalid(uri: &str, name: &str, reason: impl Into<String>) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            status: Err(reason.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_ok()
    }

    pub fn info(&self) -> Option<&RasterInfo> {
        self.status.as_ref().ok()
    }

    /// Why the source could not be opened.
    pub fn reason(&self) -> Option<&str> {
        self.status.as_ref().err().map(String::as_str)
    }
}

pub trait GisHost {
    type Document;

    fn open_project(&mut self, path: &Path) -> Result<Self::Document>;

    /// Open a source under a display name. Never fails: problems are reported
    /// through the returned source's validity.
    fn open_raster_source(&mut self, uri: &str, name: &str) -> RasterSource;

    fn add_layer(&mut self, document: &mut Self::Document, source: RasterSource);

    fn save_project(&mut self, document: &Self::Document, path: &Path) -> Result<()>;

    /// Release everything the host holds. Called exactly once, by [`HostSession`].
    fn shutdown(&mut self);
}

/// Scoped ownership of an initialized host.
pub struct HostSession<H: GisHost> {
    host: H,
}

impl<H: GisHost> HostSession<H> {
    pub fn new(host: H) -> Self {
        info!("Host application initialized.");
        Self { host }
    }
}

impl<H: GisHost> Deref for HostSession<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.host
    }
}

impl<H: GisHost> DerefMut for HostSession<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: GisHost> Drop for HostSession<H> {
    fn drop(&mut self) {
        info!("Exiting host application.");
        self.host.shutdown();
    }
}
