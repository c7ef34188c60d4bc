//! Attach Cloud Optimized GeoTIFF raster layers to QGIS project files.
//!
//! [`updater::run`] drives a [`host::GisHost`] through load, add and save.
//! [`host::NativeHost`] is the built-in host: it edits `.qgs`/`.qgz` files
//! directly and decides raster validity by indexing the TIFF headers of each
//! source, over HTTP range requests for remote ones.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod io;
pub mod logging;
pub mod probe;
pub mod project;
pub mod tiff;
pub mod updater;

pub use config::{HostConfig, LayerNaming, UpdateConfig, UpdateRequest};
pub use error::{Result, UpdateError};
pub use host::{GisHost, HostSession, NativeHost, RasterSource};
pub use updater::{run, LayerOutcome, RunReport};
