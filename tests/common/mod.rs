#![allow(dead_code)]

use cogproject::error::{Result, UpdateError};
use cogproject::logging;
use cogproject::probe::RasterInfo;
use cogproject::tiff::Endian;
use cogproject::{GisHost, RasterSource};
use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub const PROJECT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<qgis projectname="lamprey" version="3.34.0-Prizren">
  <layer-tree-group>
    <customproperties/>
  </layer-tree-group>
  <projectlayers>
  </projectlayers>
</qgis>
"#;

/// Log lines captured from a closure.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = logging::subscriber(move || writer.clone(), EnvFilter::new("info"));
    let value = tracing::subscriber::with_default(subscriber, f);

    let bytes = capture.0.lock().unwrap().clone();
    let lines = String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| line.splitn(2, "] ").nth(1).unwrap_or(line).to_string())
        .collect();
    (value, lines)
}

pub fn count_prefixed(lines: &[String], prefix: &str) -> usize {
    lines.iter().filter(|l| l.starts_with(prefix)).count()
}

/// A minimal tiled little-endian TIFF.
pub fn tiny_tiff(width: u16, height: u16) -> Vec<u8> {
    fn entry(code: u16, value: u16) -> Vec<u8> {
        let mut e = Vec::new();
        e.extend_from_slice(&code.to_le_bytes());
        e.extend_from_slice(&3u16.to_le_bytes());
        e.extend_from_slice(&1u32.to_le_bytes());
        e.extend_from_slice(&value.to_le_bytes());
        e.extend_from_slice(&[0, 0]);
        e
    }

    let mut bytes = b"II*\0".to_vec();
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend(entry(0x0100, width));
    bytes.extend(entry(0x0101, height));
    bytes.extend(entry(0x0142, 256));
    bytes.extend(entry(0x0144, 0));
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

pub fn info() -> RasterInfo {
    RasterInfo {
        endian: Endian::Little,
        big_tiff: false,
        width: 512,
        height: 512,
        levels: 3,
        tiled: true,
        georeferenced: true,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    OpenProject(PathBuf),
    OpenSource(String),
    AddLayer(String),
    SaveProject(PathBuf),
    Shutdown,
}

/// Host double that records every call and answers from fixed tables.
pub struct RecordingHost {
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub valid: HashSet<String>,
    pub fail_load: bool,
    pub fail_save: bool,
}

impl RecordingHost {
    pub fn new(valid: &[&str]) -> Self {
        Self {
            calls: Rc::default(),
            valid: valid.iter().map(|s| s.to_string()).collect(),
            fail_load: false,
            fail_save: false,
        }
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<Call>>> {
        self.calls.clone()
    }
}

impl GisHost for RecordingHost {
    /// Names of the layers added so far.
    type Document = Vec<String>;

    fn open_project(&mut self, path: &Path) -> Result<Vec<String>> {
        self.calls
            .borrow_mut()
            .push(Call::OpenProject(path.to_path_buf()));
        if self.fail_load {
            return Err(UpdateError::Load {
                path: path.to_path_buf(),
                reason: "project file not found".to_string(),
            });
        }
        Ok(vec![])
    }

    fn open_raster_source(&mut self, uri: &str, name: &str) -> RasterSource {
        self.calls.borrow_mut().push(Call::OpenSource(uri.to_string()));
        if self.valid.contains(uri) {
            RasterSource::valid(uri, name, info())
        } else {
            RasterSource::invalid(uri, name, "source not found")
        }
    }

    fn add_layer(&mut self, document: &mut Vec<String>, source: RasterSource) {
        self.calls
            .borrow_mut()
            .push(Call::AddLayer(source.name.clone()));
        document.push(source.name);
    }

    fn save_project(&mut self, _document: &Vec<String>, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::SaveProject(path.to_path_buf()));
        if self.fail_save {
            return Err(UpdateError::Save {
                path: path.to_path_buf(),
                reason: "permission denied".to_string(),
            });
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.calls.borrow_mut().push(Call::Shutdown);
    }
}
