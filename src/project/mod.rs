//! QGIS project documents.
//!
//! A document is held as the owned XML event stream it was read from. Layers
//! added in memory are spliced into that stream when it is written, so
//! everything the application stored is passed through untouched.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::io::{Cursor, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

mod error;
mod layer;

pub use error::{ProjectError, ProjectResult};
pub use layer::{layer_id, MapLayer, DEFAULT_PROVIDER};

const ROOT: &[u8] = b"qgis";
const LAYER_LIST: &[u8] = b"projectlayers";
const LAYER_TREE: &[u8] = b"layer-tree-group";
const MAP_LAYER: &[u8] = b"maplayer";

#[derive(Clone, Debug)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
    method: CompressionMethod,
    is_dir: bool,
}

#[derive(Clone, Debug)]
enum Container {
    /// A bare `.qgs` file.
    Plain,
    /// A `.qgz` zip; `document` indexes the `.qgs` member in `entries`.
    Archive {
        entries: Vec<ArchiveEntry>,
        document: usize,
    },
}

#[derive(Clone, Debug)]
pub struct ProjectDocument {
    path: PathBuf,
    events: Vec<Event<'static>>,
    container: Container,
    pending: Vec<MapLayer>,
}

impl ProjectDocument {
    pub fn read<P: AsRef<Path>>(path: P) -> ProjectResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ProjectError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;

        let (events, container) = if is_archive(path, &bytes) {
            let (entries, document) = read_archive(bytes)?;
            let events = parse_xml(&entries[document].data)?;
            (events, Container::Archive { entries, document })
        } else {
            (parse_xml(&bytes)?, Container::Plain)
        };
        debug!("parsed {} XML events from {}", events.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            events,
            container,
            pending: vec![],
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_archive(&self) -> bool {
        matches!(self.container, Container::Archive { .. })
    }

    pub fn add_layer(&mut self, layer: MapLayer) {
        self.pending.push(layer);
    }

    /// Every raster or vector layer the document references, stored ones first.
    pub fn layers(&self) -> Vec<MapLayer> {
        let mut layers = self.stored_layers();
        layers.extend(self.pending.iter().cloned());
        layers
    }

    fn stored_layers(&self) -> Vec<MapLayer> {
        let mut layers = vec![];
        let mut stack: Vec<Vec<u8>> = vec![];
        let mut current: Option<MapLayer> = None;

        for event in &self.events {
            match event {
                Event::Start(e) => {
                    let name = e.name().as_ref().to_vec();
                    if name == MAP_LAYER && stack.len() == 2 && stack[1] == LAYER_LIST {
                        current = Some(MapLayer {
                            id: String::new(),
                            name: String::new(),
                            source: String::new(),
                            provider: String::new(),
                        });
                    }
                    stack.push(name);
                }
                Event::End(_) => {
                    let closed = stack.pop();
                    if stack.len() == 2 && closed.as_deref() == Some(MAP_LAYER) {
                        if let Some(layer) = current.take() {
                            layers.push(layer);
                        }
                    }
                }
                Event::Text(t) if stack.len() == 4 => {
                    let Some(layer) = current.as_mut() else {
                        continue;
                    };
                    let value = match t.unescape() {
                        Ok(v) => v.trim().to_string(),
                        Err(_) => continue,
                    };
                    match stack.last().map(Vec::as_slice) {
                        Some(b"id") => layer.id = value,
                        Some(b"datasource") => layer.source = value,
                        Some(b"layername") => layer.name = value,
                        Some(b"provider") => layer.provider = value,
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        layers
    }

    /// Persist the document, pending layers included, to `path`.
    ///
    /// The bytes go to a sibling temporary file first, which then replaces the
    /// file `path` resolves to. A symlinked project stays a symlink and the
    /// replaced file's permissions carry over.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> ProjectResult<()> {
        let path = path.as_ref();
        let xml = self.to_xml()?;
        let bytes = match &self.container {
            Container::Plain => xml,
            Container::Archive { entries, document } => write_archive(entries, *document, &xml)?,
        };

        let target = match fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
            Err(e) => return Err(e.into()),
        };
        let permissions = fs::metadata(&target).ok().map(|m| m.permissions());

        let mut tmp_name = target
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = target.with_file_name(tmp_name);

        let replaced = fs::write(&tmp_path, &bytes)
            .and_then(|()| match permissions {
                Some(permissions) => fs::set_permissions(&tmp_path, permissions),
                None => Ok(()),
            })
            .and_then(|()| fs::rename(&tmp_path, &target));
        if let Err(e) = replaced {
            if tmp_path.is_file() {
                let _ = fs::remove_file(&tmp_path);
            }
            return Err(e.into());
        }
        debug!("wrote {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }

    pub fn to_xml(&self) -> ProjectResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        let mut stack: Vec<Vec<u8>> = vec![];
        let splice = !self.pending.is_empty();
        let mut wrote_list = false;
        let mut wrote_tree = false;

        for event in &self.events {
            match event {
                Event::Start(e) => {
                    stack.push(e.name().as_ref().to_vec());
                    writer.write_event(event)?;
                }
                Event::End(_) => {
                    let closed = stack.pop().unwrap_or_default();
                    if splice {
                        match (stack.len(), closed.as_slice()) {
                            (1, LAYER_LIST) if !wrote_list => {
                                self.write_map_layers(&mut writer)?;
                                wrote_list = true;
                            }
                            (1, LAYER_TREE) if !wrote_tree => {
                                self.write_tree_layers(&mut writer)?;
                                wrote_tree = true;
                            }
                            (0, ROOT) => {
                                if !wrote_list {
                                    self.write_layer_list(&mut writer)?;
                                    wrote_list = true;
                                }
                                if !wrote_tree {
                                    self.write_layer_tree(&mut writer)?;
                                    wrote_tree = true;
                                }
                            }
                            _ => {}
                        }
                    }
                    writer.write_event(event)?;
                }
                Event::Empty(e) if splice => match (stack.len(), e.name().as_ref()) {
                    (1, LAYER_LIST) if !wrote_list => {
                        writer.write_event(Event::Start(e.clone()))?;
                        self.write_map_layers(&mut writer)?;
                        writer.write_event(Event::End(e.to_end()))?;
                        wrote_list = true;
                    }
                    (1, LAYER_TREE) if !wrote_tree => {
                        writer.write_event(Event::Start(e.clone()))?;
                        self.write_tree_layers(&mut writer)?;
                        writer.write_event(Event::End(e.to_end()))?;
                        wrote_tree = true;
                    }
                    (0, ROOT) => {
                        writer.write_event(Event::Start(e.clone()))?;
                        self.write_layer_list(&mut writer)?;
                        self.write_layer_tree(&mut writer)?;
                        writer.write_event(Event::End(e.to_end()))?;
                        wrote_list = true;
                        wrote_tree = true;
                    }
                    _ => writer.write_event(event)?,
                },
                Event::Eof => {}
                _ => writer.write_event(event)?,
            }
        }
        Ok(writer.into_inner())
    }

    fn write_map_layers<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        for layer in &self.pending {
            layer.write_map_layer(writer)?;
        }
        Ok(())
    }

    fn write_tree_layers<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        for layer in &self.pending {
            layer.write_tree_layer(writer)?;
        }
        Ok(())
    }

    fn write_layer_list<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("projectlayers")))?;
        self.write_map_layers(writer)?;
        writer.write_event(Event::End(BytesEnd::new("projectlayers")))?;
        Ok(())
    }

    fn write_layer_tree<W: Write>(&self, writer: &mut Writer<W>) -> quick_xml::Result<()> {
        writer.write_event(Event::Start(BytesStart::new("layer-tree-group")))?;
        writer.write_event(Event::Empty(BytesStart::new("customproperties")))?;
        self.write_tree_layers(writer)?;
        writer.write_event(Event::End(BytesEnd::new("layer-tree-group")))?;
        Ok(())
    }
}

fn is_archive(path: &Path, bytes: &[u8]) -> bool {
    let qgz = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("qgz"));
    qgz || bytes.starts_with(b"PK\x03\x04")
}

fn parse_xml(bytes: &[u8]) -> ProjectResult<Vec<Event<'static>>> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProjectError::Encoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);

    let mut events = vec![];
    let mut depth = 0usize;
    let mut root_seen = false;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) | Event::Empty(e) if depth == 0 && !root_seen => {
                let name = e.name();
                if name.as_ref() != ROOT {
                    return Err(ProjectError::WrongRoot(
                        String::from_utf8_lossy(name.as_ref()).into_owned(),
                    ));
                }
                root_seen = true;
            }
            _ => {}
        }
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        events.push(event.into_owned());
    }

    if depth > 0 {
        return Err(ProjectError::Unclosed(depth));
    }
    if !root_seen {
        return Err(ProjectError::EmptyDocument);
    }
    Ok(events)
}

fn read_archive(bytes: Vec<u8>) -> ProjectResult<(Vec<ArchiveEntry>, usize)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    let mut document = None;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let name = file.name().to_string();
        if document.is_none() && !file.is_dir() && name.to_ascii_lowercase().ends_with(".qgs") {
            document = Some(entries.len());
        }
        entries.push(ArchiveEntry {
            name,
            data,
            method: file.compression(),
            is_dir: file.is_dir(),
        });
    }

    let document = document.ok_or(ProjectError::NoDocumentInArchive)?;
    Ok((entries, document))
}

fn write_archive(entries: &[ArchiveEntry], document: usize, xml: &[u8]) -> ProjectResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (i, entry) in entries.iter().enumerate() {
        let method = match entry.method {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let options = FileOptions::default().compression_method(method);
        if entry.is_dir {
            zip.add_directory(entry.name.trim_end_matches('/'), options)?;
            continue;
        }
        zip.start_file(entry.name.as_str(), options)?;
        let data = if i == document { xml } else { &entry.data };
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}
