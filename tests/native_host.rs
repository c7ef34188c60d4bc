mod common;

use cogproject::project::ProjectDocument;
use cogproject::{run, GisHost, HostConfig, HostSession, NativeHost, UpdateError, UpdateRequest};
use common::{capture_logs, count_prefixed, tiny_tiff, PROJECT};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn missing(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }
}

fn update(project: &Path, sources: Vec<String>) -> (cogproject::Result<cogproject::RunReport>, Vec<String>) {
    let request = UpdateRequest::new(project, sources);
    capture_logs(|| {
        let host = NativeHost::init(HostConfig::default()).unwrap();
        let mut session = HostSession::new(host);
        run(&mut session, &request)
    })
}

#[test]
fn local_tiff_is_added_and_junk_skipped() {
    let ws = Workspace::new();
    let project = ws.file("lamprey.qgs", PROJECT.as_bytes());
    let raster = ws.file("ortho.tif", &tiny_tiff(2048, 1024));
    let junk = ws.file("notes.txt", b"not a raster");

    let sources = vec![
        raster.display().to_string(),
        junk.display().to_string(),
        ws.missing("gone.tif"),
    ];
    let (result, logs) = update(&project, sources);

    let report = result.unwrap();
    assert_eq!(report.added(), 1);
    assert_eq!(report.outcomes[1].reason.as_deref(), Some("not a TIFF raster"));
    assert!(report.outcomes[2]
        .reason
        .as_deref()
        .unwrap()
        .starts_with("source not found"));
    assert_eq!(count_prefixed(&logs, "Failed to load raster"), 2);

    let layers = ProjectDocument::read(&project).unwrap().layers();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].name, "COG Raster Layer 1");
    assert_eq!(layers[0].source, raster.display().to_string());
    assert_eq!(layers[0].provider, "gdal");
    assert!(layers[0].id.starts_with("COG_Raster_Layer_1_"));
}

#[test]
fn file_urls_are_opened_locally() {
    let ws = Workspace::new();
    let raster = ws.file("dem.tif", &tiny_tiff(64, 64));
    let mut host = NativeHost::init(HostConfig::default()).unwrap();
    let uri = format!("file://{}", raster.display());
    let source = host.open_raster_source(&uri, "dem");
    assert!(source.is_valid());
    assert_eq!(source.info().unwrap().width, 64);
    host.shutdown();
    assert!(host.is_shut_down());
}

#[test]
fn rerunning_duplicates_layers() {
    let ws = Workspace::new();
    let project = ws.file("lamprey.qgs", PROJECT.as_bytes());
    let raster = ws.file("ortho.tif", &tiny_tiff(256, 256));
    let sources = vec![raster.display().to_string()];

    update(&project, sources.clone()).0.unwrap();
    update(&project, sources).0.unwrap();

    let layers = ProjectDocument::read(&project).unwrap().layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].source, layers[1].source);
    assert_ne!(layers[0].id, layers[1].id);
}

#[test]
fn all_invalid_leaves_document_intact() {
    let ws = Workspace::new();
    let project = ws.file("lamprey.qgs", PROJECT.as_bytes());
    let (result, logs) = update(&project, vec![ws.missing("a.tif"), ws.missing("b.tif")]);

    let report = result.unwrap();
    assert!(report.saved);
    assert_eq!(report.added(), 0);
    assert_eq!(count_prefixed(&logs, "Saving project"), 1);
    assert_eq!(fs::read_to_string(&project).unwrap(), PROJECT);
}

#[test]
fn nonexistent_project_is_a_load_failure() {
    let ws = Workspace::new();
    let project = PathBuf::from(ws.missing("nowhere.qgs"));
    let raster = ws.file("ortho.tif", &tiny_tiff(256, 256));

    let (result, logs) = update(&project, vec![raster.display().to_string()]);

    assert!(matches!(result, Err(UpdateError::Load { .. })));
    assert_eq!(count_prefixed(&logs, "Failed to load project"), 1);
    assert_eq!(count_prefixed(&logs, "Attempting to load raster"), 0);
    assert_eq!(count_prefixed(&logs, "Saving project"), 0);
    assert_eq!(logs.last().map(String::as_str), Some("Exiting host application."));
    assert!(!project.exists());
}

#[test]
fn malformed_project_is_a_load_failure() {
    let ws = Workspace::new();
    let project = ws.file("broken.qgs", b"<qgis><projectlayers></qgis>");
    let (result, _) = update(&project, vec![]);
    assert!(matches!(result, Err(UpdateError::Load { .. })));
    assert_eq!(fs::read(&project).unwrap(), b"<qgis><projectlayers></qgis>");
}

#[test]
fn unwritable_project_is_a_save_failure() {
    let ws = Workspace::new();
    let project = ws.file("lamprey.qgs", PROJECT.as_bytes());
    let raster = ws.file("ortho.tif", &tiny_tiff(256, 256));
    fs::create_dir(ws.dir.path().join("lamprey.qgs.tmp")).unwrap();

    let (result, logs) = update(&project, vec![raster.display().to_string()]);

    let err = result.unwrap_err();
    assert!(matches!(err, UpdateError::Save { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(count_prefixed(&logs, "Successfully loaded raster"), 1);
    assert_eq!(count_prefixed(&logs, "Failed to save project"), 1);
    assert_eq!(count_prefixed(&logs, "Project saved successfully."), 0);
    assert_eq!(logs.last().map(String::as_str), Some("Exiting host application."));
    assert_eq!(fs::read_to_string(&project).unwrap(), PROJECT);
}

#[test]
fn large_local_tiff_with_trailing_ifd() {
    // Image data first, IFD last, as libtiff writes stripped files
    let mut bytes = b"II*\0".to_vec();
    let ifd_offset: u32 = 3 * 1024 * 1024;
    bytes.extend_from_slice(&ifd_offset.to_le_bytes());
    bytes.resize(ifd_offset as usize, 0x7f);
    let tail = tiny_tiff(4000, 3000);
    let ifd_in_tail = u32::from_le_bytes(tail[4..8].try_into().unwrap()) as usize;
    bytes.extend_from_slice(&tail[ifd_in_tail..]);

    let ws = Workspace::new();
    let raster = ws.file("scan.tif", &bytes);
    let mut host = NativeHost::init(HostConfig::default()).unwrap();
    let source = host.open_raster_source(&raster.display().to_string(), "scan");
    assert!(source.is_valid(), "{:?}", source.reason());
    assert_eq!(source.info().unwrap().height, 3000);
}
