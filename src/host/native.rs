use super::{GisHost, RasterSource};
use crate::config::HostConfig;
use crate::error::{Result, UpdateError};
use crate::probe::{ProbeError, Prober, RasterInfo, SourceLocation};
use crate::project::{MapLayer, ProjectDocument};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use tracing::debug;

#[cfg(feature = "http")]
use {
    crate::io::http::HttpReader,
    std::time::Duration,
    tokio::runtime::{Builder, Runtime},
};

/// Host backed by this crate: QGIS project files and TIFF header probing.
pub struct NativeHost {
    config: HostConfig,
    prober: Prober,
    #[cfg(feature = "http")]
    remote: Option<Remote>,
    shut_down: bool,
}

#[cfg(feature = "http")]
struct Remote {
    runtime: Runtime,
    client: reqwest::Client,
}

impl NativeHost {
    pub fn init(config: HostConfig) -> Result<Self> {
        let prober = Prober::new(config.fetch_block, config.max_fetches);

        #[cfg(feature = "http")]
        let remote = {
            let runtime = Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("cogproject-http")
                .enable_all()
                .build()
                .map_err(|e| UpdateError::Host(format!("async runtime: {e}")))?;
            let client = reqwest::Client::builder()
                .timeout(Duration::from_millis(config.http_timeout_ms))
                .build()
                .map_err(|e| UpdateError::Host(format!("HTTP client: {e}")))?;
            Some(Remote { runtime, client })
        };

        debug!("native host ready: {config:?}");
        Ok(Self {
            config,
            prober,
            #[cfg(feature = "http")]
            remote,
            shut_down: false,
        })
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Probe a source without attaching it to anything.
    pub fn probe(&self, uri: &str) -> std::result::Result<RasterInfo, ProbeError> {
        if self.shut_down {
            return Err(ProbeError::Unsupported("host is shut down".to_string()));
        }
        match SourceLocation::parse(uri) {
            SourceLocation::Local(path) => {
                let file = File::open(&path).map_err(|e| match e.kind() {
                    ErrorKind::NotFound => ProbeError::NotFound(path.display().to_string()),
                    _ => ProbeError::Io(e),
                })?;
                if file.metadata()?.is_dir() {
                    return Err(ProbeError::Unsupported(format!(
                        "{} is a directory",
                        path.display()
                    )));
                }
                self.prober.probe_stream(&mut BufReader::new(file))
            }
            SourceLocation::Remote(url) => self.probe_remote(&url),
        }
    }

    #[cfg(feature = "http")]
    fn probe_remote(&self, url: &str) -> std::result::Result<RasterInfo, ProbeError> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| ProbeError::Unsupported("host is shut down".to_string()))?;
        let reader = HttpReader::new(url, remote.client.clone(), remote.runtime.handle().clone())
            .map_err(|e| ProbeError::Unsupported(format!("bad URL: {e}")))?;
        self.prober.probe(&reader).map_err(|e| match e {
            ProbeError::Io(io) if io.kind() == ErrorKind::NotFound => {
                ProbeError::NotFound(url.to_string())
            }
            other => other,
        })
    }

    #[cfg(not(feature = "http"))]
    fn probe_remote(&self, _url: &str) -> std::result::Result<RasterInfo, ProbeError> {
        Err(ProbeError::Unsupported(
            "http support not compiled in".to_string(),
        ))
    }
}

impl GisHost for NativeHost {
    type Document = ProjectDocument;

    fn open_project(&mut self, path: &Path) -> Result<ProjectDocument> {
        ProjectDocument::read(path).map_err(|e| UpdateError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn open_raster_source(&mut self, uri: &str, name: &str) -> RasterSource {
        match self.probe(uri) {
            Ok(info) => {
                debug!("{uri}: {info}");
                RasterSource::valid(uri, name, info)
            }
            Err(e) => RasterSource::invalid(uri, name, e.to_string()),
        }
    }

    fn add_layer(&mut self, document: &mut ProjectDocument, source: RasterSource) {
        document.add_layer(MapLayer::new(&source.name, &source.uri, &self.config.provider));
    }

    fn save_project(&mut self, document: &ProjectDocument, path: &Path) -> Result<()> {
        document.write(path).map_err(|e| UpdateError::Save {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn shutdown(&mut self) {
        #[cfg(feature = "http")]
        if let Some(remote) = self.remote.take() {
            remote.runtime.shutdown_background();
        }
        self.shut_down = true;
    }
}

impl Drop for NativeHost {
    fn drop(&mut self) {
        if !self.shut_down {
            self.shutdown();
        }
    }
}
