//! The project update run: load, add each valid source, save.

use crate::config::UpdateRequest;
use crate::error::Result;
use crate::host::{GisHost, HostSession};
use std::fmt;
use tracing::{error, info, warn};

/// What happened to one candidate source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerOutcome {
    /// 1-based position in the candidate list.
    pub index: usize,
    pub uri: String,
    pub name: String,
    pub added: bool,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<LayerOutcome>,
    pub saved: bool,
}

impl RunReport {
    pub fn added(&self) -> usize {
        self.outcomes.iter().filter(|o| o.added).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.added()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} layer(s) added, {} skipped",
            self.added(),
            self.outcomes.len(),
            self.skipped()
        )
    }
}

/// Apply `request` to its project through the session's host.
///
/// Every external call is made once. A load failure stops the run before any
/// layer is touched; invalid sources are skipped; the document is saved even
/// when nothing was added. The session is left for the caller to drop.
pub fn run<H: GisHost>(session: &mut HostSession<H>, request: &UpdateRequest) -> Result<RunReport> {
    let host: &mut H = session;
    let path = request.project.as_path();

    info!("Loading project: {}", path.display());
    let mut document = match host.open_project(path) {
        Ok(document) => document,
        Err(e) => {
            error!("Failed to load project: {} ({})", path.display(), e.reason());
            return Err(e);
        }
    };
    info!("Project loaded successfully.");

    let mut report = RunReport::default();
    for (i, uri) in request.sources.iter().enumerate() {
        let index = i + 1;
        let name = request.naming.display_name(index, uri);
        info!("Attempting to load raster {index}: {uri}");

        let source = host.open_raster_source(uri, &name);
        let outcome = if source.is_valid() {
            host.add_layer(&mut document, source);
            info!("Successfully loaded raster {index}: {uri}");
            LayerOutcome {
                index,
                uri: uri.clone(),
                name,
                added: true,
                reason: None,
            }
        } else {
            let reason = source.reason().unwrap_or("invalid source").to_string();
            warn!("Failed to load raster {index}: {uri} ({reason})");
            LayerOutcome {
                index,
                uri: uri.clone(),
                name,
                added: false,
                reason: Some(reason),
            }
        };
        report.outcomes.push(outcome);
    }
    info!("{report}");

    if request.dry_run {
        info!("Dry run: skipping save of {}", path.display());
        return Ok(report);
    }

    info!("Saving project: {}", path.display());
    if let Err(e) = host.save_project(&document, path) {
        error!("Failed to save project: {} ({})", path.display(), e.reason());
        return Err(e);
    }
    info!("Project saved successfully.");
    report.saved = true;

    Ok(report)
}
