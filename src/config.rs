//! Run configuration, read from a JSON file and overridden on the command line.

use crate::error::{Result, UpdateError};
use crate::probe::{DEFAULT_FETCH_BLOCK, DEFAULT_MAX_FETCHES};
use crate::project::DEFAULT_PROVIDER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PREFIX: &str = "COG Raster Layer";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// How display names are derived for new layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LayerNaming {
    /// `"{prefix} {i}"`, `i` counting candidates from 1.
    Sequential {
        #[serde(default = "default_prefix")]
        prefix: String,
    },
    /// Final path segment of the source, cut at its first dot.
    Basename,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for LayerNaming {
    fn default() -> Self {
        LayerNaming::Sequential {
            prefix: default_prefix(),
        }
    }
}

impl LayerNaming {
    /// Display name for the candidate at 1-based `index`.
    pub fn display_name(&self, index: usize, uri: &str) -> String {
        match self {
            LayerNaming::Sequential { prefix } => format!("{prefix} {index}"),
            LayerNaming::Basename => basename(uri).unwrap_or(uri).to_string(),
        }
    }
}

fn basename(uri: &str) -> Option<&str> {
    let without_query = uri.split(['?', '#']).next()?;
    let segment = without_query
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()?;
    let stem = segment.split('.').next()?;
    (!stem.is_empty()).then_some(stem)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub http_timeout_ms: u64,
    pub fetch_block: usize,
    pub max_fetches: usize,
    pub provider: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            fetch_block: DEFAULT_FETCH_BLOCK,
            max_fetches: DEFAULT_MAX_FETCHES,
            provider: DEFAULT_PROVIDER.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub project: Option<PathBuf>,
    pub sources: Vec<String>,
    pub naming: LayerNaming,
    pub dry_run: bool,
    pub host: HostConfig,
}

impl UpdateConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| UpdateError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| UpdateError::Config(format!("{}: {e}", path.display())))
    }

    /// Split into what the updater needs and what the host needs.
    pub fn into_parts(self) -> Result<(UpdateRequest, HostConfig)> {
        let project = self
            .project
            .ok_or_else(|| UpdateError::Config("no project path given".to_string()))?;
        let request = UpdateRequest {
            project,
            sources: self.sources,
            naming: self.naming,
            dry_run: self.dry_run,
        };
        Ok((request, self.host))
    }
}

/// One updater run: which project, which candidates, how to name them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRequest {
    pub project: PathBuf,
    pub sources: Vec<String>,
    pub naming: LayerNaming,
    pub dry_run: bool,
}

impl UpdateRequest {
    pub fn new<P: Into<PathBuf>>(project: P, sources: Vec<String>) -> Self {
        Self {
            project: project.into(),
            sources,
            naming: LayerNaming::default(),
            dry_run: false,
        }
    }

    pub fn with_naming(mut self, naming: LayerNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
