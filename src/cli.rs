use crate::config::{LayerNaming, UpdateConfig, DEFAULT_PREFIX};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NamingMode {
    Sequential,
    Basename,
}

#[derive(Parser, Debug)]
#[command(
    name = "cogproject",
    version,
    about = "Attach Cloud Optimized GeoTIFF layers to a QGIS project"
)]
pub struct Cli {
    /// QGIS project file (.qgs or .qgz) to update in place
    pub project: Option<PathBuf>,

    /// Raster sources to add: URLs, /vsicurl/ paths or local files
    pub sources: Vec<String>,

    /// JSON config file; command-line values take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How new layers are named
    #[arg(long, value_enum)]
    pub naming: Option<NamingMode>,

    /// Prefix for sequential layer names
    #[arg(long)]
    pub prefix: Option<String>,

    /// HTTP request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Open and probe everything but leave the project file untouched
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<UpdateConfig> {
        let mut config = match &self.config {
            Some(path) => UpdateConfig::from_file(path)?,
            None => UpdateConfig::default(),
        };

        if let Some(project) = self.project {
            config.project = Some(project);
        }
        if !self.sources.is_empty() {
            config.sources = self.sources;
        }

        let prefix = self.prefix.or_else(|| match &config.naming {
            LayerNaming::Sequential { prefix } => Some(prefix.clone()),
            LayerNaming::Basename => None,
        });
        config.naming = match (self.naming, &config.naming) {
            (Some(NamingMode::Basename), _) => LayerNaming::Basename,
            (Some(NamingMode::Sequential), _) | (None, LayerNaming::Sequential { .. }) => {
                LayerNaming::Sequential {
                    prefix: prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
                }
            }
            (None, LayerNaming::Basename) => LayerNaming::Basename,
        };

        if let Some(timeout_ms) = self.timeout_ms {
            config.host.http_timeout_ms = timeout_ms;
        }
        config.dry_run |= self.dry_run;
        Ok(config)
    }
}
