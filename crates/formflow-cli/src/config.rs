//! # CLI Configuration
//!
//! Optional YAML or JSON file given with the global `--config` flag.
//! Every field has a default; command-line flags override file values.
//!
//! ```yaml
//! default_schema: schemas/default-schema.json
//! storage_dir: .formflow/state
//! submission_dir: submissions
//! session:
//!   storage_key: kyc-form-data
//!   multi_step: true
//!   page_size: 3
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use formflow_schema::{DocumentFormat, DEFAULT_SCHEMA_PATH};
use formflow_state::SessionConfig;
use serde::Deserialize;

/// Settings read from the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Schema used when a command is given no schema path.
    pub default_schema: PathBuf,
    /// Directory of the snapshot store. In-memory when unset.
    pub storage_dir: Option<PathBuf>,
    /// Directory submission logs are written to.
    pub submission_dir: PathBuf,
    /// Session settings.
    pub session: SessionConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_schema: PathBuf::from(DEFAULT_SCHEMA_PATH),
            storage_dir: None,
            submission_dir: PathBuf::from("submissions"),
            session: SessionConfig::default(),
        }
    }
}

impl CliConfig {
    /// Read a configuration file. YAML by `.yaml`/`.yml` extension,
    /// JSON otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = match DocumentFormat::from_path(path) {
            DocumentFormat::Yaml => serde_yaml::from_str(&text)
                .with_context(|| format!("invalid YAML config {}", path.display()))?,
            DocumentFormat::Json => serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON config {}", path.display()))?,
        };
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The file at `path`, or the defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
