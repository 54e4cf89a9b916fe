//! Preset catalog loading (JSON or TOML) with built-in fallback.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::PresetCatalog;

/// Conventional location of the preset document, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/service_lines.toml";

/// Preset loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Config defines no service lines")]
    Empty,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Document format of a preset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse a catalog document.
pub fn parse_catalog(content: &str, format: ConfigFormat) -> ConfigResult<PresetCatalog> {
    let catalog: PresetCatalog = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };

    if catalog.is_empty() {
        return Err(ConfigError::Empty);
    }
    Ok(catalog)
}

/// Read and parse a catalog file.
pub fn load_catalog(path: &Path) -> ConfigResult<PresetCatalog> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let catalog = parse_catalog(&content, format)?;

    info!(
        path = %path.display(),
        service_lines = catalog.len(),
        "loaded preset catalog"
    );
    Ok(catalog)
}

/// Load a catalog, falling back to the built-in preset on any failure.
pub fn load_or_builtin(path: Option<&Path>) -> PresetCatalog {
    let Some(path) = path else {
        return PresetCatalog::builtin();
    };

    if !path.exists() {
        warn!(path = %path.display(), "preset file not found, using built-in preset");
        return PresetCatalog::builtin();
    }

    match load_catalog(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load presets, using built-in preset");
            PresetCatalog::builtin()
        }
    }
}

/// Process-lifetime cache of a preset catalog.
///
/// The file is read on first access; later calls return the cached catalog
/// until [`PresetStore::invalidate`] is called.
#[derive(Debug, Default)]
pub struct PresetStore {
    path: Option<PathBuf>,
    catalog: OnceLock<PresetCatalog>,
}

impl PresetStore {
    /// Store backed by a file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            catalog: OnceLock::new(),
        }
    }

    /// Store that only serves the built-in preset.
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The cached catalog, loading it on first use.
    pub fn get(&self) -> &PresetCatalog {
        self.catalog
            .get_or_init(|| load_or_builtin(self.path.as_deref()))
    }

    /// Whether the catalog has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// Drop the cached catalog so the next access reloads it.
    pub fn invalidate(&mut self) {
        self.catalog.take();
    }
}
