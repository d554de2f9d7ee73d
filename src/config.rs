//! TOML configuration mapping each collection to a file.
//!
//! ```toml
//! data_dir = "src/main/resources/data"
//!
//! [collections]
//! faults = "faults-2026.json"
//! ```
//!
//! Relative collection paths resolve against `data_dir`; a relative `data_dir`
//! resolves against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DatasetError, Result};
use crate::io::CollectionPaths;
use crate::types::CollectionKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub collections: CollectionFiles,
}

/// Per-collection overrides. Unset entries fall back to the standard file names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionFiles {
    pub models: Option<PathBuf>,
    pub market: Option<PathBuf>,
    pub reliability: Option<PathBuf>,
    pub faults: Option<PathBuf>,
}

impl CollectionFiles {
    fn get(&self, collection: CollectionKind) -> Option<&Path> {
        match collection {
            CollectionKind::Models => self.models.as_deref(),
            CollectionKind::Market => self.market.as_deref(),
            CollectionKind::Reliability => self.reliability.as_deref(),
            CollectionKind::Faults => self.faults.as_deref(),
        }
    }
}

impl DatasetConfig {
    /// Reads and parses a config file, resolving `data_dir` against its parent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs_err::read_to_string(path).map_err(|err| DatasetError::Config {
            reason: err.to_string(),
        })?;
        let mut config = Self::from_toml(&text).map_err(|err| match err {
            DatasetError::Config { reason } => DatasetError::Config {
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.data_dir = Some(match config.data_dir.take() {
            Some(dir) if dir.is_relative() => base.join(dir),
            Some(dir) => dir,
            None => base.to_path_buf(),
        });
        tracing::debug!(path = %path.display(), data_dir = ?config.data_dir, "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| DatasetError::Config {
            reason: err.message().to_owned(),
        })
    }

    /// Config that reads the standard file names from `dir`.
    pub fn for_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            collections: CollectionFiles::default(),
        }
    }

    #[must_use]
    pub fn resolve(&self) -> CollectionPaths {
        let base = self.data_dir.as_deref().unwrap_or_else(|| Path::new(""));
        let resolve = |collection: CollectionKind| match self.collections.get(collection) {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => base.join(path),
            None => base.join(collection.default_file_name()),
        };
        CollectionPaths {
            models: resolve(CollectionKind::Models),
            market: resolve(CollectionKind::Market),
            reliability: resolve(CollectionKind::Reliability),
            faults: resolve(CollectionKind::Faults),
        }
    }
}
