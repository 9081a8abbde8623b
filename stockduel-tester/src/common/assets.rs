use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use stockduel_game::{CompanyData, DataLoader};
use thiserror::Error;

/// Failures reading tester inputs from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("bundled data is malformed: {0}")]
    Bundled(#[from] serde_json::Error),
}

/// Loader reading the company pool and quiz config from JSON files,
/// falling back to the bundled dataset and default config.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    dataset: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl FileLoader {
    #[must_use]
    pub const fn new(dataset: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        Self { dataset, config }
    }

    fn read(path: &Path) -> Result<String, AssetError> {
        std::fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl DataLoader for FileLoader {
    type Error = AssetError;

    fn load_company_data(&self) -> Result<CompanyData, Self::Error> {
        let Some(path) = &self.dataset else {
            return Ok(CompanyData::bundled()?);
        };
        let raw = Self::read(path)?;
        CompanyData::from_json(&raw).map_err(|source| AssetError::Parse {
            path: path.clone(),
            source,
        })
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let Some(path) = &self.config else {
            log::debug!("no {config_name} config given, using defaults");
            return Ok(serde_json::from_str("{}")?);
        };
        let raw = Self::read(path)?;
        serde_json::from_str(&raw).map_err(|source| AssetError::Parse {
            path: path.clone(),
            source,
        })
    }
}
