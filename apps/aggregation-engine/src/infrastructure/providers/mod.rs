//! Data Provider Adapters
//!
//! Filesystem-backed implementation of the [`DataProvider`] port.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{DataProvider, ProviderError};

/// Reads payloads from files under a base directory.
///
/// Keys are relative paths; a missing file resolves to `Ok(None)`
/// rather than an error so callers can distinguish absent data from a
/// broken store.
#[derive(Debug, Clone)]
pub struct LocalFileDataProvider {
    base_dir: PathBuf,
}

impl LocalFileDataProvider {
    /// Provider rooted at `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The directory keys are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl DataProvider for LocalFileDataProvider {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        let path = self.base_dir.join(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "no local data file");
                Ok(None)
            }
            Err(source) => Err(ProviderError::Storage {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "LocalFile"
    }
}
