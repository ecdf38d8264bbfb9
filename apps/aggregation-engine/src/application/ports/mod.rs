//! Port Interfaces
//!
//! Defines the interfaces (ports) for external data access following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `DataProvider`: keyed retrieval of raw market data payloads
//! - `DownloadProvider`: remote fetch of a payload by URL

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by data-access ports.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Underlying storage could not be read.
    #[error("storage error for key '{key}': {source}")]
    Storage {
        /// Key being fetched.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Remote endpoint returned a failure.
    #[error("download failed for '{url}': {reason}")]
    Download {
        /// URL being fetched.
        url: String,
        /// Human-readable failure description.
        reason: String,
    },
}

/// Keyed retrieval of raw market data payloads.
///
/// A missing key is not an error: implementations return `Ok(None)` so
/// callers can distinguish absence from infrastructure failure.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch the payload stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing store itself fails; an
    /// absent key yields `Ok(None)`.
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError>;

    /// Name of this provider, for logs.
    fn name(&self) -> &'static str;
}

/// Remote fetch of a payload by URL.
#[async_trait]
pub trait DownloadProvider: Send + Sync {
    /// Download the payload at `url`, sending the given request headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or responds with
    /// a failure status.
    async fn download_bytes(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Vec<u8>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Provider {}

        #[async_trait]
        impl DataProvider for Provider {
            async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError>;
            fn name(&self) -> &'static str;
        }
    }

    #[tokio::test]
    async fn absent_key_is_none_not_error() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch()
            .withf(|key| key == "missing/key")
            .returning(|_| Ok(None));

        let result = provider.fetch("missing/key").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn storage_failures_carry_the_key() {
        let mut provider = MockProvider::new();
        provider.expect_fetch().returning(|key| {
            Err(ProviderError::Storage {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        });

        let err = provider.fetch("equity/spy").await.unwrap_err();
        assert!(err.to_string().contains("equity/spy"));
    }
}
