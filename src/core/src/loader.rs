//! Spec loading from local files or remote URLs.

use async_trait::async_trait;

use crate::error::{BuildError, Result};

/// Fetches the raw bytes of a spec.
#[async_trait]
pub trait SpecLoader: Send + Sync {
    async fn load(&self, location: &str) -> Result<Vec<u8>>;
}

/// Loads `http`-prefixed locations over HTTP and everything else from disk.
#[derive(Debug, Clone, Default)]
pub struct HttpSpecLoader {
    client: reqwest::Client,
}

impl HttpSpecLoader {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let load_error = |message: String| BuildError::SpecLoad {
            location: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| load_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(load_error(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| load_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpecLoader for HttpSpecLoader {
    async fn load(&self, location: &str) -> Result<Vec<u8>> {
        if is_remote(location) {
            tracing::debug!(url = %location, "Fetching remote spec");
            self.fetch(location).await
        } else {
            tracing::debug!(path = %location, "Reading local spec");
            tokio::fs::read(location)
                .await
                .map_err(|e| BuildError::SpecLoad {
                    location: location.to_string(),
                    message: e.to_string(),
                })
        }
    }
}

/// Whether a spec location should be fetched over HTTP.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://example.com/spec.yaml"));
        assert!(is_remote("https://example.com/spec.yaml"));
        assert!(!is_remote("./spec.yaml"));
        assert!(!is_remote("/srv/http/spec.yaml"));
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.yaml");
        std::fs::write(&path, "stages: []\n").unwrap();

        let data = HttpSpecLoader::new()
            .load(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(data, b"stages: []\n");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yaml");

        let result = HttpSpecLoader::new().load(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(BuildError::SpecLoad { .. })));
    }

    #[tokio::test]
    async fn test_load_unreachable_url() {
        let result = HttpSpecLoader::new()
            .load("http://127.0.0.1:1/spec.yaml")
            .await;
        match result {
            Err(BuildError::SpecLoad { location, .. }) => {
                assert_eq!(location, "http://127.0.0.1:1/spec.yaml");
            }
            other => panic!("expected SpecLoad error, got {other:?}"),
        }
    }
}
