use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Default build service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5001";

/// Connection settings for the build service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Build service endpoint (e.g., "http://eru-core:5001")
    pub endpoint: String,

    /// Username sent as request metadata
    pub username: Option<String>,

    /// Password sent as request metadata
    pub password: Option<String>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            username: None,
            password: None,
            connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Check the settings and normalise the endpoint.
    ///
    /// A bare `host:port` endpoint gets an `http://` scheme.
    pub fn validate(mut self) -> Result<Self> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(BuildError::Config("endpoint is empty".to_string()));
        }
        self.endpoint = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}")
        };

        if self.connect_timeout_secs == 0 {
            return Err(BuildError::Config(
                "connect timeout must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Username and password, when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
